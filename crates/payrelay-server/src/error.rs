use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use payrelay::CallbackError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Callback rejected by the relay pipeline
    #[error(transparent)]
    Callback(#[from] CallbackError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Callback(CallbackError::Unauthorized) => StatusCode::UNAUTHORIZED,
            ApiError::Callback(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Callback(e) => HttpResponse::build(self.status_code()).json(
                serde_json::json!({
                    "error": e.code(),
                    "message": e.to_string(),
                }),
            ),
        }
    }
}
