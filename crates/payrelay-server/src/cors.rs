//! CORS configuration for the relay.

use actix_cors::Cors;
use actix_web::http::header;

/// Build the CORS middleware from allowed origins.
///
/// With no origins configured only `http://localhost[:port]` is allowed.
pub fn build_cors(allowed_origins: &[String]) -> Cors {
    let allowed = allowed_origins.to_vec();
    Cors::default()
        .allowed_origin_fn(move |origin, _req_head| {
            let origin_str = origin.to_str().unwrap_or("");
            if allowed.is_empty() {
                // Match http://localhost or http://localhost:PORT exactly
                return origin_str == "http://localhost"
                    || origin_str.starts_with("http://localhost:");
            }
            allowed.iter().any(|a| a == "*" || a == origin_str)
        })
        .allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            header::HeaderName::from_static(payrelay::SIGNATURE_HEADER),
        ])
        .max_age(3600)
}
