use thiserror::Error;

/// Reasons a payment callback is rejected.
///
/// Every variant is terminal for the request; the provider owns retries.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CallbackError {
    /// Response payload or signature header missing.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// Signature header does not match the recomputed digest.
    #[error("signature verification failed")]
    Unauthorized,

    /// Response blob could not be decoded or lacks a transaction id/status.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Content type is not one the provider uses for callbacks.
    #[error("unsupported transport: {0}")]
    UnsupportedTransport(String),
}

impl CallbackError {
    /// Short machine-readable code used in logs, metrics and error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            CallbackError::MalformedRequest(_) => "malformed_request",
            CallbackError::Unauthorized => "unauthorized",
            CallbackError::MalformedPayload(_) => "malformed_payload",
            CallbackError::UnsupportedTransport(_) => "unsupported_transport",
        }
    }
}
