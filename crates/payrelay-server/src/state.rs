use std::sync::Arc;

use payrelay::{CallbackHandler, ConnectionRegistry, SignatureVerifier, StatusStore};

use crate::config::RelayConfig;

/// Shared application state, built once at startup.
pub struct AppState {
    pub callbacks: CallbackHandler,
    pub store: Arc<StatusStore>,
    pub registry: Arc<ConnectionRegistry>,
    /// Bearer token for /metrics (not the salt key).
    pub metrics_token: Option<Vec<u8>>,
    pub public_metrics: bool,
}

impl AppState {
    pub fn new(verifier: SignatureVerifier) -> Self {
        let store = Arc::new(StatusStore::new());
        let registry = Arc::new(ConnectionRegistry::new());
        Self {
            callbacks: CallbackHandler::new(verifier, Arc::clone(&store), Arc::clone(&registry)),
            store,
            registry,
            metrics_token: None,
            public_metrics: false,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        let verifier = SignatureVerifier::with_path(
            config.salt_key.as_bytes(),
            config.signature_path.as_str(),
        );
        Self {
            metrics_token: config.metrics_token.as_ref().map(|t| t.as_bytes().to_vec()),
            public_metrics: config.public_metrics,
            ..Self::new(verifier)
        }
    }
}
