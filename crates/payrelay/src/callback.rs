use std::sync::Arc;

use crate::error::CallbackError;
use crate::payload::{self, NormalizedCallback, Transport};
use crate::registry::{ConnectionRegistry, NotifyOutcome};
use crate::signature::SignatureVerifier;
use crate::store::StatusStore;

/// Result of an accepted callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackOutcome {
    pub callback: NormalizedCallback,
    pub notify: NotifyOutcome,
}

/// Runs one provider callback through verify → normalize → store → notify.
///
/// Holds no per-callback state; redelivery of the same callback has the
/// same net effect.
pub struct CallbackHandler {
    verifier: SignatureVerifier,
    store: Arc<StatusStore>,
    registry: Arc<ConnectionRegistry>,
}

impl CallbackHandler {
    pub fn new(
        verifier: SignatureVerifier,
        store: Arc<StatusStore>,
        registry: Arc<ConnectionRegistry>,
    ) -> Self {
        Self {
            verifier,
            store,
            registry,
        }
    }

    pub fn store(&self) -> &Arc<StatusStore> {
        &self.store
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Process a raw callback request.
    ///
    /// Nothing is written and nobody is notified unless the signature
    /// verifies and the payload normalizes.
    pub fn handle(
        &self,
        content_type: Option<&str>,
        body: &[u8],
        signature: Option<&str>,
    ) -> Result<CallbackOutcome, CallbackError> {
        let transport = Transport::from_content_type(content_type)?;
        let response = payload::extract_response(transport, body)?;

        let signature = signature
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| {
                CallbackError::MalformedRequest("missing x-verify header".to_string())
            })?;

        if !self.verifier.verify(&response, Some(signature)) {
            return Err(CallbackError::Unauthorized);
        }

        let callback = payload::normalize(&response)?;

        self.store.set(&callback.transaction_id, &callback.status);
        let notify = self
            .registry
            .notify(&callback.transaction_id, &callback.status);

        tracing::info!(
            transaction_id = %callback.transaction_id,
            status = %callback.status,
            transport = transport.as_str(),
            push = notify.as_str(),
            "payment callback accepted"
        );

        Ok(CallbackOutcome { callback, notify })
    }
}
