//! Payment-gateway callback relay.
//!
//! A payment provider posts a signed callback whenever a transaction changes
//! state. This crate verifies the callback, extracts the transaction outcome,
//! records the latest status and pushes it to whichever client channel is
//! watching that transaction.
//!
//! # Pipeline
//!
//! - [`signature`]: `x-verify` header check (`sha256(payload + path + salt)`)
//! - [`payload`]: transport extraction, base64/JSON decode, field strategies
//! - [`store`]: [`StatusStore`], last-write-wins status per transaction
//! - [`registry`]: [`ConnectionRegistry`], transaction → live client channel
//! - [`callback`]: [`CallbackHandler`] tying the above together
//!
//! The HTTP and WebSocket surface lives in the `payrelay-server` crate.

pub mod callback;
pub mod constants;
pub mod error;
pub mod payload;
pub mod registry;
pub mod signature;
pub mod store;

pub use callback::{CallbackHandler, CallbackOutcome};
pub use constants::*;
pub use error::CallbackError;
pub use payload::{NormalizedCallback, Transport};
pub use registry::{ChannelHandle, ChannelId, ConnectionRegistry, NotifyOutcome, StatusPush};
pub use signature::SignatureVerifier;
pub use store::StatusStore;
