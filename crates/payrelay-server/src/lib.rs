//! payrelay server: HTTP and WebSocket surface for the callback relay.
//!
//! # Modules
//!
//! - [`routes`]: callback, status polling, health and metrics endpoints
//! - [`realtime`]: `/ws` channel that registers transactions and receives pushes
//! - [`state`]: Shared [`AppState`](state::AppState) injected into every handler
//! - [`config`]: Environment configuration; the salt key is mandatory
//! - [`metrics`]: Prometheus metrics for callbacks and pushes

pub mod config;
pub mod cors;
pub mod error;
pub mod metrics;
pub mod realtime;
pub mod routes;
pub mod state;

pub use config::{ConfigError, RelayConfig};
pub use error::ApiError;
pub use state::AppState;
