//! Web server module for handling inbound webhooks.
//!
//! This module provides the HTTP surface of the relay:
//! - Verifies the `X-Hub-Signature` HMAC before any handler runs
//! - Relays the mirror list on `push` events
//! - Accepts (and currently ignores) authenticated notices

pub mod auth;
pub mod handlers;
pub mod request;
pub mod router;
pub mod signature;

pub use auth::{authenticate, require_signature, AuthVerdict};
pub use handlers::{
    health, mirrors_webhook, notices_webhook, AppState, HealthResponse, RelayErrorResponse,
    WebhookResponse,
};
pub use request::{IncomingRequest, HEADER_EVENT, HEADER_SIGNATURE};
pub use router::app_router;
pub use signature::{sign, verify};
