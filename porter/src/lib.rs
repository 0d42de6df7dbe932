//! Porter - authenticated webhook relay for mirror list updates.
//!
//! A push notification from source control arrives signed with a shared
//! secret. Once the signature checks out, the current mirror list is fetched
//! and forwarded to the mirrors site, and its answer is returned to the caller.
//!
//! ## Architecture
//!
//! ```text
//! Webhook → signature gate → event check → GET mirrors.json → POST relay target → response
//! ```

pub mod config;
pub mod relay;
pub mod web;

// Re-export commonly used types
pub use config::{AccessToken, Config, ConfigError, Secret};
pub use relay::{RelayEnvelope, RelayError, RelayPipeline, Relayed};
pub use web::{app_router, AppState};
