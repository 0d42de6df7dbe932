//! Webhook endpoint handlers.
//!
//! Both webhook routes sit behind [`require_signature`](crate::web::auth::require_signature),
//! so by the time a handler here runs the request is already authenticated.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, info};

use crate::relay::{RelayError, RelayPipeline};
use crate::web::request::IncomingRequest;
use crate::Config;

/// Event type that triggers a mirror list relay.
pub const PUSH_EVENT: &str = "push";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub pipeline: RelayPipeline,
}

impl AppState {
    pub fn new(config: Config, pipeline: RelayPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline,
        }
    }
}

// =============================================================================
// Health Check
// =============================================================================

/// Health check response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

// =============================================================================
// Mirrors Webhook
// =============================================================================

/// Short JSON status body used for rejections.
#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

/// Relay failure body. The failure details are only filled in debug mode.
#[derive(Serialize)]
pub struct RelayErrorResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl RelayErrorResponse {
    fn from_error(err: &RelayError, debug: bool) -> Self {
        if debug {
            Self {
                status: "error",
                stage: Some(err.stage().as_str()),
                cause: Some(err.cause().as_str()),
                detail: Some(err.to_string()),
            }
        } else {
            Self {
                status: "error",
                stage: None,
                cause: None,
                detail: None,
            }
        }
    }
}

/// Mirrors webhook endpoint.
///
/// This endpoint:
/// 1. Answers non-push events with a diagnostic message and stops
/// 2. Fetches the mirror list and forwards it to the relay target
/// 3. Returns the relay target's body verbatim
///
/// A request without `X-GitHub-Event` is treated as an empty event name, so
/// the diagnostic reads `` `push` expected but got `` ``.
pub async fn mirrors_webhook(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let request = IncomingRequest::new(&headers, &[]);
    let event = request.event().unwrap_or_default();

    info!(event = %event, "mirrors_webhook_received");

    if event != PUSH_EVENT {
        info!(event = %event, "mirrors_webhook_event_ignored");
        return (
            StatusCode::OK,
            format!("`{}` expected but got `{}`", PUSH_EVENT, event),
        )
            .into_response();
    }

    match state.pipeline.relay().await {
        Ok(relayed) => {
            info!(
                upstream_status = relayed.status.as_u16(),
                body_length = relayed.body.len(),
                "mirrors_relay_complete"
            );

            let mut response = (StatusCode::OK, relayed.body).into_response();
            if let Some(content_type) = relayed.content_type {
                response.headers_mut().insert(CONTENT_TYPE, content_type);
            }
            response
        }
        Err(e) => {
            error!(
                stage = e.stage().as_str(),
                cause = e.cause().as_str(),
                error = %e,
                "mirrors_relay_failed"
            );

            (
                StatusCode::BAD_GATEWAY,
                Json(RelayErrorResponse::from_error(&e, state.config.debug)),
            )
                .into_response()
        }
    }
}

// =============================================================================
// Notices Webhook
// =============================================================================

/// Notices webhook endpoint.
///
/// Accepts authenticated notices and does nothing with them yet.
pub async fn notices_webhook() -> StatusCode {
    info!("notices_webhook_received");
    StatusCode::OK
}
