//! HTTP routing for the relay service.

use axum::{
    http::{header::SERVER, HeaderValue},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::web::auth::require_signature;
use crate::web::handlers::{health, mirrors_webhook, notices_webhook, AppState};

/// Value of the `Server` header attached to every response.
pub const SERVER_NAME: &str = concat!("porter/", env!("CARGO_PKG_VERSION"));

/// Build the application router.
///
/// The webhook routes are wrapped in the signature gate; `/health` is open.
pub fn app_router(state: AppState) -> Router {
    let webhooks = Router::new()
        .route("/api/p/mirrors", post(mirrors_webhook))
        .route("/api/p/notices", post(notices_webhook))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_signature,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(webhooks)
        .layer(SetResponseHeaderLayer::overriding(
            SERVER,
            HeaderValue::from_static(SERVER_NAME),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
