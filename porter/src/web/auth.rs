//! Signature gate for protected webhook routes.
//!
//! [`require_signature`] runs as a route layer, so a request that fails
//! authentication is answered with 403 and the handler is never invoked.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use http_body_util::LengthLimitError;
use tracing::{debug, warn};

use crate::config::Secret;
use crate::web::handlers::{AppState, WebhookResponse};
use crate::web::request::{IncomingRequest, HEADER_SIGNATURE};
use crate::web::signature::verify;

/// Upper bound on buffered request bodies, matching axum's default limit.
pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Outcome of authenticating a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthVerdict {
    Authenticated,
    MissingSignature,
    InvalidSignature,
}

impl AuthVerdict {
    pub fn is_authenticated(self) -> bool {
        matches!(self, AuthVerdict::Authenticated)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AuthVerdict::Authenticated => "authenticated",
            AuthVerdict::MissingSignature => "missing_signature",
            AuthVerdict::InvalidSignature => "invalid_signature",
        }
    }
}

/// Authenticate a request against the shared secret.
///
/// An absent or empty signature is rejected before any hashing. A header that
/// is present but not readable as text counts as an invalid signature.
pub fn authenticate(request: &IncomingRequest<'_>, secret: &Secret) -> AuthVerdict {
    let signature = match request.signature() {
        Some(sig) if !sig.is_empty() => sig,
        Some(_) => return AuthVerdict::MissingSignature,
        None if request.has_header(HEADER_SIGNATURE) => return AuthVerdict::InvalidSignature,
        None => return AuthVerdict::MissingSignature,
    };

    if verify(secret.as_bytes(), request.body(), signature) {
        AuthVerdict::Authenticated
    } else {
        AuthVerdict::InvalidSignature
    }
}

/// Route middleware that admits only correctly signed requests.
///
/// The body is buffered only once a signature header is known to be present,
/// then handed to the inner handler unchanged. Bodies over [`MAX_BODY_BYTES`]
/// get 413; bodies that fail to arrive get 400.
pub async fn require_signature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    if !request.headers().contains_key(HEADER_SIGNATURE) {
        warn!(
            path = %path,
            verdict = AuthVerdict::MissingSignature.as_str(),
            "auth_rejected"
        );
        return forbidden();
    }

    let (parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            let cause = e.into_inner();
            if cause.downcast_ref::<LengthLimitError>().is_some() {
                warn!(path = %path, limit = MAX_BODY_BYTES, "auth_body_too_large");
                return (
                    StatusCode::PAYLOAD_TOO_LARGE,
                    Json(WebhookResponse {
                        status: "payload_too_large",
                    }),
                )
                    .into_response();
            }

            warn!(path = %path, error = %cause, "auth_body_unreadable");
            return (
                StatusCode::BAD_REQUEST,
                Json(WebhookResponse {
                    status: "bad_request",
                }),
            )
                .into_response();
        }
    };

    let verdict = authenticate(
        &IncomingRequest::new(&parts.headers, &bytes),
        &state.config.secret,
    );

    if !verdict.is_authenticated() {
        warn!(
            path = %path,
            verdict = verdict.as_str(),
            body_length = bytes.len(),
            "auth_rejected"
        );
        return forbidden();
    }

    debug!(path = %path, body_length = bytes.len(), "auth_accepted");

    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn forbidden() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(WebhookResponse {
            status: "forbidden",
        }),
    )
        .into_response()
}
