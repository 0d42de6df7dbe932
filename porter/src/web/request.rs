//! Typed view over an inbound webhook request.

use axum::http::HeaderMap;

/// Header carrying the hex HMAC-SHA256 of the request body.
pub const HEADER_SIGNATURE: &str = "X-Hub-Signature";

/// Header naming the source-control event that triggered the callback.
pub const HEADER_EVENT: &str = "X-GitHub-Event";

/// Borrowed, read-only view of an inbound request.
///
/// Header lookups are case-insensitive and return `None` for values that are
/// absent or not visible ASCII.
#[derive(Debug, Clone, Copy)]
pub struct IncomingRequest<'a> {
    headers: &'a HeaderMap,
    body: &'a [u8],
}

impl<'a> IncomingRequest<'a> {
    pub fn new(headers: &'a HeaderMap, body: &'a [u8]) -> Self {
        Self { headers, body }
    }

    /// Raw body bytes, exactly as received.
    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Whether a header is present at all, regardless of its encoding.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.contains_key(name)
    }

    pub fn signature(&self) -> Option<&'a str> {
        self.header(HEADER_SIGNATURE)
    }

    pub fn event(&self) -> Option<&'a str> {
        self.header(HEADER_EVENT)
    }
}
