//! Relay pipeline error types.

use thiserror::Error;

/// Pipeline stage in which a relay failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayStage {
    Fetch,
    Forward,
}

impl RelayStage {
    pub fn as_str(self) -> &'static str {
        match self {
            RelayStage::Fetch => "fetch",
            RelayStage::Forward => "forward",
        }
    }
}

/// Broad reason a relay stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayCause {
    /// Connection error, timeout, non-2xx status or unreadable body
    Transport,
    /// Response body was not valid JSON
    Decode,
}

impl RelayCause {
    pub fn as_str(self) -> &'static str {
        match self {
            RelayCause::Transport => "transport",
            RelayCause::Decode => "decode",
        }
    }
}

/// Terminal failure of one relay attempt. No stage is retried.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to fetch mirror list: {0}")]
    FetchTransport(#[source] reqwest::Error),

    #[error("mirror list is not valid JSON: {0}")]
    FetchDecode(#[source] serde_json::Error),

    #[error("failed to forward mirror list: {0}")]
    ForwardTransport(#[source] reqwest::Error),
}

impl RelayError {
    pub fn stage(&self) -> RelayStage {
        match self {
            RelayError::FetchTransport(_) | RelayError::FetchDecode(_) => RelayStage::Fetch,
            RelayError::ForwardTransport(_) => RelayStage::Forward,
        }
    }

    pub fn cause(&self) -> RelayCause {
        match self {
            RelayError::FetchTransport(_) | RelayError::ForwardTransport(_) => RelayCause::Transport,
            RelayError::FetchDecode(_) => RelayCause::Decode,
        }
    }
}
