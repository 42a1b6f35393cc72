use crate::window::Window;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All errors generated in `xyz-volume`.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum TrackerError {
    #[error("{0}")]
    Account(#[from] AccountError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("fetch aborted at window {window}: {source}")]
    WindowFailed {
        window: Window,
        #[source]
        source: FetchError,
    },

    #[error("market volume lookup failed: {0}")]
    MarketVolumes(FetchError),
}

/// Malformed account identifier, raised before any network call is made.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum AccountError {
    #[error(
        "\
        invalid account address {input:?}: expected 42 characters starting with \"0x\" \
        followed by 40 hexadecimal digits\
    "
    )]
    InvalidFormat { input: String },
}

/// Failure of a single upstream query.
///
/// Reported per window, never fatal for the whole run on its own; the
/// [`FailurePolicy`](crate::tracker::FailurePolicy) decides what happens next.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize, Serialize, Error)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("upstream responded with non-success status {0}")]
    Status(u16),

    #[error("request failed: {0}")]
    Request(String),

    #[error("malformed response body: {0}")]
    Decode(String),
}

impl FetchError {
    /// Determine if a second attempt at the same query could plausibly succeed.
    #[allow(clippy::match_like_matches_macro)]
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Request(_) => true,
            // Rate limited or upstream hiccup
            FetchError::Status(status) => *status == 429 || *status >= 500,
            FetchError::Decode(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else if let Some(status) = error.status() {
            Self::Status(status.as_u16())
        } else {
            Self::Request(error.to_string())
        }
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(error: serde_json::Error) -> Self {
        Self::Decode(error.to_string())
    }
}
