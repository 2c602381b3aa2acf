//! Error types for secured requests
//!
//! Every failure mode of [`SecureClient`](crate::SecureClient) is a distinct
//! variant so callers can tell "the user is logged out" apart from "the
//! network was too slow" without inspecting messages.

/// Secured request error
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Deadline elapsed before the exchange completed
    #[error("request aborted after {timeout_ms}ms")]
    Timeout {
        /// Deadline that elapsed
        timeout_ms: u64,
    },

    /// Server answered 401; the session has been cleared
    #[error("session expired")]
    SessionExpired,

    /// Any other non-success status
    #[error("API error: {status} {status_text}")]
    Api {
        /// Numeric status code
        status: u16,
        /// Canonical reason phrase
        status_text: String,
    },

    /// Connection-level failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body was not the expected JSON
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),

    /// Caller-supplied header or body could not be encoded
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// Deadline elapsed
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Session was ended by a 401
    #[inline]
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Status code, when the server answered
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired => Some(401),
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether a caller could reasonably try again
    ///
    /// The client itself never retries.
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport(_) => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Short machine-readable kind
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::SessionExpired => "session_expired",
            Self::Api { .. } => "api_error",
            Self::Transport(_) => "transport",
            Self::Decode(_) => "decode",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}
