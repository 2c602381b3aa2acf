//! Error types for the console
//!
//! Provides error handling for:
//! - Configuration loading
//! - The login gate
//! - The local credential store
//! - The generative-text assistant
//! - View navigation

use console_security::{FetchError, Role};
use std::path::PathBuf;

/// Main console error type
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    /// Configuration failed to load
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Login was refused
    #[error("login failed: {0}")]
    Login(#[from] LoginError),

    /// Secured request failed
    #[error("request failed: {0}")]
    Fetch(#[from] FetchError),

    /// Credential store failed
    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    /// Assistant call failed
    #[error("assistant error: {0}")]
    Assistant(#[from] AssistantError),

    /// No active session
    #[error("not authenticated")]
    NotAuthenticated,

    /// Active role is below what the view requires
    #[error("view {view} requires role {required}")]
    Forbidden {
        /// Requested view label
        view: &'static str,
        /// Minimum role
        required: Role,
    },
}

impl ConsoleError {
    /// Whether the user has to log in again
    #[inline]
    #[must_use]
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            Self::NotAuthenticated | Self::Fetch(FetchError::SessionExpired)
        )
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("cannot read {path:?}: {source}")]
    Read {
        /// Offending path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// File is not valid configuration
    #[error("parse error: {0}")]
    Parse(String),

    /// A value is out of range
    #[error("invalid value: {0}")]
    Invalid(String),
}

/// Login gate errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    /// User id or password did not match
    #[error("access denied: invalid credentials")]
    InvalidCredentials,
}

/// Credential store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// File system failure
    #[error("I/O error on {path:?}: {source}")]
    Io {
        /// Store location
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// File exists but is not a credential map
    #[error("corrupt credential file {path:?}: {source}")]
    Corrupt {
        /// Store location
        path: PathBuf,
        /// Parse failure
        source: serde_json::Error,
    },
}

/// Generative-text assistant errors
///
/// Kept apart from [`FetchError`]: the assistant is a separate external
/// dependency and never goes through the secured request wrapper.
#[derive(Debug, thiserror::Error)]
pub enum AssistantError {
    /// No credential configured; nothing was sent
    #[error("assistant credential is not configured")]
    MissingCredential,

    /// Stored credential cannot be sent as a header value
    #[error("assistant credential contains characters that cannot be sent")]
    InvalidCredential,

    /// Credential store could not be read
    #[error("credential lookup failed: {0}")]
    Store(#[from] StoreError),

    /// Connection-level failure, with the request URL stripped
    #[error("assistant request failed: {0}")]
    Request(reqwest::Error),

    /// No answer within the configured deadline
    #[error("assistant did not answer within {timeout_ms}ms")]
    Timeout {
        /// Deadline that elapsed
        timeout_ms: u64,
    },

    /// Service answered with a non-success status
    #[error("assistant returned status {status}")]
    Status {
        /// Numeric status code
        status: u16,
    },

    /// Service answered without any text
    #[error("assistant returned no text")]
    EmptyResponse,
}

impl AssistantError {
    /// Whether the call was blocked before any network attempt
    #[inline]
    #[must_use]
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingCredential)
    }

    /// Whether the service never answered in time
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
