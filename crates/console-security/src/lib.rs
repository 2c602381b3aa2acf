//! Console Security - session, permission and secured-request layer
//!
//! The trusted core underneath the Multiverse Console:
//! - Holds the single active identity and its bearer token
//! - Decides whether the active role satisfies a required role
//! - Performs outbound HTTP calls with security headers, a hard deadline
//!   and forced logout on authentication failure
//! - Escapes HTML-significant characters before markup interpolation
//!
//! # Architecture
//!
//! ```text
//! sanitize ─┐
//! Role ─────┼─→ SessionStore ─→ SecureClient ─→ (console views)
//! Frozen<T> ┘        │
//!                    └─ broadcast<SessionEvent>
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use console_security::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), FetchError> {
//! let session = Arc::new(SessionStore::demo());
//! let client = SecureClient::new(Arc::clone(&session));
//!
//! let nodes = client
//!     .fetch_json("https://api.example.test/nodes", FetchOptions::get())
//!     .await?;
//!
//! assert!(session.has_permission(Role::Developer));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
pub mod error;
pub mod fetch;
pub mod role;
pub mod sanitize;
pub mod session;

// Re-exports for convenience
pub use error::FetchError;
pub use fetch::{FetchOptions, RequestEnvelope, SecureClient, DEFAULT_TIMEOUT};
pub use role::{Identity, Role, RoleParseError};
pub use sanitize::{freeze, sanitize, sanitize_optional, Frozen};
pub use session::{EndReason, SessionEvent, SessionStore, Token};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the security layer
    pub use crate::{
        freeze, sanitize, FetchError, FetchOptions, Frozen, Identity, Role, SecureClient,
        SessionEvent, SessionStore, Token,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
