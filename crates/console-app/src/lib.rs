//! Multiverse Console
//!
//! The console shell around the security layer:
//! - Loads configuration and installs logging
//! - Gates access behind the demo login
//! - Switches views and keeps the live metrics window ticking
//! - Stores the assistant credential locally
//! - Asks the generative-text assistant for flavor text
//!
//! # Example
//!
//! ```rust,ignore
//! use console_app::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), ConsoleError> {
//! let config = ConsoleConfig::load(None)?;
//! let session = Arc::new(SessionStore::new());
//!
//! LoginGate::new(config.login.clone(), Arc::clone(&session))
//!     .authenticate("admin123", "admin")
//!     .await?;
//!
//! let console = Console::open(Arc::clone(&session), config.dashboard)?;
//! console.navigate(View::Compute)?;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]

pub mod assistant;
pub mod config;
pub mod console;
pub mod credentials;
pub mod error;
pub mod login;
pub mod logging;
pub mod metrics;

// Re-exports for convenience
pub use assistant::{Assistant, GenAiClient, TextGenerator, API_KEY_HEADER};
pub use config::{
    ApiConfig, AssistantConfig, ConsoleConfig, DashboardConfig, LoggingConfig, LoginConfig,
    StorageConfig,
};
pub use console::{Console, ConsoleState, View};
pub use credentials::{CredentialStore, ASSISTANT_KEY};
pub use error::{AssistantError, ConfigError, ConsoleError, LoginError, StoreError};
pub use login::LoginGate;
pub use metrics::{spawn_ticker, MetricSample, MetricsWindow, TickerHandle};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building on the console
    pub use crate::{
        Assistant, Console, ConsoleConfig, ConsoleError, CredentialStore, LoginGate, View,
    };
    pub use console_security::prelude::*;
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
