//! Login gate
//!
//! Checks the demo credentials after a short artificial latency and, on
//! success, establishes the demo administrator session.

use crate::config::LoginConfig;
use crate::error::LoginError;
use console_security::{Identity, SessionStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Credential check in front of the console
#[derive(Debug, Clone)]
pub struct LoginGate {
    config: LoginConfig,
    session: Arc<SessionStore>,
}

impl LoginGate {
    /// Create gate writing into `session`
    #[must_use]
    pub fn new(config: LoginConfig, session: Arc<SessionStore>) -> Self {
        Self { config, session }
    }

    /// Verify `user`/`password` and open a session
    ///
    /// # Errors
    /// - `LoginError::InvalidCredentials` on mismatch; the store is untouched
    pub async fn authenticate(&self, user: &str, password: &str) -> Result<Identity, LoginError> {
        tokio::time::sleep(self.config.delay()).await;

        if user != self.config.username || password != self.config.password {
            warn!(user, "login denied");
            return Err(LoginError::InvalidCredentials);
        }

        let (identity, token) = SessionStore::demo_credentials();
        self.session.establish(identity.clone(), token);
        info!(user_id = %identity.id, "login accepted");
        Ok(identity)
    }
}
