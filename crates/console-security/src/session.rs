//! Session/identity store
//!
//! Single source of truth for who is logged in and which bearer token proves
//! it. Identity and token live in one `Option<ActiveSession>` so they are
//! always set and cleared together.
//!
//! Ending a session does not reload anything. Instead the store broadcasts a
//! [`SessionEvent::Ended`]; the hosting application subscribes and discards
//! every piece of state that depended on the session.

use crate::role::{Identity, Role};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::fmt;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Capacity of the session event channel
const EVENT_CAPACITY: usize = 16;

/// Token issued to the demo administrator
const DEMO_TOKEN: &str = "mk_proto_secure_jwt_token_enterprise";

/// Opaque bearer credential
///
/// Never persisted and never printed; `Debug` is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    /// Wrap a credential; blank input is not a token
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Raw credential, for building the `Authorization` header only
    #[inline]
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `Bearer <token>` header value
    #[must_use]
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    fn demo() -> Self {
        Self(DEMO_TOKEN.to_string())
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Why a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Explicit logout
    Logout,
    /// A server rejected the token (HTTP 401)
    Unauthorized,
    /// Another identity was established over it
    Replaced,
}

/// Session lifecycle notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was established
    Established {
        /// Identity id of the new session
        user_id: String,
    },
    /// The active session was cleared
    Ended {
        /// Why it ended
        reason: EndReason,
        /// When it ended
        at: DateTime<Utc>,
    },
}

#[derive(Clone)]
struct ActiveSession {
    identity: Identity,
    token: Token,
}

/// Process-wide session store
///
/// Shared as `Arc<SessionStore>`. Reads and writes go through one
/// `RwLock`, so the store is safe on a multi-threaded runtime.
pub struct SessionStore {
    active: RwLock<Option<ActiveSession>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Create a logged-out store
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            active: RwLock::new(None),
            events,
        }
    }

    /// Create a store already holding `identity` and `token`
    #[must_use]
    pub fn with_session(identity: Identity, token: Token) -> Self {
        let store = Self::new();
        *store.active.write() = Some(ActiveSession { identity, token });
        store
    }

    /// Store signed in as the demo administrator
    #[must_use]
    pub fn demo() -> Self {
        Self::with_session(Identity::demo_admin(), Token::demo())
    }

    /// Demo administrator identity and token, for login flows
    #[must_use]
    pub fn demo_credentials() -> (Identity, Token) {
        (Identity::demo_admin(), Token::demo())
    }

    /// Replace the active session
    ///
    /// A session already in place ends with [`EndReason::Replaced`] before
    /// the new one is announced.
    pub fn establish(&self, identity: Identity, token: Token) {
        let user_id = identity.id.clone();
        let replaced = self
            .active
            .write()
            .replace(ActiveSession { identity, token });
        if let Some(previous) = replaced {
            info!(user_id = %previous.identity.id, "session replaced");
            let _ = self.events.send(SessionEvent::Ended {
                reason: EndReason::Replaced,
                at: Utc::now(),
            });
        }
        info!(user_id = %user_id, "session established");
        let _ = self.events.send(SessionEvent::Established { user_id });
    }

    /// Current token, if logged in
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        self.active.read().as_ref().map(|s| s.token.clone())
    }

    /// Current identity, if logged in
    #[must_use]
    pub fn user(&self) -> Option<Identity> {
        self.active.read().as_ref().map(|s| s.identity.clone())
    }

    /// Whether a token is present
    #[inline]
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    /// Whether the active identity meets `required`
    ///
    /// Always `false` when logged out.
    #[must_use]
    pub fn has_permission(&self, required: Role) -> bool {
        self.active
            .read()
            .as_ref()
            .is_some_and(|s| s.identity.role.satisfies(required))
    }

    /// Clear identity and token together
    ///
    /// A no-op when already logged out.
    pub fn logout(&self) {
        self.end(EndReason::Logout);
    }

    /// Clear the session after the server rejected the token
    pub fn expire(&self) {
        self.end(EndReason::Unauthorized);
    }

    /// Subscribe to session lifecycle events
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn end(&self, reason: EndReason) {
        let ended = self.active.write().take();
        let Some(previous) = ended else {
            return;
        };

        if reason == EndReason::Unauthorized {
            warn!(user_id = %previous.identity.id, "session expired by server");
        } else {
            info!(user_id = %previous.identity.id, "session ended");
        }
        let _ = self.events.send(SessionEvent::Ended {
            reason,
            at: Utc::now(),
        });
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("user", &self.user().map(|u| u.id))
            .finish_non_exhaustive()
    }
}
