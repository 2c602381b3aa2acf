//! Roles and identities
//!
//! Roles form a closed, totally ordered set. The order is the declaration
//! order of [`Role`], so every comparison in the workspace goes through the
//! same `Ord` implementation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access role, ordered by privilege: `Viewer < Developer < Administrator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Read-only access to dashboards
    Viewer,
    /// Can operate compute and storage resources
    Developer,
    /// Full access including team and settings management
    Administrator,
}

impl Role {
    /// All roles, lowest privilege first
    pub const ALL: [Role; 3] = [Role::Viewer, Role::Developer, Role::Administrator];

    /// Numeric rank of the role
    #[inline]
    #[must_use]
    pub fn rank(self) -> u8 {
        match self {
            Role::Viewer => 1,
            Role::Developer => 2,
            Role::Administrator => 3,
        }
    }

    /// Whether this role meets the `required` minimum
    #[inline]
    #[must_use]
    pub fn satisfies(self, required: Role) -> bool {
        self.rank() >= required.rank()
    }

    /// Display name
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Viewer => "Viewer",
            Role::Developer => "Developer",
            Role::Administrator => "Administrator",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown role name
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "developer" => Ok(Role::Developer),
            "administrator" | "admin" => Ok(Role::Administrator),
            _ => Err(RoleParseError(s.to_string())),
        }
    }
}

/// The logged-in user's profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Access role
    pub role: Role,
    /// Avatar image reference
    pub avatar_ref: String,
}

impl Identity {
    /// Create identity without an avatar
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            avatar_ref: String::new(),
        }
    }

    /// With avatar reference
    #[must_use]
    pub fn with_avatar(mut self, avatar_ref: impl Into<String>) -> Self {
        self.avatar_ref = avatar_ref.into();
        self
    }

    /// The demo administrator signed in at startup
    #[must_use]
    pub fn demo_admin() -> Self {
        Self::new(
            "USR-001",
            "Mk Admin",
            "admin@mk-multiverse.io",
            Role::Administrator,
        )
        .with_avatar("https://picsum.photos/seed/mk-admin/100/100")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_order_is_fixed() {
        assert!(Role::Viewer < Role::Developer);
        assert!(Role::Developer < Role::Administrator);
        assert_eq!(Role::ALL.map(Role::rank), [1, 2, 3]);
    }

    #[test]
    fn role_satisfies() {
        assert!(Role::Administrator.satisfies(Role::Viewer));
        assert!(Role::Developer.satisfies(Role::Developer));
        assert!(!Role::Viewer.satisfies(Role::Developer));
    }

    #[test]
    fn role_parse() {
        assert_eq!("Developer".parse::<Role>(), Ok(Role::Developer));
        assert_eq!(" admin ".parse::<Role>(), Ok(Role::Administrator));
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn role_serde_uses_names() {
        let json = serde_json::to_string(&Role::Administrator).unwrap();
        assert_eq!(json, "\"Administrator\"");
    }

    #[test]
    fn demo_admin_profile() {
        let identity = Identity::demo_admin();
        assert_eq!(identity.id, "USR-001");
        assert_eq!(identity.role, Role::Administrator);
        assert!(!identity.avatar_ref.is_empty());
    }
}
