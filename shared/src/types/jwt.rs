use serde::{Deserialize, Serialize};
use std::fmt;

/// Claims the feedback service embeds in every access token.
///
/// The client never verifies the signature (it does not hold the key); it
/// only reads these fields to decide what the signed-in user may do. The
/// server remains the authority and answers 401/403 when the token or the
/// role does not allow a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// Login name of the principal.
    pub username: String,

    /// Raw role string (`admin`, `moderator`, `contributor`).
    /// Kept as a string so an unknown role never makes the token unreadable.
    #[serde(default)]
    pub role: String,

    /// Django superuser flag.
    #[serde(default)]
    pub is_superuser: bool,

    /// Standard JWT expiry (Unix timestamp, seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl AccessClaims {
    pub fn role(&self) -> Role {
        Role::from(self.role.as_str())
    }

    /// Whether this principal may change item status on the kanban board.
    ///
    /// The move endpoint only accepts admins; superusers are treated the same
    /// way since the service grants them every permission.
    pub fn is_elevated(&self) -> bool {
        self.is_superuser || self.role() == Role::Admin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Moderator,
    Contributor,
    Unknown,
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "moderator" => Role::Moderator,
            "contributor" => Role::Contributor,
            _ => Role::Unknown,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Moderator => write!(f, "moderator"),
            Role::Contributor => write!(f, "contributor"),
            Role::Unknown => write!(f, "unknown"),
        }
    }
}
