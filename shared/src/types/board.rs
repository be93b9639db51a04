use serde::{Deserialize, Serialize};

use super::register::UserSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

impl Visibility {
    pub fn is_public(&self) -> bool {
        matches!(self, Visibility::Public)
    }
}

/// A board as returned by `GET /boards/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_public")]
    pub is_public: bool,
    #[serde(default)]
    pub members: Vec<UserSummary>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Board {
    pub fn visibility(&self) -> Visibility {
        if self.is_public {
            Visibility::Public
        } else {
            Visibility::Private
        }
    }

    pub fn has_member(&self, username: &str) -> bool {
        self.members.iter().any(|m| m.username == username)
    }
}

/// Body of `POST /boards/` (admin only).
#[derive(Debug, Clone, Serialize)]
pub struct NewBoard {
    pub name: String,
    pub description: String,
    pub is_public: bool,
}

impl NewBoard {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        visibility: Visibility,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            is_public: visibility.is_public(),
        }
    }
}

/// Body of `POST /boards/{id}/add-member/`.
#[derive(Debug, Clone, Serialize)]
pub struct AddMemberRequest {
    pub username: String,
}

fn default_public() -> bool {
    true
}
