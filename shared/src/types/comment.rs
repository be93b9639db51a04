use serde::{Deserialize, Serialize};

use super::register::UserSummary;

/// A comment as returned by `GET /comments/?feedback=`. The server orders
/// them oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub content: String,
    pub feedback: i64,
    #[serde(default)]
    pub created_by: Option<UserSummary>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /comments/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewComment {
    pub feedback: i64,
    pub content: String,
}
