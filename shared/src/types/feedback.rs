use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::register::UserSummary;
use super::tag::Tag;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Workflow status of a feedback item. Every status is reachable from every
/// other one; the kanban board shows one column per status in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Completed,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Open, Status::InProgress, Status::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in_progress",
            Status::Completed => "completed",
        }
    }

    /// Column heading.
    pub fn title(&self) -> &'static str {
        match self {
            Status::Open => "Open",
            Status::InProgress => "In Progress",
            Status::Completed => "Completed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    Feature,
    Bug,
    #[serde(alias = "idea")]
    Suggestion,
}

impl FeedbackType {
    pub const ALL: [FeedbackType; 3] = [
        FeedbackType::Feature,
        FeedbackType::Bug,
        FeedbackType::Suggestion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackType::Feature => "feature",
            FeedbackType::Bug => "bug",
            FeedbackType::Suggestion => "suggestion",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl FromStr for Status {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "open" => Ok(Status::Open),
            "in_progress" => Ok(Status::InProgress),
            "completed" => Ok(Status::Completed),
            _ => Err(ParseEnumError {
                kind: "status",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for FeedbackType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "feature" => Ok(FeedbackType::Feature),
            "bug" => Ok(FeedbackType::Bug),
            "suggestion" | "idea" => Ok(FeedbackType::Suggestion),
            _ => Err(ParseEnumError {
                kind: "feedback type",
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for FeedbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Feedback wire types
// ---------------------------------------------------------------------------

/// A feedback item as returned by `GET /feedback/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: Status,
    pub feedback_type: FeedbackType,
    #[serde(default)]
    pub upvote_count: u32,
    #[serde(default)]
    pub tags: Vec<Tag>,
    /// Owning board id.
    pub board: i64,
    #[serde(default)]
    pub created_by: Option<UserSummary>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl FeedbackItem {
    pub fn has_tag(&self, tag_id: i64) -> bool {
        self.tags.iter().any(|t| t.id == tag_id)
    }
}

/// Body of `POST /feedback/`.
///
/// `tag_names` are resolved server-side with get-or-create, so new tags can
/// be attached without a separate call.
#[derive(Debug, Clone, Serialize)]
pub struct NewFeedback {
    pub board: i64,
    pub title: String,
    pub description: String,
    pub feedback_type: FeedbackType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tag_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tag_names: Vec<String>,
}

/// Body of `POST /feedback/{id}/move/`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MoveRequest {
    pub status: Status,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveResponse {
    #[serde(default)]
    pub detail: String,
    #[serde(default)]
    pub new_status: Option<Status>,
}
