use serde::{Deserialize, Serialize};

/// Tags are global. Names are unique ignoring case, so `Backend` and
/// `backend` are the same tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl Tag {
    pub fn matches_name(&self, name: &str) -> bool {
        normalize_name(&self.name) == normalize_name(name)
    }
}

/// Body of `POST /tags/`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTag {
    pub name: String,
}

/// Key used to deduplicate tag names.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
