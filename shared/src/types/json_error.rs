use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parsed body of a non-2xx response.
///
/// The service answers `{"detail": "..."}` for most failures and
/// `{"field": ["message", ...]}` for validation failures. Both shapes are
/// folded into this struct so callers can show the messages verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: Option<String>,
    pub fields: BTreeMap<String, Vec<String>>,
}

impl ErrorResponse {
    pub fn from_body(body: &[u8]) -> Self {
        match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => {
                let mut out = Self::default();
                for (key, value) in map {
                    if key == "detail" {
                        out.detail = Some(flatten_text(&value).join(" "));
                    } else {
                        out.fields.insert(key, flatten_text(&value));
                    }
                }
                out
            }
            Ok(other) => Self {
                detail: Some(flatten_text(&other).join(" ")).filter(|s| !s.is_empty()),
                fields: BTreeMap::new(),
            },
            Err(_) => {
                let text = String::from_utf8_lossy(body).trim().to_string();
                Self {
                    detail: Some(text).filter(|s| !s.is_empty()),
                    fields: BTreeMap::new(),
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.detail.is_none() && self.fields.is_empty()
    }

    /// Single-line rendering for inline error messages.
    pub fn message(&self) -> String {
        let mut parts = Vec::new();
        if let Some(detail) = &self.detail {
            parts.push(detail.clone());
        }
        for (field, messages) in &self.fields {
            parts.push(format!("{}: {}", field, messages.join(" ")));
        }
        parts.join("; ")
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// `{"detail": "..."}` acknowledgement returned by action endpoints
/// (upvote, add-member).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Detail {
    #[serde(default)]
    pub detail: String,
}

fn flatten_text(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(flatten_text).collect(),
        Value::Null => Vec::new(),
        other => vec![other.to_string()],
    }
}
