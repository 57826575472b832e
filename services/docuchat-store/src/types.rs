//! Domain types for meetings and chat history.
//!
//! `ChatTurn` doubles as the Gemini `contents` wire shape
//! (`{"role": "user", "parts": [{"text": "…"}]}`), so the persisted history
//! can be sent to the model without conversion.

use serde::{Deserialize, Serialize};

/// A meeting known to the system.
///
/// Created out-of-band; this system only ever mutates `cached_content_name`
/// when a context cache is (re)created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Meeting {
    /// Stable 1-based identifier
    pub id: u64,

    /// Display title
    #[serde(default)]
    pub title: String,

    /// Remote context cache handle (`cachedContents/<id>`), empty until a
    /// cache exists
    #[serde(default)]
    pub cached_content_name: String,
}

impl Meeting {
    /// Whether a context cache handle is on record.
    pub fn has_cache(&self) -> bool {
        !self.cached_content_name.is_empty()
    }
}

/// Who produced a chat turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Model => "model",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One text fragment of a chat turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub text: String,
}

/// A single turn in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub parts: Vec<Part>,
}

/// Chronologically ordered turns for one meeting.
pub type ChatHistory = Vec<ChatTurn>;

impl ChatTurn {
    /// Create a user turn with a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Create a model turn with a single text part.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part { text: text.into() }],
        }
    }

    /// Text of the first part, or empty if the turn has no parts.
    pub fn text(&self) -> &str {
        self.parts.first().map_or("", |p| p.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(serde_json::to_string(&Role::Model).unwrap(), "\"model\"");

        let parsed: Role = serde_json::from_str("\"model\"").unwrap();
        assert_eq!(parsed, Role::Model);
    }

    #[test]
    fn chat_turn_wire_shape() {
        let turn = ChatTurn::user("What did they discuss?");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "role": "user",
                "parts": [{"text": "What did they discuss?"}]
            })
        );
    }

    #[test]
    fn chat_turn_text_accessor() {
        assert_eq!(ChatTurn::model("hello").text(), "hello");

        let empty = ChatTurn {
            role: Role::User,
            parts: vec![],
        };
        assert_eq!(empty.text(), "");
    }

    #[test]
    fn meeting_defaults_missing_fields() {
        let parsed: Meeting = serde_json::from_str(r#"{"id": 2}"#).unwrap();
        assert_eq!(parsed.id, 2);
        assert!(parsed.title.is_empty());
        assert!(!parsed.has_cache());

        let cached: Meeting =
            serde_json::from_str(r#"{"id": 1, "cached_content_name": "cachedContents/abc"}"#)
                .unwrap();
        assert!(cached.has_cache());
    }
}
