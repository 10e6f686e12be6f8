//! Chat message model and the persisted summary record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Message author role
///
/// Roles this crate does not know (`developer`, vendor extensions) are kept
/// verbatim so the message survives a rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    #[serde(untagged)]
    Other(String),
}

impl Role {
    /// Label used when rendering a transcript
    pub fn label(&self) -> &str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "system",
            Role::Tool => "tool",
            Role::Other(name) => name,
        }
    }
}

/// Marker for `{"type": "text"}` parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    Text,
}

/// A text part of multimodal content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPart {
    #[serde(rename = "type")]
    pub kind: TextKind,
    pub text: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One element of multimodal content. Non-text parts are carried opaquely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ContentPart {
    Text(TextPart),
    Other(Value),
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text(TextPart {
            kind: TextKind::Text,
            text: text.into(),
            extra: Map::new(),
        })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentPart::Text(part) => Some(&part.text),
            ContentPart::Other(_) => None,
        }
    }
}

/// Message content: plain text or an ordered list of parts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Text(String),
    Parts(Vec<ContentPart>),
}

impl Content {
    /// Text fragments in order; non-text parts are skipped
    pub fn text_parts(&self) -> Vec<&str> {
        match self {
            Content::Text(text) => vec![text.as_str()],
            Content::Parts(parts) => parts.iter().filter_map(ContentPart::as_text).collect(),
        }
    }
}

/// A chat message as supplied by the host
///
/// Fields other than `role` and `content` (tool calls, names, ids) are kept in
/// `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: Some(Content::Text(text.into())),
            extra: Map::new(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Role::System, text)
    }

    /// Text fragments of this message, joined with `separator`
    pub fn joined_text(&self, separator: &str) -> String {
        self.content
            .as_ref()
            .map(|c| c.text_parts().join(separator))
            .unwrap_or_default()
    }

    /// Estimated tokens of the text content only
    pub fn estimated_tokens(&self) -> usize {
        condenser_telemetry::estimate_tokens(&self.joined_text(""))
    }
}

/// Sum of text-only token estimates across messages
pub fn estimate_message_tokens(messages: &[Message]) -> usize {
    messages.iter().map(Message::estimated_tokens).sum()
}

/// Stored summary for one conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub conversation_id: String,
    pub summary_text: String,
    /// Exclusive index into the message sequence covered by `summary_text`
    pub compressed_through: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationSummary {
    pub fn new(
        conversation_id: impl Into<String>,
        summary_text: impl Into<String>,
        compressed_through: usize,
    ) -> Self {
        let now = Utc::now();
        Self {
            conversation_id: conversation_id.into(),
            summary_text: summary_text.into(),
            compressed_through,
            created_at: now,
            updated_at: now,
        }
    }
}
