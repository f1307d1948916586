//! Chat session and message model.
//!
//! Mirrors the backend's wire format (camelCase fields, RFC 3339 string
//! timestamps). User messages get a client-generated temporary id; the
//! server assigns the real id for assistant messages when the stream
//! starts. Assistant content is only mutable while its stream is in
//! flight; after that the server's copy is canonical and a session refresh
//! overwrites whatever the client accumulated.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// RFC 3339 timestamp.
    pub timestamp: String,
    /// Feedback state: `None` until the user votes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liked: Option<bool>,
}

impl Message {
    /// Creates a user message with a temporary client-side id. The server
    /// replaces it with a canonical id once the message is persisted.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: format!("temp_{}", Uuid::new_v4()),
            role: Role::User,
            content: content.into(),
            timestamp: timestamp_now(),
            liked: None,
        }
    }

    /// Creates an assistant message shell for a freshly started stream.
    pub fn assistant(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            role: Role::Assistant,
            content: String::new(),
            timestamp: timestamp_now(),
            liked: None,
        }
    }
}

/// An ordered conversation, as served by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub created_at: Option<String>,
    pub last_activity: String,
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Session {
    /// Appends a message and bumps the activity timestamp.
    pub fn add_message(&mut self, message: Message) {
        self.messages.push(message);
        self.last_activity = timestamp_now();
    }

    /// Looks up a message by id.
    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }
}

/// Returns an RFC 3339 UTC timestamp string.
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Human-friendly age of a timestamp for session listings: "Just now",
/// "5m ago", "3h ago", "2d ago", then the local date. Unparseable input
/// is returned as-is.
pub fn relative_time(timestamp: &str) -> String {
    let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp) else {
        return timestamp.to_string();
    };
    let elapsed = Utc::now().signed_duration_since(parsed.with_timezone(&Utc));

    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        return "Just now".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m ago");
    }
    let hours = elapsed.num_hours();
    if hours < 24 {
        return format!("{hours}h ago");
    }
    let days = elapsed.num_days();
    if days < 7 {
        return format!("{days}d ago");
    }
    parsed
        .with_timezone(&Local)
        .format("%Y-%m-%d")
        .to_string()
}
