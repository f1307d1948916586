//! Wire types for the backend REST API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::session::Message;

/// Body for session create/rename calls.
#[derive(Debug, Serialize)]
pub(crate) struct NameRequest<'a> {
    pub name: &'a str,
}

/// Body for the streaming chat endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ChatRequest<'a> {
    pub session_id: &'a str,
    pub message: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FeedbackRequest<'a> {
    pub session_id: &'a str,
    pub message_id: &'a str,
    pub liked: bool,
}

/// `{"success": bool}` acknowledgement for mutations.
#[derive(Debug, Deserialize)]
pub(crate) struct Success {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedbackResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub error: Option<String>,
}

/// A tool exposed by the MCP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpTool {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Option<Value>,
}

/// Backend health report.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Health {
    pub status: String,
    #[serde(default)]
    pub mcp_server: Option<String>,
    #[serde(default)]
    pub ai_provider: Option<String>,
}

/// User info from the identity endpoint. Deployments disagree on the
/// login field name, so every observed variant is accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserInfo {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    login: Option<String>,
    #[serde(default, rename = "userLogin")]
    user_login: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default, rename = "userId")]
    user_id: Option<String>,
}

impl UserInfo {
    /// The first populated login-ish field.
    pub fn login_handle(&self) -> Option<&str> {
        self.login
            .as_deref()
            .or(self.user_login.as_deref())
            .or(self.username.as_deref())
            .or(self.user_id.as_deref())
    }

    /// Display name, falling back like the original UI did.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown User")
    }

    /// Up to two uppercased initials from the display name; "UU" when the
    /// name is unknown.
    pub fn initials(&self) -> String {
        match &self.name {
            Some(name) if !name.trim().is_empty() => name
                .split_whitespace()
                .filter_map(|word| word.chars().next())
                .take(2)
                .flat_map(char::to_uppercase)
                .collect(),
            _ => "UU".to_string(),
        }
    }
}
