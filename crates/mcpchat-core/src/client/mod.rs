//! REST client for the chat backend.
//!
//! Thin wrappers over the backend's session/tool/feedback endpoints plus
//! the streaming chat endpoint. Every method returns a structured
//! [`ApiError`] so callers can distinguish transport failures from backend
//! refusals without string matching.

mod types;

use std::fmt;

use futures_util::StreamExt;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::config::Config;
use crate::session::{Message, Session};
use crate::stream::NotificationStream;

pub use types::{Health, McpTool, UserInfo};
use types::{ChatRequest, FeedbackRequest, FeedbackResponse, NameRequest, Success};

/// Standard User-Agent header for mcpchat API requests.
pub const USER_AGENT: &str = concat!("mcpchat/", env!("CARGO_PKG_VERSION"));

/// Categories of backend errors for consistent handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// HTTP status error (4xx, 5xx)
    HttpStatus,
    /// Connection or request timeout
    Timeout,
    /// Connection-level failure (DNS, reset, broken stream)
    Transport,
    /// Failed to parse a response body
    Parse,
    /// Backend-level refusal (e.g. `success: false`, unknown session)
    Api,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::HttpStatus => write!(f, "http_status"),
            ApiErrorKind::Timeout => write!(f, "timeout"),
            ApiErrorKind::Transport => write!(f, "transport"),
            ApiErrorKind::Parse => write!(f, "parse"),
            ApiErrorKind::Api => write!(f, "api"),
        }
    }
}

/// Structured error from the backend client.
#[derive(Debug, Clone)]
pub struct ApiError {
    pub kind: ApiErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional raw response body
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    /// Creates an HTTP status error, extracting the backend's `error`
    /// field from a JSON body when present.
    pub fn http_status(status: u16, body: &str) -> Self {
        let message = format!("HTTP {status}");
        if body.is_empty() {
            return Self::new(ApiErrorKind::HttpStatus, message);
        }
        if let Ok(json) = serde_json::from_str::<Value>(body)
            && let Some(msg) = json.get("error").and_then(|v| v.as_str())
        {
            return Self {
                kind: ApiErrorKind::HttpStatus,
                message: format!("HTTP {status}: {msg}"),
                details: Some(body.to_string()),
            };
        }
        Self {
            kind: ApiErrorKind::HttpStatus,
            message,
            details: Some(body.to_string()),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Transport, message)
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Parse, message)
    }

    pub fn api(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Api, message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}

/// Result type for backend operations.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// Streaming chat response: notifications decoded from the response body.
pub type ChatStream =
    NotificationStream<futures_util::stream::BoxStream<'static, reqwest::Result<bytes::Bytes>>>;

fn classify_reqwest_error(e: &reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::new(ApiErrorKind::Timeout, format!("request timed out: {e}"))
    } else {
        ApiError::transport(format!("request failed: {e}"))
    }
}

/// Client for the chat backend's REST API.
#[derive(Debug, Clone)]
pub struct Backend {
    config: Config,
    http: reqwest::Client,
}

impl Backend {
    /// Creates a client with the configured request timeout.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: Config) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    /// Lists all sessions.
    pub async fn list_sessions(&self) -> ApiResult<Vec<Session>> {
        self.get_json(&self.url("sessions")).await
    }

    /// Creates a session with the given name.
    pub async fn create_session(&self, name: &str) -> ApiResult<Session> {
        let response = self
            .send(self.http.post(self.url("sessions")).json(&NameRequest { name }))
            .await?;
        decode_json(response).await
    }

    /// Fetches one session with its full message history.
    pub async fn session(&self, id: &str) -> ApiResult<Session> {
        self.get_json(&self.url(&format!("sessions/{id}"))).await
    }

    /// Renames a session. The backend answers `success: false` for an
    /// unknown id.
    pub async fn rename_session(&self, id: &str, name: &str) -> ApiResult<()> {
        let url = self.url(&format!("sessions/{id}/name"));
        let response = self
            .send(self.http.put(url).json(&NameRequest { name }))
            .await?;
        expect_success(decode_json::<Success>(response).await?, "rename session")
    }

    /// Deletes a session.
    pub async fn delete_session(&self, id: &str) -> ApiResult<()> {
        let url = self.url(&format!("sessions/{id}"));
        let response = self.send(self.http.delete(url)).await?;
        expect_success(decode_json::<Success>(response).await?, "delete session")
    }

    /// Removes every message from a session, keeping the session itself.
    pub async fn clear_messages(&self, id: &str) -> ApiResult<()> {
        let url = self.url(&format!("sessions/{id}/messages"));
        let response = self.send(self.http.delete(url)).await?;
        expect_success(decode_json::<Success>(response).await?, "clear session")
    }

    /// Lists the tools the MCP server currently exposes.
    pub async fn list_tools(&self) -> ApiResult<Vec<McpTool>> {
        self.get_json(&self.url("tools")).await
    }

    /// Backend and MCP server health.
    pub async fn health(&self) -> ApiResult<Health> {
        self.get_json(&self.url("health")).await
    }

    /// Records thumbs-up/down feedback on an assistant message and returns
    /// the updated message.
    pub async fn send_feedback(
        &self,
        session_id: &str,
        message_id: &str,
        liked: bool,
    ) -> ApiResult<Message> {
        let request = FeedbackRequest {
            session_id,
            message_id,
            liked,
        };
        let response = self
            .send(self.http.post(self.url("feedback")).json(&request))
            .await?;
        let feedback: FeedbackResponse = decode_json(response).await?;
        if !feedback.success {
            return Err(ApiError::api(
                feedback
                    .error
                    .unwrap_or_else(|| "feedback rejected".to_string()),
            ));
        }
        feedback
            .message
            .ok_or_else(|| ApiError::parse("feedback response missing message"))
    }

    /// Fetches the signed-in user's info from the configured endpoint.
    pub async fn user_info(&self) -> ApiResult<UserInfo> {
        let Some(url) = self.config.user_info_url.clone() else {
            return Err(ApiError::api("user_info_url is not configured"));
        };
        self.get_json(&url).await
    }

    /// Posts a user message and returns the streaming assistant response.
    ///
    /// The caller drives the returned stream; dropping it cancels the
    /// request. Mid-stream `error` frames surface as
    /// [`StreamNotification::Error`](crate::stream::StreamNotification)
    /// items without ending the stream.
    pub async fn chat(&self, session_id: &str, message: &str) -> ApiResult<ChatStream> {
        let request = ChatRequest {
            session_id,
            message,
        };
        let response = self
            .send(
                self.http
                    .post(self.url("chat"))
                    .header("accept", "text/event-stream")
                    .json(&request),
            )
            .await?;
        Ok(NotificationStream::new(response.bytes_stream().boxed()))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        let response = self.send(self.http.get(url)).await?;
        decode_json(response).await
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> ApiResult<reqwest::Response> {
        let response = builder
            .header("user-agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::http_status(status.as_u16(), &body));
        }
        Ok(response)
    }
}

async fn decode_json<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
    response
        .json()
        .await
        .map_err(|e| ApiError::parse(format!("failed to decode response: {e}")))
}

fn expect_success(ack: Success, action: &str) -> ApiResult<()> {
    if ack.success {
        Ok(())
    } else {
        Err(ApiError::api(format!("backend refused to {action}")))
    }
}
