use crate::catalog::ErrorCode;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// Error label used by the fallback envelope
pub const FALLBACK_ERROR: &str = "Internal Server Error.";

/// The `message` field of an error body
///
/// Validation failures commonly report several messages at once, so a list is
/// kept as a list rather than joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    Text(String),
    List(Vec<String>),
}

impl Default for Message {
    fn default() -> Self {
        Message::Text(String::new())
    }
}

impl Message {
    pub fn is_empty(&self) -> bool {
        match self {
            Message::Text(text) => text.is_empty(),
            Message::List(items) => items.is_empty(),
        }
    }

    /// The message as a single line
    pub fn to_text(&self) -> String {
        match self {
            Message::Text(text) => text.clone(),
            Message::List(items) => items.join(", "),
        }
    }

    /// Replace an empty message with the generic catalog message
    pub fn or_generic(self) -> Self {
        if self.is_empty() {
            Message::Text(ErrorCode::Generic.message().to_string())
        } else {
            self
        }
    }
}

impl From<String> for Message {
    fn from(text: String) -> Self {
        Message::Text(text)
    }
}

impl From<&str> for Message {
    fn from(text: &str) -> Self {
        Message::Text(text.to_string())
    }
}

/// Standard error body returned for every handled exception
///
/// # Example
/// ```
/// use catchwall::common::response::ErrorEnvelope;
/// use axum::http::StatusCode;
///
/// let envelope = ErrorEnvelope::new(StatusCode::FORBIDDEN, "Forbidden", "Forbidden", "/x");
/// assert!(!envelope.success);
/// assert_eq!(envelope.status_code, 403);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorEnvelope {
    pub status_code: u16,

    pub success: bool,

    pub message: Message,

    pub error: String,

    pub path: String,

    pub timestamp: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,

    #[serde(skip)]
    pub http_status: StatusCode,
}

impl ErrorEnvelope {
    /// Build an envelope stamped with the current time
    ///
    /// An empty message is replaced with the generic catalog message.
    pub fn new(
        status: StatusCode,
        message: impl Into<Message>,
        error: impl Into<String>,
        path: impl Into<String>,
    ) -> Self {
        Self {
            status_code: status.as_u16(),
            success: false,
            message: message.into().or_generic(),
            error: error.into(),
            path: path.into(),
            timestamp: now_iso8601(),
            stack: None,
            http_status: status,
        }
    }

    /// Generic 500 body used when normalization itself fails
    ///
    /// Keeps `statusCode: 500` on purpose: the fallback has the same fields as
    /// every other error body.
    pub fn fallback(path: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Generic.message(),
            FALLBACK_ERROR,
            path,
        )
    }

    /// Override the `statusCode` body field without touching the HTTP status
    pub fn status_code(mut self, status_code: u16) -> Self {
        self.status_code = status_code;
        self
    }

    pub fn stack(mut self, stack: Option<String>) -> Self {
        self.stack = stack;
        self
    }
}

impl IntoResponse for ErrorEnvelope {
    fn into_response(self) -> Response {
        (self.http_status, Json(self)).into_response()
    }
}

/// UTC timestamp with millisecond precision, e.g. `2024-01-01T00:00:00.000Z`
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
