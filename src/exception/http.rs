use crate::catalog::ErrorCode;
use crate::exception::{Exception, capture_stack};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

/// An exception carrying an explicit HTTP status and response payload
///
/// The payload is normally `{ statusCode, message, error }`, but any JSON can
/// be attached with [`HttpException::with_response`]. The filter validates the
/// shape when the exception is caught.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct HttpException {
    status: u16,
    response: Value,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl HttpException {
    /// Build an exception with the standard payload for `status`
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let response = json!({
            "statusCode": status.as_u16(),
            "message": message,
            "error": status.canonical_reason().unwrap_or("Error"),
        });
        Self {
            status: status.as_u16(),
            response,
            message,
            stack: capture_stack(),
        }
    }

    /// Build an exception with an arbitrary payload
    pub fn with_response(status: u16, response: Value) -> Self {
        let message = match response.get("message") {
            Some(Value::String(text)) => text.clone(),
            _ => "Http Exception".to_string(),
        };
        Self {
            status,
            response,
            message,
            stack: capture_stack(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// 403 carrying the catalog's access-denied message
    pub fn access_denied() -> Self {
        Self::forbidden(ErrorCode::AccessDenied.message())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message)
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Raw status number as raised
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn response(&self) -> &Value {
        &self.response
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

impl IntoResponse for HttpException {
    fn into_response(self) -> Response {
        Exception::from(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_payload() {
        let e = HttpException::forbidden("Forbidden");
        assert_eq!(e.status(), 403);
        assert_eq!(
            e.response(),
            &json!({ "statusCode": 403, "message": "Forbidden", "error": "Forbidden" })
        );
        assert_eq!(e.to_string(), "Forbidden");
    }

    #[test]
    fn test_access_denied_uses_catalog() {
        let e = HttpException::access_denied();
        assert_eq!(e.status(), 403);
        assert_eq!(e.response()["message"], "Access denied..!");
    }

    #[test]
    fn test_custom_payload_message() {
        let e = HttpException::with_response(
            422,
            json!({ "statusCode": 422, "message": ["a", "b"], "error": "Unprocessable Entity" }),
        );
        assert_eq!(e.status(), 422);
        assert_eq!(e.message(), "Http Exception");

        let e = HttpException::with_response(409, json!({ "message": "taken" }));
        assert_eq!(e.message(), "taken");
    }
}
