use crate::exception::{Exception, capture_stack};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// An error raised by the persistence layer
///
/// Only the error's type name and message are known; the status is always 500.
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[error("{name}: {message}")]
pub struct PersistenceError {
    name: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
}

impl PersistenceError {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            stack: capture_stack(),
        }
    }

    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::new("QueryFailedError", message)
    }

    pub fn entity_not_found(message: impl Into<String>) -> Self {
        Self::new("EntityNotFoundError", message)
    }

    /// Type name of the underlying error
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }
}

#[cfg(feature = "sea-orm-db")]
impl From<sea_orm::DbErr> for PersistenceError {
    fn from(err: sea_orm::DbErr) -> Self {
        PersistenceError::new("DbErr", err.to_string())
    }
}

impl IntoResponse for PersistenceError {
    fn into_response(self) -> Response {
        Exception::from(self).into_response()
    }
}
