use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::backtrace::{Backtrace, BacktraceStatus};

pub mod filter;
pub mod host;
pub mod http;
pub mod persistence;

pub use filter::AllExceptionFilter;
pub use host::ArgumentsHost;
pub use http::HttpException;
pub use persistence::PersistenceError;

/// An exception raised while handling a request
#[derive(Debug, Clone, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Exception {
    /// Carries its own status and response payload
    #[error(transparent)]
    Http(HttpException),

    /// Raised by the persistence layer; always answered with a 500
    #[error(transparent)]
    Persistence(PersistenceError),
}

impl Exception {
    /// The HTTP status this exception maps to
    ///
    /// Embedded HTTP statuses outside the valid range fall back to 500.
    pub fn status(&self) -> StatusCode {
        match self {
            Exception::Http(e) => {
                StatusCode::from_u16(e.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Exception::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn stack(&self) -> Option<&str> {
        match self {
            Exception::Http(e) => e.stack(),
            Exception::Persistence(e) => e.stack(),
        }
    }
}

impl From<HttpException> for Exception {
    fn from(e: HttpException) -> Self {
        Exception::Http(e)
    }
}

impl From<PersistenceError> for Exception {
    fn from(e: PersistenceError) -> Self {
        Exception::Persistence(e)
    }
}

#[cfg(feature = "sea-orm-db")]
impl From<sea_orm::DbErr> for Exception {
    fn from(err: sea_orm::DbErr) -> Self {
        Exception::Persistence(err.into())
    }
}

/// Handlers return exceptions as responses; the exception rides along in the
/// response extensions until [`crate::layer::ExceptionFilterLayer`] hands it
/// to the registered filter. Without the layer the client only sees the status.
impl IntoResponse for Exception {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// The ExceptionFilter trait
///
/// Filters handle exceptions thrown during request processing.
/// They must return a valid Response and never fail themselves.
pub trait ExceptionFilter: Send + Sync + 'static {
    /// Catch an exception and return a response
    fn catch(&self, exception: Exception, host: &ArgumentsHost) -> Response;
}

/// Backtrace of the caller, when capture is enabled (`RUST_BACKTRACE`)
pub(crate) fn capture_stack() -> Option<String> {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_by_category() {
        let http: Exception = HttpException::forbidden("Forbidden").into();
        assert_eq!(http.status(), StatusCode::FORBIDDEN);

        let db: Exception = PersistenceError::query_failed("duplicate key").into();
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let odd: Exception = HttpException::with_response(42, serde_json::json!({})).into();
        assert_eq!(odd.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_into_response_carries_exception() {
        let response = HttpException::not_found("missing").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let carried = response.extensions().get::<Exception>().unwrap();
        assert!(matches!(carried, Exception::Http(e) if e.status() == 404));
    }

    #[test]
    fn test_serialized_exception_is_tagged() {
        let exception: Exception = PersistenceError::new("QueryFailedError", "boom").into();
        let value = serde_json::to_value(&exception).unwrap();
        assert_eq!(value["kind"], "persistence");
        assert_eq!(value["name"], "QueryFailedError");
        assert_eq!(value["message"], "boom");
    }
}
