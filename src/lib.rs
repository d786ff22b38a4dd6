//! # Catchwall
//!
//! A global exception filter and error catalog for axum services.
//!
//! Handlers return [`Exception`]s (or anything converting into one), and the
//! [`ExceptionFilterLayer`] turns each of them into one uniform JSON body:
//!
//! ```json
//! {
//!   "statusCode": 403,
//!   "success": false,
//!   "message": "Forbidden",
//!   "error": "Forbidden",
//!   "path": "/x",
//!   "timestamp": "2024-01-01T00:00:00.000Z"
//! }
//! ```
//!
//! A `stack` field is added when the configured environment is the stack
//! environment (`development` by default).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use catchwall::prelude::*;
//! use axum::routing::get;
//!
//! async fn find_user(Path(id): Path<u32>) -> Result<Json<String>, Exception> {
//!     if id == 0 {
//!         return Err(HttpException::access_denied().into());
//!     }
//!     Err(PersistenceError::query_failed("duplicate key").into())
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let filter = AllExceptionFilter::from_env().expect("invalid filter configuration");
//!
//!     let app: Router = Router::new()
//!         .route("/users/{id}", get(find_user))
//!         .layer(ExceptionFilterLayer::from(filter));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```

pub mod catalog;
pub mod common;
pub mod config;
pub mod error;
pub mod exception;
pub mod layer;

// Re-export core types
pub use catalog::{ErrorCode, ErrorEntry};
pub use common::{ErrorEnvelope, Message};
pub use config::{ConfigService, FilterOptions};
pub use error::{FilterError, Result};
pub use exception::{
    AllExceptionFilter, ArgumentsHost, Exception, ExceptionFilter, HttpException,
    PersistenceError,
};
pub use layer::ExceptionFilterLayer;

// Re-export commonly used types from dependencies
pub use axum;

/// Prelude module for convenient imports
///
/// ```
/// use catchwall::prelude::*;
/// ```
pub mod prelude {
    pub use crate::catalog::{ErrorCode, ErrorEntry};
    pub use crate::common::{ErrorEnvelope, Message};
    pub use crate::config::{ConfigService, FilterOptions};
    pub use crate::error::{FilterError, Result};
    pub use crate::exception::{
        AllExceptionFilter, ArgumentsHost, Exception, ExceptionFilter, HttpException,
        PersistenceError,
    };
    pub use crate::layer::ExceptionFilterLayer;
    pub use axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode,
        response::{IntoResponse, Response},
    };
    pub use std::sync::Arc;
}
