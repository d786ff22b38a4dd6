use crate::common::response::{ErrorEnvelope, Message};
use crate::config::FilterOptions;
use crate::error::{FilterError, Result};
use crate::exception::{ArgumentsHost, Exception, ExceptionFilter};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error, error_span, field};

/// `{ statusCode, message, error }` as carried by an exception
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExceptionDetails {
    status_code: Option<u16>,
    #[serde(default)]
    message: Option<Message>,
    error: Option<String>,
}

impl ExceptionDetails {
    /// Read the details from an HTTP exception payload
    ///
    /// Missing `statusCode` and `error` default to `status` and its reason
    /// phrase; a missing or `null` message is left empty for the catalog
    /// fallback. Anything other than an object is malformed.
    fn from_payload(payload: &Value, status: StatusCode) -> Result<Self> {
        if !payload.is_object() {
            return Err(FilterError::malformed(format!(
                "expected an object payload, got {payload}"
            )));
        }
        let mut details = Self::deserialize(payload)
            .map_err(|e| FilterError::malformed(e.to_string()))?;
        details.status_code.get_or_insert(status.as_u16());
        details
            .error
            .get_or_insert_with(|| status.canonical_reason().unwrap_or("Error").to_string());
        Ok(details)
    }
}

/// Global filter turning every exception into an [`ErrorEnvelope`]
///
/// Logs the request context, the exception and its stack, then answers with
/// the exception's status. If normalization fails the client still gets a
/// generic 500 envelope.
#[derive(Debug, Clone, Default)]
pub struct AllExceptionFilter {
    options: FilterOptions,
}

impl AllExceptionFilter {
    pub fn new(options: FilterOptions) -> Self {
        Self { options }
    }

    /// Filter configured from the process environment
    pub fn from_env() -> Result<Self> {
        FilterOptions::from_env().map(Self::new)
    }

    pub fn options(&self) -> &FilterOptions {
        &self.options
    }

    fn normalize(&self, exception: &Exception, host: &ArgumentsHost) -> Result<Response> {
        let (status, details) = match exception {
            Exception::Http(e) => {
                let status = StatusCode::from_u16(e.status())
                    .map_err(|_| FilterError::InvalidStatus(e.status()))?;
                (status, ExceptionDetails::from_payload(e.response(), status)?)
            }
            Exception::Persistence(e) => {
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let details = ExceptionDetails {
                    status_code: Some(status.as_u16()),
                    message: Some(e.message().into()),
                    error: Some(e.name().to_string()),
                };
                (status, details)
            }
        };

        let message = details.message.unwrap_or_default().or_generic();
        let stack = exception
            .stack()
            .map(str::to_string)
            .unwrap_or_else(|| message.to_text());

        let params = to_json("params", &host.params)?;
        let query = to_json("query", &host.query)?;
        let body = to_json("body", &host.body)?;
        let serialized = to_json("exception", exception)?;
        let stack_json = to_json("stack", &json!({ "stack": stack }))?;

        debug!(
            method = %host.method,
            url = %host.original_url,
            %params,
            %query,
            %body,
            "[DEBUG] [{}:- {}]",
            host.method,
            host.original_url,
        );
        error!(exception = %serialized, "ExceptionFilter [{}]", host.original_url);
        error!(stack = %stack_json, "ExceptionFilter-stack [{}]", host.original_url);

        let envelope = ErrorEnvelope::new(
            status,
            message,
            details.error.unwrap_or_default(),
            host.original_url.as_str(),
        )
        .status_code(details.status_code.unwrap_or(status.as_u16()))
        .stack(self.options.expose_stack().then_some(stack));

        Ok(envelope.into_response())
    }

    fn fallback(&self, host: &ArgumentsHost, failure: &FilterError) -> Response {
        error!(
            error = %failure,
            "ExceptionFilter processing error [{}]",
            host.original_url,
        );
        ErrorEnvelope::fallback(host.original_url.as_str()).into_response()
    }
}

impl ExceptionFilter for AllExceptionFilter {
    fn catch(&self, exception: Exception, host: &ArgumentsHost) -> Response {
        let span = error_span!("exception_filter", req_id = field::Empty);
        if let Some(request_id) = host.request_id(&self.options.request_id_header) {
            span.record("req_id", request_id);
        }
        let _entered = span.enter();

        match self.normalize(&exception, host) {
            Ok(response) => response,
            Err(failure) => self.fallback(host, &failure),
        }
    }
}

fn to_json<T: serde::Serialize + ?Sized>(what: &'static str, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| FilterError::serialization(what, e))
}
