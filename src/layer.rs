use crate::config::{DEFAULT_BODY_LIMIT, FilterOptions};
use crate::exception::{AllExceptionFilter, ArgumentsHost, Exception, ExceptionFilter, HttpException};
use axum::{
    body::{Body, Bytes, HttpBody},
    http::{Request, header::ALLOW},
    response::Response,
};
use http_body_util::LengthLimitError;
use std::convert::Infallible;
use std::error::Error;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};
use tracing::warn;

/// Tower Layer registering an exception filter for every route of a router
///
/// Install it with `Router::layer` so path params are already matched. Any
/// [`Exception`] a handler returns is handed to the filter together with the
/// request context captured before the handler ran. Other 4xx/5xx responses,
/// such as extractor rejections or the router's 404 and 405, are wrapped into
/// an [`HttpException`] first so clients always get the same JSON body.
///
/// # Example
/// ```
/// use axum::{Router, routing::get};
/// use catchwall::exception::HttpException;
/// use catchwall::layer::ExceptionFilterLayer;
///
/// async fn secret() -> Result<&'static str, HttpException> {
///     Err(HttpException::access_denied())
/// }
///
/// let app: Router = Router::new()
///     .route("/secret", get(secret))
///     .layer(ExceptionFilterLayer::default());
/// ```
pub struct ExceptionFilterLayer<F = AllExceptionFilter> {
    filter: Arc<F>,
    body_limit: usize,
}

impl<F> Clone for ExceptionFilterLayer<F> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            body_limit: self.body_limit,
        }
    }
}

impl<F: ExceptionFilter> ExceptionFilterLayer<F> {
    pub fn new(filter: F) -> Self {
        Self {
            filter: Arc::new(filter),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Largest request body buffered for the filter's diagnostics
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}

impl ExceptionFilterLayer<AllExceptionFilter> {
    pub fn from_options(options: FilterOptions) -> Self {
        let body_limit = options.body_limit;
        Self::new(AllExceptionFilter::new(options)).body_limit(body_limit)
    }
}

impl From<AllExceptionFilter> for ExceptionFilterLayer<AllExceptionFilter> {
    fn from(filter: AllExceptionFilter) -> Self {
        let body_limit = filter.options().body_limit;
        Self::new(filter).body_limit(body_limit)
    }
}

impl Default for ExceptionFilterLayer<AllExceptionFilter> {
    fn default() -> Self {
        Self::from_options(FilterOptions::default())
    }
}

impl<S, F> Layer<S> for ExceptionFilterLayer<F> {
    type Service = ExceptionFilterMiddleware<S, F>;

    fn layer(&self, inner: S) -> Self::Service {
        ExceptionFilterMiddleware {
            inner,
            filter: self.filter.clone(),
            body_limit: self.body_limit,
        }
    }
}

pub struct ExceptionFilterMiddleware<S, F> {
    inner: S,
    filter: Arc<F>,
    body_limit: usize,
}

impl<S: Clone, F> Clone for ExceptionFilterMiddleware<S, F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            filter: self.filter.clone(),
            body_limit: self.body_limit,
        }
    }
}

impl<S, F> Service<Request<Body>> for ExceptionFilterMiddleware<S, F>
where
    S: Service<Request<Body>, Response = Response, Error = Infallible> + Clone + Send + 'static,
    S::Future: Send + 'static,
    F: ExceptionFilter,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request<Body>) -> Self::Future {
        let filter = self.filter.clone();
        let body_limit = self.body_limit;

        // Take the service that was driven to readiness, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let (mut parts, body) = request.into_parts();

            // Only bodies of known size within the limit are buffered; others
            // reach the handler untouched and are logged as `null`.
            let buffered = matches!(
                body.size_hint().exact(),
                Some(len) if len <= body_limit as u64
            );
            let (body, bytes) = if buffered {
                match axum::body::to_bytes(body, body_limit).await {
                    Ok(bytes) => (Body::from(bytes.clone()), bytes),
                    Err(err) => {
                        warn!(error = %err, limit = body_limit, "Failed to buffer request body");
                        let host =
                            ArgumentsHost::from_request_parts(&mut parts, &Bytes::new()).await;
                        let exception = if find_cause::<LengthLimitError>(&err).is_some() {
                            HttpException::payload_too_large(format!(
                                "Request body exceeds {body_limit} bytes"
                            ))
                        } else {
                            HttpException::bad_request("Failed to read request body")
                        };
                        return Ok(filter.catch(exception.into(), &host));
                    }
                }
            } else {
                (body, Bytes::new())
            };

            let host = ArgumentsHost::from_request_parts(&mut parts, &bytes).await;

            let request = Request::from_parts(parts, body);
            let mut response = inner.call(request).await?;

            if let Some(exception) = response.extensions_mut().remove::<Exception>() {
                return Ok(filter.catch(exception, &host));
            }

            let status = response.status();
            if !(status.is_client_error() || status.is_server_error()) {
                return Ok(response);
            }

            // Rejections from extractors and the router (404, 405) carry a plain
            // text body; it becomes the exception message.
            let allow = response.headers().get(ALLOW).cloned();
            let message = match axum::body::to_bytes(response.into_body(), body_limit).await {
                Ok(text) => String::from_utf8_lossy(&text).trim().to_string(),
                Err(err) => {
                    warn!(error = %err, "Failed to read error response body");
                    String::new()
                }
            };
            let message = if message.is_empty() {
                status.canonical_reason().unwrap_or("Error").to_string()
            } else {
                message
            };

            let mut response = filter.catch(HttpException::new(status, message).into(), &host);
            if let Some(allow) = allow {
                response.headers_mut().insert(ALLOW, allow);
            }
            Ok(response)
        })
    }
}

/// Walk the source chain looking for an error of type `T`
fn find_cause<'a, T: Error + 'static>(err: &'a (dyn Error + 'static)) -> Option<&'a T> {
    let mut source = Some(err);
    while let Some(err) = source {
        if let Some(cause) = err.downcast_ref::<T>() {
            return Some(cause);
        }
        source = err.source();
    }
    None
}
