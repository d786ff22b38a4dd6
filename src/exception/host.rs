use axum::{
    body::Bytes,
    extract::{FromRequestParts, Query, RawPathParams},
    http::{HeaderMap, HeaderName, HeaderValue, Method, Uri, request::Parts},
};
use serde_json::Value;
use std::collections::BTreeMap;

/// Request context handed to exception filters
///
/// Captured before the handler runs, so it reflects the request as the client
/// sent it.
#[derive(Debug, Clone, Default)]
pub struct ArgumentsHost {
    pub method: Method,
    /// Path and query as received
    pub original_url: String,
    pub query: BTreeMap<String, String>,
    pub headers: HeaderMap,
    /// Path params matched by the router
    pub params: BTreeMap<String, String>,
    /// Parsed JSON body; raw text when not JSON, `null` when empty
    pub body: Value,
}

impl ArgumentsHost {
    pub fn new(method: Method, original_url: impl Into<String>) -> Self {
        let original_url = original_url.into();
        let query = original_url
            .parse::<Uri>()
            .ok()
            .and_then(|uri| Query::<BTreeMap<String, String>>::try_from_uri(&uri).ok())
            .map(|Query(query)| query)
            .unwrap_or_default();
        Self {
            method,
            original_url,
            query,
            ..Default::default()
        }
    }

    /// Capture the context of an incoming request
    pub async fn from_request_parts(parts: &mut Parts, body: &Bytes) -> Self {
        let original_url = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| parts.uri.path().to_string());

        let query = Query::<BTreeMap<String, String>>::try_from_uri(&parts.uri)
            .map(|Query(query)| query)
            .unwrap_or_default();

        let params = match RawPathParams::from_request_parts(parts, &()).await {
            Ok(raw) => raw
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            Err(_) => BTreeMap::new(),
        };

        Self {
            method: parts.method.clone(),
            original_url,
            query,
            headers: parts.headers.clone(),
            params,
            body: parse_body(body),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Correlation id carried in `header`, if any
    pub fn request_id(&self, header: &HeaderName) -> Option<&str> {
        self.headers
            .get(header)
            .and_then(|value| value.to_str().ok())
            .filter(|id| !id.is_empty())
    }
}

fn parse_body(body: &Bytes) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}
