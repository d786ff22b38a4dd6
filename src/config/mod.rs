use crate::error::{FilterError, Result};
use axum::http::HeaderName;
use dashmap::DashMap;
use std::env;
use std::sync::Arc;

pub const APP_ENV: &str = "APP_ENV";
pub const STACK_ENV: &str = "EXCEPTION_FILTER_STACK_ENV";
pub const REQUEST_ID_HEADER: &str = "EXCEPTION_FILTER_REQUEST_ID_HEADER";
pub const BODY_LIMIT: &str = "EXCEPTION_FILTER_BODY_LIMIT";

const DEFAULT_ENVIRONMENT: &str = "production";
const DEFAULT_STACK_ENVIRONMENT: &str = "development";
const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";
/// Same as axum's `DefaultBodyLimit`
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Snapshot of the process environment
    pub fn new() -> Self {
        let service = Self::default();
        for (key, value) in env::vars() {
            service.set(&key, &value);
        }
        service
    }

    /// An empty service, for tests and explicit setups
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }
}

/// Options controlling what the exception filter exposes and logs
#[derive(Debug, Clone)]
pub struct FilterOptions {
    /// Current environment name (`APP_ENV`)
    pub environment: String,
    /// Environment in which stacks are added to response bodies
    pub stack_environment: String,
    /// Header carrying the correlation id used to tag log lines
    pub request_id_header: HeaderName,
    /// Max request body bytes buffered for diagnostics; larger bodies are
    /// passed through unread
    pub body_limit: usize,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            environment: DEFAULT_ENVIRONMENT.to_string(),
            stack_environment: DEFAULT_STACK_ENVIRONMENT.to_string(),
            request_id_header: HeaderName::from_static(DEFAULT_REQUEST_ID_HEADER),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl FilterOptions {
    pub fn from_config(config: &ConfigService) -> Result<Self> {
        let request_id_header = match config.get(REQUEST_ID_HEADER) {
            Some(name) => HeaderName::from_bytes(name.trim().as_bytes())
                .map_err(|e| FilterError::invalid_config(REQUEST_ID_HEADER, e.to_string()))?,
            None => HeaderName::from_static(DEFAULT_REQUEST_ID_HEADER),
        };

        let body_limit = match config.get(BODY_LIMIT) {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|e| FilterError::invalid_config(BODY_LIMIT, e.to_string()))?,
            None => DEFAULT_BODY_LIMIT,
        };

        Ok(Self {
            environment: config.get_or(APP_ENV, DEFAULT_ENVIRONMENT),
            stack_environment: config.get_or(STACK_ENV, DEFAULT_STACK_ENVIRONMENT),
            request_id_header,
            body_limit,
        })
    }

    /// Options read from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_config(&ConfigService::new())
    }

    /// Set the current environment name
    pub fn environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }

    /// Whether stacks are included in response bodies
    pub fn expose_stack(&self) -> bool {
        self.environment == self.stack_environment
    }
}
