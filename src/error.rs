use thiserror::Error;

pub type Result<T, E = FilterError> = std::result::Result<T, E>;

/// Failures raised while normalizing an exception or loading filter options.
///
/// These never reach the client as-is: the filter logs them and answers with
/// the generic fallback envelope instead.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Unsupported HTTP status code: {0}")]
    InvalidStatus(u16),

    #[error("Malformed exception response: {reason}")]
    MalformedResponse { reason: String },

    #[error("Failed to serialize {what}: {source}")]
    Serialization {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration for {key}: {message}")]
    InvalidConfig { key: String, message: String },
}

impl FilterError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedResponse {
            reason: reason.into(),
        }
    }

    pub fn serialization(what: &'static str, source: serde_json::Error) -> Self {
        Self::Serialization { what, source }
    }

    pub fn invalid_config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            key: key.into(),
            message: message.into(),
        }
    }
}
