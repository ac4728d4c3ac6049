use std::time::Duration;

use insights_core::ConfigError;
use thiserror::Error;

/// Service code the logs API uses when a query id is unknown or already reaped.
pub const NOT_FOUND_CODE: &str = "ResourceNotFoundException";

/// Errors raised while submitting, polling or cancelling a query.
#[derive(Debug, Error)]
pub enum InsightsError {
    #[error("logs service returned invalid status: {status:?}")]
    RemoteStatus { status: String },
    #[error("logs service fault {code}: {message}")]
    Service { code: String, message: String },
    #[error("logs HTTP request failed: {0}")]
    Http(String),
    #[error("logs service returned unexpected status {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("failed to encode logs request: {0}")]
    Encode(String),
    #[error("failed to decode logs response: {0}")]
    Decode(String),
    #[error("invalid logs endpoint url {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("invalid query request: {0}")]
    InvalidRequest(String),
    #[error("invalid time expression {input:?}: {reason}")]
    InvalidTime { input: String, reason: String },
    #[error("field {field:?} does not hold valid JSON: {source}")]
    FieldDecode {
        field: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("query interrupted before completion")]
    Interrupted,
    #[error("query did not complete within {0:?}")]
    DeadlineExceeded(Duration),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl InsightsError {
    pub fn service(code: impl Into<String>, message: impl Into<String>) -> Self {
        InsightsError::Service {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::service(NOT_FOUND_CODE, message)
    }

    /// True for the fault the service raises when the query no longer exists.
    pub fn is_not_found(&self) -> bool {
        matches!(self, InsightsError::Service { code, .. } if code == NOT_FOUND_CODE)
    }
}
