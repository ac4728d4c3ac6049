use thiserror::Error;

/// Result type used across the insights core crate.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Canonical error representation shared by all crates.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("logging setup failed: {0}")]
    Logging(String),
}

/// Dedicated configuration error used by the configuration module.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} is set but {missing} is not")]
    IncompleteCredentials { key: String, missing: String },

    #[error("no endpoint configured: set a region or an explicit endpoint")]
    NoEndpoint,
}
