use std::io;

use insights_core::{ConfigError, CoreError};
use insights_engine::InsightsError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("failed to read {path}: {source}")]
    ReadInput {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid option document: {0}")]
    OptionDocument(#[from] serde_yaml::Error),
    #[error("{0}")]
    Usage(String),
    #[error(transparent)]
    Insights(#[from] InsightsError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to write results: {0}")]
    Output(#[from] io::Error),
}
