//! Insights: run CloudWatch Logs Insights queries from Rust.
//!
//! A query is submitted once, polled until the service reports a terminal
//! status, and its rows are turned into ordered JSON records. Partial rows
//! are handed to an optional progress callback while the query runs, and
//! any remote job left behind by a failure or interruption is stopped.
//!
//! # Crates
//!
//! * `insights-core`: configuration, error types, logging setup and JSON helpers
//! * `insights-protocol`: wire types for the logs service
//! * `insights-engine`: the query session, post-processing and the HTTP client
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use insights::{ClientConfig, HttpInsightsClient, QueryRequest, QuerySession};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let client = HttpInsightsClient::new(&ClientConfig::from_env()?)?;
//! let request = QueryRequest::builder("fields @timestamp, @message | limit 20")
//!     .scope("/aws/lambda/checkout")
//!     .start("-2h".parse::<insights::TimeSpec>()?)
//!     .build_now()?;
//!
//! let records = QuerySession::new(Arc::new(client))
//!     .run(&request, None, None)
//!     .await?;
//! println!("{} records", records.len());
//! # Ok(())
//! # }
//! ```

pub use insights_core::{ClientConfig, ConfigError, CoreError, Credentials};
pub use insights_engine::{
    infer_structured_values, parse_named_fields, post_process, rows_to_records, ErrorHandler,
    HttpInsightsClient, InsightsError, InsightsService, ProgressCallback, QueryRequest,
    QueryRequestBuilder, QuerySession, Record, SessionConfig, TimeSpec, DEFAULT_LIMIT, MAX_LIMIT,
};
pub use insights_protocol::query::{JobHandle, StartQueryInput};
pub use insights_protocol::results::{
    QueryStatistics, QueryStatus, ResultField, ResultRow, ResultSnapshot,
};

/// Version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
