//! Insights engine - query session state machine, result post-processing
//! and the logs service client.

pub mod client;
pub mod error;
pub mod postprocess;
pub mod record;
pub mod request;
pub mod service;
pub mod session;
pub mod time;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use client::HttpInsightsClient;
pub use error::InsightsError;
pub use postprocess::{infer_structured_values, parse_named_fields, post_process, rows_to_records};
pub use record::Record;
pub use request::{QueryRequest, QueryRequestBuilder, DEFAULT_LIMIT, MAX_LIMIT};
pub use service::InsightsService;
pub use session::{ErrorHandler, ProgressCallback, QuerySession, SessionConfig};
pub use time::TimeSpec;
