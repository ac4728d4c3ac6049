use async_trait::async_trait;
use insights_protocol::query::{JobHandle, StartQueryInput};
use insights_protocol::results::ResultSnapshot;

use crate::error::InsightsError;

/// The three remote operations a query session drives.
#[async_trait]
pub trait InsightsService: Send + Sync + 'static {
    /// Submits a query and returns the handle used for every later call.
    async fn start_query(&self, input: &StartQueryInput) -> Result<JobHandle, InsightsError>;

    /// Fetches the current status and rows of a query.
    async fn get_query_results(&self, handle: &JobHandle)
        -> Result<ResultSnapshot, InsightsError>;

    /// Asks the service to stop a query. Unknown handles yield a not-found fault.
    async fn stop_query(&self, handle: &JobHandle) -> Result<(), InsightsError>;
}
