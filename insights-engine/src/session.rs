//! Lifecycle of one remote query: submit, poll until a terminal status,
//! post-process rows, and stop the remote job on every exit path that did
//! not end in `Complete`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use insights_protocol::query::JobHandle;
use insights_protocol::results::{QueryStatistics, QueryStatus};
use tracing::{debug, info, warn};

use crate::error::InsightsError;
use crate::postprocess::post_process;
use crate::record::Record;
use crate::request::QueryRequest;
use crate::service::InsightsService;

/// Receives the accumulated partial records after every non-terminal poll.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, partial: &[Record]);

    /// Scan counters of the same poll, delivered just before `on_progress`.
    fn on_statistics(&self, _statistics: &QueryStatistics) {}
}

impl<F> ProgressCallback for F
where
    F: Fn(&[Record]) + Send + Sync,
{
    fn on_progress(&self, partial: &[Record]) {
        self(partial)
    }
}

/// Decides the outcome of a session that hit a fault.
///
/// Returning `None` yields an empty result. Either way the fault is
/// considered handled and does not reach the caller.
pub trait ErrorHandler: Send + Sync {
    fn on_error(&self, fault: InsightsError, partial: &[Record]) -> Option<Vec<Record>>;
}

impl<F> ErrorHandler for F
where
    F: Fn(InsightsError, &[Record]) -> Option<Vec<Record>> + Send + Sync,
{
    fn on_error(&self, fault: InsightsError, partial: &[Record]) -> Option<Vec<Record>> {
        self(fault, partial)
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Delay between consecutive polls. The first poll is immediate.
    pub poll_interval: Duration,
    /// Upper bound on the polling phase, measured from submission.
    pub deadline: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            deadline: None,
        }
    }
}

/// Runs queries against one logs service, one query per `run` call.
#[derive(Clone)]
pub struct QuerySession {
    service: Arc<dyn InsightsService>,
    config: SessionConfig,
}

#[derive(Default)]
struct PollState {
    last_status: Option<QueryStatus>,
    partial: Vec<Record>,
}

impl QuerySession {
    pub fn new(service: Arc<dyn InsightsService>) -> Self {
        Self {
            service,
            config: SessionConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Submits `request` and polls until it completes or faults.
    pub async fn run(
        &self,
        request: &QueryRequest,
        callback: Option<&dyn ProgressCallback>,
        handler: Option<&dyn ErrorHandler>,
    ) -> Result<Vec<Record>, InsightsError> {
        self.run_until(request, callback, handler, std::future::pending::<()>())
            .await
    }

    /// Like [`run`](Self::run), but stops waiting once `interrupt` resolves.
    ///
    /// An interrupt surfaces as [`InsightsError::Interrupted`] and goes through
    /// the error handler and the cancellation step like any other fault.
    pub async fn run_until<F>(
        &self,
        request: &QueryRequest,
        callback: Option<&dyn ProgressCallback>,
        handler: Option<&dyn ErrorHandler>,
        interrupt: F,
    ) -> Result<Vec<Record>, InsightsError>
    where
        F: Future<Output = ()>,
    {
        let handle = self.service.start_query(&request.to_start_input()).await?;
        info!(
            query_id = %handle,
            groups = ?request.scopes(),
            limit = request.limit(),
            start_time = request.start_time(),
            end_time = request.end_time(),
            "query submitted"
        );

        let mut guard = CancelGuard::new(self.service.clone(), handle.clone());
        let mut state = PollState::default();
        let keep_partial = callback.is_some() || handler.is_some();

        let outcome = tokio::select! {
            biased;
            result = self.poll_until_complete(
                &handle,
                request.infer_structure(),
                callback,
                keep_partial,
                &mut state,
            ) => result,
            _ = interrupt => Err(InsightsError::Interrupted),
            fault = deadline_elapsed(self.config.deadline) => Err(fault),
        };

        let result = match outcome {
            Ok(records) => Ok(records),
            Err(fault) => match handler {
                Some(handler) => {
                    warn!(
                        query_id = %handle,
                        error = %fault,
                        partial = state.partial.len(),
                        "query fault handed to error handler"
                    );
                    Ok(handler.on_error(fault, &state.partial).unwrap_or_default())
                }
                None => Err(fault),
            },
        };

        // The guard stays armed while the stop call is in flight.
        let cancelled = if state.last_status != Some(QueryStatus::Complete) {
            self.cancel(&handle).await
        } else {
            Ok(())
        };
        guard.disarm();
        cancelled?;

        result
    }

    async fn poll_until_complete(
        &self,
        handle: &JobHandle,
        infer_structure: bool,
        callback: Option<&dyn ProgressCallback>,
        keep_partial: bool,
        state: &mut PollState,
    ) -> Result<Vec<Record>, InsightsError> {
        let mut polls: u32 = 0;
        loop {
            if polls > 0 {
                if self.config.poll_interval.is_zero() {
                    tokio::task::yield_now().await;
                } else {
                    tokio::time::sleep(self.config.poll_interval).await;
                }
            }

            let snapshot = self.service.get_query_results(handle).await?;
            polls += 1;
            state.last_status = Some(snapshot.status.clone());
            debug!(
                query_id = %handle,
                poll = polls,
                status = %snapshot.status,
                rows = snapshot.results.len(),
                "polled query"
            );

            match snapshot.status {
                QueryStatus::Scheduled | QueryStatus::Running => {
                    if keep_partial {
                        state.partial = post_process(snapshot.results, infer_structure);
                    }
                    if let Some(callback) = callback {
                        if let Some(statistics) = &snapshot.statistics {
                            callback.on_statistics(statistics);
                        }
                        callback.on_progress(&state.partial);
                    }
                }
                QueryStatus::Complete => {
                    let records = post_process(snapshot.results, infer_structure);
                    info!(
                        query_id = %handle,
                        polls,
                        records = records.len(),
                        "query complete"
                    );
                    return Ok(records);
                }
                QueryStatus::Other(status) => {
                    return Err(InsightsError::RemoteStatus { status });
                }
            }
        }
    }

    async fn cancel(&self, handle: &JobHandle) -> Result<(), InsightsError> {
        match self.service.stop_query(handle).await {
            Ok(()) => {
                info!(query_id = %handle, "remote query stopped");
                Ok(())
            }
            Err(err) if err.is_not_found() => {
                debug!(query_id = %handle, "remote query already gone");
                Ok(())
            }
            Err(err) => {
                warn!(query_id = %handle, error = %err, "failed to stop remote query");
                Err(err)
            }
        }
    }
}

async fn deadline_elapsed(deadline: Option<Duration>) -> InsightsError {
    match deadline {
        Some(limit) => {
            tokio::time::sleep(limit).await;
            InsightsError::DeadlineExceeded(limit)
        }
        None => std::future::pending().await,
    }
}

/// Stops the remote query if the session future is dropped mid-flight.
struct CancelGuard {
    service: Arc<dyn InsightsService>,
    handle: Option<JobHandle>,
}

impl CancelGuard {
    fn new(service: Arc<dyn InsightsService>, handle: JobHandle) -> Self {
        Self {
            service,
            handle: Some(handle),
        }
    }

    fn disarm(&mut self) {
        self.handle = None;
    }
}

impl Drop for CancelGuard {
    fn drop(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!(query_id = %handle, "no runtime left to stop abandoned query");
            return;
        };

        let service = self.service.clone();
        runtime.spawn(async move {
            match service.stop_query(&handle).await {
                Ok(()) => info!(query_id = %handle, "abandoned query stopped"),
                Err(err) if err.is_not_found() => {}
                Err(err) => warn!(query_id = %handle, error = %err, "failed to stop abandoned query"),
            }
        });
    }
}
