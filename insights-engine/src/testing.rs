//! Scripted in-memory logs service for session tests.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use insights_protocol::query::{JobHandle, StartQueryInput};
use insights_protocol::results::{QueryStatus, ResultField, ResultRow, ResultSnapshot};
use parking_lot::Mutex;

use crate::error::InsightsError;
use crate::service::InsightsService;

/// One remote call observed by [`ScriptedService`].
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceCall {
    Start(StartQueryInput),
    Poll(JobHandle),
    Stop(JobHandle),
}

/// Replays a fixed sequence of poll responses and records every call.
///
/// Once the script runs out, polls keep answering `Running` with no rows.
pub struct ScriptedService {
    handle: JobHandle,
    submit_fault: Mutex<Option<InsightsError>>,
    polls: Mutex<VecDeque<Result<ResultSnapshot, InsightsError>>>,
    stop_fault: Mutex<Option<InsightsError>>,
    stop_delay: Duration,
    calls: Mutex<Vec<ServiceCall>>,
}

impl ScriptedService {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: JobHandle::new(handle),
            submit_fault: Mutex::new(None),
            polls: Mutex::new(VecDeque::new()),
            stop_fault: Mutex::new(None),
            stop_delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn then_poll(mut self, snapshot: ResultSnapshot) -> Self {
        self.polls.get_mut().push_back(Ok(snapshot));
        self
    }

    pub fn then_poll_fault(mut self, fault: InsightsError) -> Self {
        self.polls.get_mut().push_back(Err(fault));
        self
    }

    pub fn failing_submit(mut self, fault: InsightsError) -> Self {
        *self.submit_fault.get_mut() = Some(fault);
        self
    }

    pub fn failing_stop(mut self, fault: InsightsError) -> Self {
        *self.stop_fault.get_mut() = Some(fault);
        self
    }

    /// Stop calls take `delay` and are only recorded once they finish.
    pub fn slow_stop(mut self, delay: Duration) -> Self {
        self.stop_delay = delay;
        self
    }

    pub fn calls(&self) -> Vec<ServiceCall> {
        self.calls.lock().clone()
    }

    pub fn poll_count(&self) -> usize {
        self.count(|call| matches!(call, ServiceCall::Poll(_)))
    }

    pub fn stop_count(&self) -> usize {
        self.count(|call| matches!(call, ServiceCall::Stop(_)))
    }

    fn count(&self, predicate: impl Fn(&ServiceCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }
}

#[async_trait]
impl InsightsService for ScriptedService {
    async fn start_query(&self, input: &StartQueryInput) -> Result<JobHandle, InsightsError> {
        self.calls.lock().push(ServiceCall::Start(input.clone()));
        match self.submit_fault.lock().take() {
            Some(fault) => Err(fault),
            None => Ok(self.handle.clone()),
        }
    }

    async fn get_query_results(
        &self,
        handle: &JobHandle,
    ) -> Result<ResultSnapshot, InsightsError> {
        self.calls.lock().push(ServiceCall::Poll(handle.clone()));
        self.polls
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(ResultSnapshot::new(QueryStatus::Running, Vec::new())))
    }

    async fn stop_query(&self, handle: &JobHandle) -> Result<(), InsightsError> {
        if !self.stop_delay.is_zero() {
            tokio::time::sleep(self.stop_delay).await;
        }
        self.calls.lock().push(ServiceCall::Stop(handle.clone()));
        match self.stop_fault.lock().take() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}

/// Builds a wire row from field/value pairs.
pub fn row(pairs: &[(&str, &str)]) -> ResultRow {
    pairs
        .iter()
        .map(|(field, value)| ResultField::new(*field, *value))
        .collect()
}
