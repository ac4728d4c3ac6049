use chrono::{DateTime, Utc};
use insights_protocol::query::StartQueryInput;
use tracing::warn;

use crate::error::InsightsError;
use crate::time::TimeSpec;

/// Result cap applied when the caller does not choose one.
pub const DEFAULT_LIMIT: u32 = 100;
/// Largest result cap the logs service accepts.
pub const MAX_LIMIT: u32 = 10_000;

/// A validated, immutable query ready for submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    query: String,
    limit: u32,
    scopes: Vec<String>,
    start_time: i64,
    end_time: i64,
    infer_structure: bool,
}

impl QueryRequest {
    pub fn builder(query: impl Into<String>) -> QueryRequestBuilder {
        QueryRequestBuilder {
            query: query.into(),
            limit: DEFAULT_LIMIT,
            scopes: Vec::new(),
            start: TimeSpec::days_ago(1),
            end: None,
            infer_structure: true,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn end_time(&self) -> i64 {
        self.end_time
    }

    pub fn infer_structure(&self) -> bool {
        self.infer_structure
    }

    pub fn to_start_input(&self) -> StartQueryInput {
        StartQueryInput {
            log_group_names: self.scopes.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
            query_string: self.query.clone(),
            limit: self.limit,
        }
    }
}

pub struct QueryRequestBuilder {
    query: String,
    limit: u32,
    scopes: Vec<String>,
    start: TimeSpec,
    end: Option<TimeSpec>,
    infer_structure: bool,
}

impl QueryRequestBuilder {
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.scopes.push(scope.into());
        self
    }

    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes.extend(scopes.into_iter().map(Into::into));
        self
    }

    pub fn start(mut self, start: impl Into<TimeSpec>) -> Self {
        self.start = start.into();
        self
    }

    /// Leaving the end unset means "now" at build time.
    pub fn end(mut self, end: impl Into<TimeSpec>) -> Self {
        self.end = Some(end.into());
        self
    }

    pub fn infer_structure(mut self, enabled: bool) -> Self {
        self.infer_structure = enabled;
        self
    }

    /// Validates the request and normalises both times against `now`.
    pub fn build(self, now: DateTime<Utc>) -> Result<QueryRequest, InsightsError> {
        if self.query.trim().is_empty() {
            return Err(InsightsError::InvalidRequest("query text is empty".into()));
        }
        if self.scopes.is_empty() || self.scopes.iter().any(|scope| scope.trim().is_empty()) {
            return Err(InsightsError::InvalidRequest(
                "at least one non-empty log group is required".into(),
            ));
        }
        if self.limit == 0 || self.limit > MAX_LIMIT {
            return Err(InsightsError::InvalidRequest(format!(
                "result limit must be between 1 and {}, got {}",
                MAX_LIMIT, self.limit
            )));
        }

        let start_time = self.start.normalize(now)?;
        let end_time = self.end.unwrap_or_else(TimeSpec::now).normalize(now)?;
        if start_time > end_time {
            warn!(start_time, end_time, "query start is after its end");
        }

        Ok(QueryRequest {
            query: self.query,
            limit: self.limit,
            scopes: self.scopes,
            start_time,
            end_time,
            infer_structure: self.infer_structure,
        })
    }

    pub fn build_now(self) -> Result<QueryRequest, InsightsError> {
        self.build(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn end_defaults_to_now() {
        let request = QueryRequest::builder("fields @message")
            .scope("/aws/lambda/a")
            .start(Duration::hours(-1))
            .build(now())
            .unwrap();
        assert_eq!(request.end_time(), now().timestamp());
        assert_eq!(request.start_time(), now().timestamp() - 3_600);
        assert_eq!(request.limit(), DEFAULT_LIMIT);
        assert!(request.infer_structure());
    }

    #[test]
    fn converts_to_service_input() {
        let request = QueryRequest::builder("fields @message")
            .scopes(["/aws/lambda/a", "/aws/lambda/b"])
            .limit(139)
            .start(10_i64)
            .end(20_i64)
            .build(now())
            .unwrap();
        let input = request.to_start_input();
        assert_eq!(input.log_group_names, vec!["/aws/lambda/a", "/aws/lambda/b"]);
        assert_eq!((input.start_time, input.end_time), (10, 20));
        assert_eq!(input.limit, 139);
        assert_eq!(input.query_string, "fields @message");
    }

    #[test]
    fn rejects_missing_scopes() {
        let err = QueryRequest::builder("fields @message")
            .build(now())
            .unwrap_err();
        assert!(matches!(err, InsightsError::InvalidRequest(_)));
    }

    #[test]
    fn rejects_blank_query_and_bad_limits() {
        assert!(QueryRequest::builder("   ").scope("g").build(now()).is_err());
        assert!(QueryRequest::builder("q").scope("g").limit(0).build(now()).is_err());
        assert!(QueryRequest::builder("q")
            .scope("g")
            .limit(MAX_LIMIT + 1)
            .build(now())
            .is_err());
    }

    #[test]
    fn tolerates_start_after_end() {
        let request = QueryRequest::builder("q")
            .scope("g")
            .start(200_i64)
            .end(100_i64)
            .build(now())
            .unwrap();
        assert_eq!((request.start_time(), request.end_time()), (200, 100));
    }

    #[test]
    fn out_of_range_offsets_fail_the_build() {
        let err = QueryRequest::builder("q")
            .scope("g")
            .start(Duration::days(-365 * 1_000_000))
            .build(now())
            .unwrap_err();
        assert!(matches!(err, InsightsError::InvalidTime { .. }));
    }
}
