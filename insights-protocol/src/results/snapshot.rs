use serde::{Deserialize, Serialize};

use super::QueryStatus;

/// One field/value pair of a result row. Values are always strings on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultField {
    pub field: String,
    pub value: String,
}

impl ResultField {
    pub fn new(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }
}

/// Ordered field/value pairs exactly as the service returns them.
pub type ResultRow = Vec<ResultField>;

/// Scan counters reported alongside each snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryStatistics {
    #[serde(default)]
    pub records_matched: f64,
    #[serde(default)]
    pub records_scanned: f64,
    #[serde(default)]
    pub bytes_scanned: f64,
}

/// Response of a `GetQueryResults` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSnapshot {
    pub status: QueryStatus,
    #[serde(default)]
    pub results: Vec<ResultRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statistics: Option<QueryStatistics>,
}

impl ResultSnapshot {
    pub fn new(status: impl Into<QueryStatus>, results: Vec<ResultRow>) -> Self {
        Self {
            status: status.into(),
            results,
            statistics: None,
        }
    }
}
