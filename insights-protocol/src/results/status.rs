use std::fmt;

use serde::{Deserialize, Serialize};

/// Status tag carried by every poll response.
///
/// `Other` keeps the raw string so unknown or failure states can be reported
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueryStatus {
    Scheduled,
    Running,
    Complete,
    Other(String),
}

impl QueryStatus {
    pub fn as_str(&self) -> &str {
        match self {
            QueryStatus::Scheduled => "Scheduled",
            QueryStatus::Running => "Running",
            QueryStatus::Complete => "Complete",
            QueryStatus::Other(raw) => raw,
        }
    }
}

impl From<String> for QueryStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Scheduled" => QueryStatus::Scheduled,
            "Running" => QueryStatus::Running,
            "Complete" => QueryStatus::Complete,
            _ => QueryStatus::Other(value),
        }
    }
}

impl From<&str> for QueryStatus {
    fn from(value: &str) -> Self {
        QueryStatus::from(value.to_string())
    }
}

impl From<QueryStatus> for String {
    fn from(value: QueryStatus) -> Self {
        match value {
            QueryStatus::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for QueryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
