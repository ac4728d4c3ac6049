use serde::{Deserialize, Serialize};

use super::JobHandle;

/// Body of a `StartQuery` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQueryInput {
    pub log_group_names: Vec<String>,
    pub start_time: i64,
    pub end_time: i64,
    pub query_string: String,
    pub limit: u32,
}

/// Response of a `StartQuery` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartQueryOutput {
    pub query_id: JobHandle,
}

/// Body shared by `GetQueryResults` and `StopQuery`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryIdInput {
    pub query_id: JobHandle,
}

/// Response of a `StopQuery` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StopQueryOutput {
    #[serde(default)]
    pub success: bool,
}
