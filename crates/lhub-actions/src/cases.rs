//! Case search and bulk closing

use crate::error::{ActionError, Result};
use crate::rows::Row;
use futures::future::join_all;
use lhub_client::LogicHubApi;
use serde_json::Value;
use tracing::{info, warn};

/// Columns shown for case search results, in order
pub const CASE_HEADERS: [&str; 9] = [
    "id",
    "status",
    "priority",
    "issueType",
    "reporter",
    "assignee",
    "title",
    "createdAt",
    "modifiedAt",
];

/// Status set by [`close_cases`] when no resolution is given
pub const DEFAULT_RESOLUTION: &str = "Resolved";

/// Outcome of closing one case
#[derive(Debug)]
pub struct CloseResult {
    /// Case id
    pub case_id: String,
    /// Update result
    pub result: Result<()>,
}

/// Run an advanced case search
pub async fn search_cases(
    api: &dyn LogicHubApi,
    query: &str,
    limit: Option<usize>,
) -> Result<Vec<Row>> {
    let query = query.split_whitespace().collect::<Vec<_>>().join(" ");
    if query.is_empty() {
        return Err(ActionError::InvalidInput("Case query cannot be blank".into()));
    }

    let cases = api.search_cases(&query, limit).await?;
    info!(hostname = %api.hostname(), results = cases.len(), "Query complete");
    Ok(cases)
}

/// Ids of case rows, as strings
pub fn case_ids(rows: &[Row]) -> Vec<String> {
    rows.iter()
        .filter_map(|r| match r.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        })
        .collect()
}

/// Set the status of every case concurrently.
///
/// One failed update does not stop the others; results come back in input
/// order.
pub async fn close_cases(
    api: &dyn LogicHubApi,
    case_ids: &[String],
    resolution: Option<&str>,
) -> Vec<CloseResult> {
    let status = resolution
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_RESOLUTION);

    let updates = case_ids.iter().map(|case_id| async move {
        warn!(case_id = %case_id, status = %status, "Closing case");
        let result = api
            .update_case_status(case_id, status)
            .await
            .map_err(ActionError::from);
        CloseResult {
            case_id: case_id.clone(),
            result,
        }
    });
    join_all(updates).await
}
