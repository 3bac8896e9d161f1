//! Fan-out over many instances.
//!
//! Records are resolved up front (sequentially, by the connection facade);
//! only the remote calls run concurrently. Every instance gets its own
//! result and one failure never cancels the others.

use crate::error::{ActionError, Result};
use crate::rows::{Row, SortKey};
use crate::users::delete_user_by_name;
use futures::future::join_all;
use lhub_client::LogicHubApi;
use lhub_core::CredentialRecord;
use serde_json::Value;
use std::future::Future;
use tracing::{error, info};

/// An open session labeled with its profile name
pub struct NamedSession {
    /// Profile name
    pub name: String,
    /// Session
    pub api: Box<dyn LogicHubApi>,
}

impl NamedSession {
    /// Label a session
    pub fn new(name: impl Into<String>, api: Box<dyn LogicHubApi>) -> Self {
        Self {
            name: name.into(),
            api,
        }
    }
}

impl std::fmt::Debug for NamedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamedSession")
            .field("name", &self.name)
            .field("hostname", &self.api.hostname())
            .finish()
    }
}

/// Sort order for bulk delete results: successes first, then by user and instance
pub fn deletion_sort() -> Vec<SortKey> {
    vec![
        SortKey::desc("result"),
        SortKey::asc("user"),
        SortKey::asc("instance"),
    ]
}

/// Open one session per record concurrently.
///
/// Returns `(profile name, result)` in record order.
pub async fn connect_all<S, E, F, Fut>(
    records: &[CredentialRecord],
    connector: F,
) -> Vec<(String, Result<S>)>
where
    F: Fn(&CredentialRecord) -> Fut,
    Fut: Future<Output = std::result::Result<S, E>>,
    E: Into<ActionError>,
{
    let attempts = records.iter().map(|record| {
        let pending = connector(record);
        async move {
            let result = pending.await.map_err(Into::into);
            match &result {
                Ok(_) => info!(instance = %record.name, hostname = %record.hostname, "Connected"),
                Err(e) => error!(instance = %record.name, error = %e, "Connection failed"),
            }
            (record.name.clone(), result)
        }
    });
    join_all(attempts).await
}

/// Delete `username` from every session concurrently.
///
/// Each row has `user`, `instance` and `result` (`successful`, `not found`,
/// or `failed: <reason>`).
pub async fn delete_user_everywhere(sessions: &[NamedSession], username: &str) -> Vec<Row> {
    let deletes = sessions.iter().map(|session| async move {
        info!(user = %username, instance = %session.name, "Deleting user");
        let result = match delete_user_by_name(session.api.as_ref(), username).await {
            Ok(outcome) => outcome.as_str().to_string(),
            Err(e) => {
                error!(user = %username, instance = %session.name, error = %e, "Delete failed");
                format!("failed: {}", e)
            }
        };

        let mut row = Row::new();
        row.insert("user".into(), Value::from(username));
        row.insert("instance".into(), Value::from(session.name.clone()));
        row.insert("result".into(), Value::from(result));
        row
    });
    join_all(deletes).await
}
