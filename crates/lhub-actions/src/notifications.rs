//! Notification preferences of the logged-in user

use crate::error::Result;
use crate::rows::Row;
use lhub_client::LogicHubApi;
use serde_json::{Map, Value};
use tracing::info;

/// Notification preferences known to exist as of release m94.10
pub const NOTIFICATION_PREFERENCES: [&str; 8] = [
    "assigneePreference",
    "reporterPreference",
    "myGroupIsAssigneePreference",
    "commentCommandAddedPreference",
    "defaultFieldsUpdatedPreference",
    "taskCreatedInTheCasePreferences",
    "updatesInAdditionalFieldsPreference",
    "myMentionInCommentPreference",
];

/// Columns of the rows returned by [`disable_notifications`]
pub const PREFERENCE_HEADERS: [&str; 3] = ["kind", "label", "value"];

/// Turn off every notification preference for the logged-in user.
///
/// Other preferences are left alone. Returns one row per preference as
/// the server reports it after the change.
pub async fn disable_notifications(api: &dyn LogicHubApi) -> Result<Vec<Row>> {
    let changes: Map<String, Value> = NOTIFICATION_PREFERENCES
        .iter()
        .map(|key| (key.to_string(), Value::Bool(false)))
        .collect();

    let preferences = api.update_current_user_preferences(&changes).await?;
    info!(
        hostname = %api.hostname(),
        disabled = changes.len(),
        "Notification preferences updated"
    );

    Ok(preferences
        .into_iter()
        .map(|p| {
            let mut row = Row::new();
            row.insert("kind".into(), Value::from(p.kind));
            row.insert("label".into(), Value::from(p.label));
            row.insert("value".into(), p.value);
            row
        })
        .collect())
}
