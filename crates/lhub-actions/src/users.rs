//! User listing and management

use crate::error::{ActionError, Result};
use crate::rows::{shape_row, sort_keys_or, sort_rows, stock_columns, ListOptions, Row};
use lhub_client::{LogicHubApi, NewUser, User};
use serde_json::Value;
use tracing::{debug, info};

/// Column always kept by attribute filtering
const REQUIRED: [&str; 1] = ["username"];

/// Default sort order of user listings
pub const DEFAULT_SORT: [&str; 2] = ["connection name", "username"];

/// Result of deleting a user by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user existed and was deleted
    Deleted {
        /// Id of the deleted user
        user_id: u64,
    },
    /// No active user has that name
    NotFound,
}

impl DeleteOutcome {
    /// Text for the `result` column of bulk deletes
    pub fn as_str(&self) -> &'static str {
        match self {
            DeleteOutcome::Deleted { .. } => "successful",
            DeleteOutcome::NotFound => "not found",
        }
    }
}

/// Flatten a user into listing columns
pub fn user_row(user: &User) -> Row {
    let mut row = Row::new();
    row.insert("username".into(), Value::from(user.name.clone()));
    row.insert("is_admin".into(), Value::from(user.is_admin()));
    row.insert(
        "groups".into(),
        Value::from(user.active_group_names().collect::<Vec<_>>().join(", ")),
    );
    row.insert("email".into(), user.email.clone().map_or(Value::Null, Value::from));
    row.insert("is_deleted".into(), Value::from(user.is_deleted));
    row.insert("is_enabled".into(), Value::from(user.is_enabled));
    row.insert(
        "auth_type".into(),
        user.authentication_type.clone().map_or(Value::Null, Value::from),
    );
    row.insert("id".into(), Value::from(user.user_id));
    row
}

/// Users of one instance as rows, prefixed with the connection name.
///
/// Deleted and disabled accounts are hidden unless
/// [`ListOptions::include_inactive`] is set.
pub async fn list_users(
    api: &dyn LogicHubApi,
    connection_name: &str,
    opts: &ListOptions,
) -> Result<Vec<Row>> {
    let users = api.list_users().await?;
    let users: Vec<&User> = users
        .iter()
        .filter(|u| opts.include_inactive || (!u.is_deleted && u.is_enabled))
        .collect();
    debug!(
        instance = %connection_name,
        admins = users.iter().filter(|u| u.is_admin()).count(),
        "{} users found",
        users.len()
    );

    let stock = stock_columns(connection_name, api.hostname(), opts);
    let mut rows: Vec<Row> = users
        .into_iter()
        .map(|u| shape_row(&stock, user_row(u), &REQUIRED, &opts.attributes))
        .collect();
    sort_rows(&mut rows, &sort_keys_or(opts, &DEFAULT_SORT));
    Ok(rows)
}

/// Create a user and add it to the named groups
pub async fn create_user(
    api: &dyn LogicHubApi,
    username: &str,
    email: &str,
    groups: &[String],
) -> Result<User> {
    let username = username.trim();
    let email = email.trim();
    if username.is_empty() {
        return Err(ActionError::InvalidInput("Username cannot be blank".into()));
    }
    if email.is_empty() {
        return Err(ActionError::InvalidInput("Email cannot be blank".into()));
    }

    let mut group_ids = Vec::with_capacity(groups.len());
    if !groups.is_empty() {
        let known = api.list_groups().await?;
        for name in groups {
            let id = known
                .iter()
                .filter(|g| !g.is_deleted && g.name == *name)
                .find_map(|g| g.id)
                .ok_or_else(|| ActionError::NotFound(format!("group {}", name)))?;
            group_ids.push(id);
        }
    }

    let created = api
        .create_user(&NewUser {
            username: username.to_string(),
            email: email.to_string(),
            group_ids,
        })
        .await?;
    info!(username = %created.name, user_id = created.user_id, "User created");
    Ok(created)
}

/// Delete the active user with this name; a missing user is not an error
pub async fn delete_user_by_name(api: &dyn LogicHubApi, username: &str) -> Result<DeleteOutcome> {
    let users = api.list_users().await?;
    let Some(user) = users.iter().find(|u| !u.is_deleted && u.name == username) else {
        info!(username = %username, hostname = %api.hostname(), "User not found");
        return Ok(DeleteOutcome::NotFound);
    };

    api.delete_users(&[user.user_id]).await?;
    info!(username = %username, user_id = user.user_id, hostname = %api.hostname(), "User deleted");
    Ok(DeleteOutcome::Deleted {
        user_id: user.user_id,
    })
}
