//! Request and response bodies

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `{"result": ...}` wrapper used by most endpoints
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub result: T,
}

/// `{"data": [...]}` list payload
#[derive(Debug, Deserialize)]
pub(crate) struct DataList<T> {
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
}

/// User role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Role name, `admin` for administrators
    pub value: String,
}

/// User group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Group id
    #[serde(default)]
    pub id: Option<u64>,
    /// Group name
    pub name: String,
    /// Deleted groups are still attached to users
    #[serde(default)]
    pub is_deleted: bool,
}

/// A user account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Numeric user id
    pub user_id: u64,
    /// Login name
    pub name: String,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
    /// Role
    pub role: Role,
    /// Group memberships
    #[serde(default)]
    pub groups: Vec<Group>,
    /// Soft-deleted account
    #[serde(default)]
    pub is_deleted: bool,
    /// Account can log in
    #[serde(default)]
    pub is_enabled: bool,
    /// Authentication backend, e.g. `password` or `saml`
    #[serde(default)]
    pub authentication_type: Option<String>,
}

impl User {
    /// True for administrators
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role.value == "admin"
    }

    /// Names of groups that are not deleted
    pub fn active_group_names(&self) -> impl Iterator<Item = &str> {
        self.groups
            .iter()
            .filter(|g| !g.is_deleted)
            .map(|g| g.name.as_str())
    }
}

/// Body for creating a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Login name
    pub username: String,
    /// Email address
    pub email: String,
    /// Ids of groups to join
    pub group_ids: Vec<u64>,
}

/// One playbook in the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybookSummary {
    /// Flow id, e.g. `flow-123`
    pub id: String,
    /// Display name
    pub name: String,
}

/// Exported playbook content
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybookExport {
    /// `json` or `zip`
    pub file_type: String,
    /// Base64 file content
    #[serde(rename = "contentB64")]
    pub content_b64: String,
}

/// One batch of a stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    /// Batch id, e.g. `batch-123`
    pub id: String,
    /// Server state such as `ready`, `error` or `executing`
    pub state: String,
    /// Window start, epoch milliseconds
    #[serde(default)]
    pub from: i64,
    /// Window end, epoch milliseconds
    #[serde(default)]
    pub to: i64,
    /// Errors and warnings reported by the last run
    #[serde(default)]
    pub errors_and_warnings: Option<BatchMessages>,
}

impl Batch {
    /// Numeric id used by the rerun call (`batch-123` is 123)
    #[must_use]
    pub fn numeric_id(&self) -> Option<u64> {
        let digits: String = self.id.chars().filter(char::is_ascii_digit).collect();
        digits.parse().ok()
    }

    /// Errors from the last run, if any
    #[must_use]
    pub fn errors(&self) -> &[Value] {
        self.errors_and_warnings
            .as_ref()
            .map_or(&[][..], |m| m.errors.as_slice())
    }
}

/// Messages attached to a batch run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMessages {
    /// Error messages
    #[serde(default)]
    pub errors: Vec<Value>,
    /// Warning messages
    #[serde(default)]
    pub warnings: Vec<Value>,
}

/// One entry of the current user's preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPreference {
    /// Section the preference belongs to, e.g. `notifications`
    #[serde(default)]
    pub kind: String,
    /// Display label
    #[serde(default)]
    pub label: String,
    /// Current value
    #[serde(default)]
    pub value: Value,
}

/// Preferences returned after an update
#[derive(Debug, Deserialize)]
pub(crate) struct PreferenceList {
    #[serde(default)]
    pub preferences: Vec<UserPreference>,
}

/// One command in the list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandSummary {
    /// Command id
    #[serde(default)]
    pub id: Option<u64>,
    /// Command name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
    /// Owner username
    #[serde(default)]
    pub owner: Option<String>,
}

/// A case returned by search, kept as the server sent it
pub type CaseRow = Map<String, Value>;

/// Rows produced by running a command
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOutput {
    /// Row fields in column order
    pub rows: Vec<Map<String, Value>>,
    /// Column names from the result schema
    pub columns: Vec<String>,
    /// Warnings reported by the server
    pub warnings: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCommandResult {
    rows: DataList<RawRow>,
    #[serde(default)]
    warnings: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct RawRow {
    fields: Map<String, Value>,
    #[serde(default)]
    schema: Option<RawSchema>,
}

#[derive(Debug, Deserialize)]
struct RawSchema {
    #[serde(default)]
    columns: Vec<RawColumn>,
}

#[derive(Debug, Deserialize)]
struct RawColumn {
    name: String,
}

impl RawCommandResult {
    pub(crate) fn into_output(self) -> CommandOutput {
        let columns = self
            .rows
            .data
            .first()
            .and_then(|row| row.schema.as_ref())
            .map(|schema| schema.columns.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default();

        let warnings = self
            .warnings
            .into_iter()
            .map(|w| match w {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .collect();

        CommandOutput {
            rows: self.rows.data.into_iter().map(|row| row.fields).collect(),
            columns,
            warnings,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_decoding() {
        let body = json!({
            "result": {"data": [{
                "userId": 4,
                "name": "alice",
                "email": "alice@example.com",
                "role": {"value": "admin"},
                "groups": [{"id": 1, "name": "Everyone"}, {"id": 2, "name": "Old", "isDeleted": true}],
                "isDeleted": false,
                "isEnabled": true,
                "authenticationType": "password"
            }]}
        });

        let users: Envelope<DataList<User>> = serde_json::from_value(body).unwrap();
        let user = &users.result.data[0];
        assert!(user.is_admin());
        assert_eq!(user.active_group_names().collect::<Vec<_>>(), vec!["Everyone"]);
        assert_eq!(user.authentication_type.as_deref(), Some("password"));
    }

    #[test]
    fn test_command_output_from_raw() {
        let body = json!({
            "result": {
                "rows": {"data": [
                    {"id": 1, "fields": {"b": 2, "a": 1, "lhub_id": 9},
                     "schema": {"columns": [{"name": "b"}, {"name": "a"}, {"name": "lhub_id"}]}},
                    {"id": 2, "fields": {"b": 4, "a": 3, "lhub_id": 10}}
                ]},
                "warnings": ["slow query", {"code": 1}]
            }
        });

        let raw: Envelope<RawCommandResult> = serde_json::from_value(body).unwrap();
        let output = raw.result.into_output();
        assert_eq!(output.columns, vec!["b", "a", "lhub_id"]);
        assert_eq!(output.rows.len(), 2);
        assert_eq!(output.rows[1]["a"], json!(3));
        assert_eq!(output.warnings[0], "slow query");
        assert_eq!(output.warnings[1], "{\"code\":1}");
    }

    #[test]
    fn test_batch_decoding() {
        let body = json!({
            "result": {"data": [
                {"id": "batch-42", "state": "error", "from": 1000, "to": 2000,
                 "errorsAndWarnings": {"errors": ["lookup failed"]}},
                {"id": "batch-43", "state": "ready"}
            ]}
        });

        let page: Envelope<DataList<Batch>> = serde_json::from_value(body).unwrap();
        let batches = page.result.data;
        assert_eq!(batches[0].numeric_id(), Some(42));
        assert_eq!(batches[0].errors(), &[json!("lookup failed")]);
        assert_eq!(batches[1].to, 0);
        assert!(batches[1].errors().is_empty());

        let odd = Batch { id: "pending".into(), ..batches[1].clone() };
        assert_eq!(odd.numeric_id(), None);
    }

    #[test]
    fn test_export_decoding() {
        let export: PlaybookExport =
            serde_json::from_value(json!({"fileType": "zip", "contentB64": "UEsDBA=="})).unwrap();
        assert_eq!(export.file_type, "zip");
        assert_eq!(export.content_b64, "UEsDBA==");
    }
}
