//! In-memory LogicHub API for action tests

use async_trait::async_trait;
use lhub_client::types::Role;
use lhub_client::{
    Batch, CaseRow, CommandOutput, CommandSummary, Group, LogicHubApi, NewUser, PlaybookExport,
    PlaybookSummary, User, UserPreference,
};
use lhub_core::SessionError;
use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type ApiResult<T> = std::result::Result<T, SessionError>;

#[derive(Default)]
pub(crate) struct FakeApi {
    pub host: String,
    pub users: Mutex<Vec<User>>,
    pub groups: Vec<Group>,
    pub playbooks: Vec<PlaybookSummary>,
    /// Export per flow id; `Err((status, body))` answers with an HTTP error
    pub exports: HashMap<String, Result<PlaybookExport, (u16, String)>>,
    pub commands: Vec<CommandSummary>,
    pub command_output: CommandOutput,
    pub cases: Vec<CaseRow>,
    /// Case ids whose status update fails
    pub broken_cases: Vec<String>,
    /// Successive answers to batch listings; the last one repeats
    pub stream_batches: Mutex<VecDeque<Vec<Batch>>>,
    pub preferences: Vec<UserPreference>,
    pub calls: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            ..Self::default()
        }
    }

    pub fn with_users(self, users: Vec<User>) -> Self {
        *self.users.lock().unwrap() = users;
        self
    }

    pub fn with_batch_snapshots(self, snapshots: Vec<Vec<Batch>>) -> Self {
        *self.stream_batches.lock().unwrap() = snapshots.into();
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn http_error(&self, status: u16, body: &str) -> SessionError {
        SessionError::Http {
            host: self.host.clone(),
            status,
            body: body.to_string(),
        }
    }
}

pub(crate) fn user(id: u64, name: &str, role: &str, groups: &[&str]) -> User {
    User {
        user_id: id,
        name: name.to_string(),
        email: Some(format!("{}@example.com", name)),
        role: Role {
            value: role.to_string(),
        },
        groups: groups
            .iter()
            .map(|g| Group {
                id: None,
                name: (*g).to_string(),
                is_deleted: false,
            })
            .collect(),
        is_deleted: false,
        is_enabled: true,
        authentication_type: Some("password".to_string()),
    }
}

pub(crate) fn batch(id: u64, state: &str, to: i64) -> Batch {
    Batch {
        id: format!("batch-{}", id),
        state: state.to_string(),
        from: to - 1000,
        to,
        errors_and_warnings: None,
    }
}

pub(crate) fn group(id: u64, name: &str) -> Group {
    Group {
        id: Some(id),
        name: name.to_string(),
        is_deleted: false,
    }
}

#[async_trait]
impl LogicHubApi for FakeApi {
    fn hostname(&self) -> &str {
        &self.host
    }

    async fn version(&self) -> ApiResult<String> {
        Ok("m96".to_string())
    }

    async fn list_users(&self) -> ApiResult<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn list_groups(&self) -> ApiResult<Vec<Group>> {
        Ok(self.groups.clone())
    }

    async fn create_user(&self, new_user: &NewUser) -> ApiResult<User> {
        self.record(format!("create {} {:?}", new_user.username, new_user.group_ids));
        let mut users = self.users.lock().unwrap();
        let created = User {
            user_id: users.len() as u64 + 100,
            email: Some(new_user.email.clone()),
            ..user(0, &new_user.username, "user", &[])
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn delete_users(&self, user_ids: &[u64]) -> ApiResult<()> {
        self.record(format!("delete {:?}", user_ids));
        self.users
            .lock()
            .unwrap()
            .retain(|u| !user_ids.contains(&u.user_id));
        Ok(())
    }

    async fn list_playbooks(&self) -> ApiResult<Vec<PlaybookSummary>> {
        Ok(self.playbooks.clone())
    }

    async fn export_playbook(&self, flow_id: &str) -> ApiResult<PlaybookExport> {
        match self.exports.get(flow_id) {
            Some(Ok(export)) => Ok(export.clone()),
            Some(Err((status, body))) => Err(self.http_error(*status, body)),
            None => Err(self.http_error(404, "")),
        }
    }

    async fn reprocess_batch(&self, batch_id: u64) -> ApiResult<()> {
        self.record(format!("rerun {}", batch_id));
        Ok(())
    }

    async fn list_stream_batches(&self, stream_id: u64) -> ApiResult<Vec<Batch>> {
        self.record(format!("batches {}", stream_id));
        let mut snapshots = self.stream_batches.lock().unwrap();
        let current = if snapshots.len() > 1 {
            snapshots.pop_front()
        } else {
            snapshots.front().cloned()
        };
        Ok(current.unwrap_or_default())
    }

    async fn list_commands(&self) -> ApiResult<Vec<CommandSummary>> {
        Ok(self.commands.clone())
    }

    async fn execute_command(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> ApiResult<CommandOutput> {
        self.record(format!("execute {} {}", name, Value::Object(params.clone())));
        Ok(self.command_output.clone())
    }

    async fn search_cases(&self, query: &str, limit: Option<usize>) -> ApiResult<Vec<CaseRow>> {
        self.record(format!("search {} {:?}", query, limit));
        let cases = self.cases.iter().take(limit.unwrap_or(usize::MAX)).cloned();
        Ok(cases.collect())
    }

    async fn update_case_status(&self, case_id: &str, status: &str) -> ApiResult<()> {
        if self.broken_cases.iter().any(|c| c == case_id) {
            return Err(self.http_error(500, "case locked"));
        }
        self.record(format!("status {} {}", case_id, status));
        Ok(())
    }

    async fn update_current_user_preferences(
        &self,
        changes: &Map<String, Value>,
    ) -> ApiResult<Vec<UserPreference>> {
        self.record(format!("preferences {}", Value::Object(changes.clone())));
        Ok(self.preferences.clone())
    }
}
