//! REST calls used by the CLI actions

use crate::error::Result;
use crate::types::{
    Batch, CaseRow, CommandOutput, CommandSummary, Group, NewUser, PlaybookExport,
    PlaybookSummary, User, UserPreference,
};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Calls against one authenticated LogicHub instance.
///
/// [`HttpSession`](crate::HttpSession) is the real implementation; action
/// tests use in-memory fakes.
#[async_trait]
pub trait LogicHubApi: Send + Sync {
    /// Host name of the instance, used in folder names and output columns
    fn hostname(&self) -> &str;

    /// Server version string
    async fn version(&self) -> Result<String>;

    /// Every user account, including deleted and disabled ones
    async fn list_users(&self) -> Result<Vec<User>>;

    /// Every group
    async fn list_groups(&self) -> Result<Vec<Group>>;

    /// Create a user
    async fn create_user(&self, user: &NewUser) -> Result<User>;

    /// Delete users by id
    async fn delete_users(&self, user_ids: &[u64]) -> Result<()>;

    /// Every playbook
    async fn list_playbooks(&self) -> Result<Vec<PlaybookSummary>>;

    /// Export one playbook
    async fn export_playbook(&self, flow_id: &str) -> Result<PlaybookExport>;

    /// Rerun one batch
    async fn reprocess_batch(&self, batch_id: u64) -> Result<()>;

    /// Every batch of a stream, in server order
    async fn list_stream_batches(&self, stream_id: u64) -> Result<Vec<Batch>>;

    /// Every command
    async fn list_commands(&self) -> Result<Vec<CommandSummary>>;

    /// Run a command with named parameters
    async fn execute_command(&self, name: &str, params: &Map<String, Value>)
        -> Result<CommandOutput>;

    /// Advanced case search
    async fn search_cases(&self, query: &str, limit: Option<usize>) -> Result<Vec<CaseRow>>;

    /// Set a case status, e.g. `Resolved`
    async fn update_case_status(&self, case_id: &str, status: &str) -> Result<()>;

    /// Change preferences of the logged-in user; returns every preference
    /// after the change
    async fn update_current_user_preferences(
        &self,
        changes: &Map<String, Value>,
    ) -> Result<Vec<UserPreference>>;
}
