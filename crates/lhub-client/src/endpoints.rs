//! REST paths used by the client

use lhub_core::SessionError;
use reqwest::Url;

/// Header carrying API tokens
pub const AUTH_TOKEN_HEADER: &str = "X-Auth-Token";

/// Password login (sets the session cookie)
pub const LOGIN: &str = "/api/login";
/// Server version; also checks a token at login
pub const VERSION: &str = "/api/version";

/// Users list and creation
pub const USERS: &str = "/api/user_management/users";
/// Bulk user deletion
pub const USERS_DELETE: &str = "/api/user_management/users/delete";
/// Groups list
pub const GROUPS: &str = "/api/user_management/groups";

/// Playbook (flow) list
pub const PLAYBOOKS: &str = "/api/demo/hub/flows";

/// Command list
pub const COMMANDS: &str = "/api/content-management/content/commands";
/// Command execution
pub const COMMAND_EXECUTE: &str = "/api/content-management/commands/execute";

/// Advanced case search
pub const CASES_SEARCH: &str = "/api/cases/advanced-search";

/// Preferences of the logged-in user
pub const CURRENT_USER_PREFERENCES: &str = "/api/user_management/current_user/preferences";

/// Export of one playbook
pub fn playbook_export(flow_id: &str) -> String {
    format!("/api/flow/{}/export", flow_id)
}

/// Rerun of one batch
pub fn batch_rerun(batch_id: u64) -> String {
    format!("/api/demo/hub/batch/{}/rerun", batch_id)
}

/// Batches of one stream
pub fn stream_batches(stream_id: u64) -> String {
    format!("/api/demo/hub/stream/stream-{}/batches", stream_id)
}

/// One case
pub fn case(case_id: &str) -> String {
    format!("/api/cases/{}", case_id)
}

/// Base URL for a stored hostname. A bare host gets `https://`.
pub fn base_url(hostname: &str) -> Result<Url, SessionError> {
    let hostname = hostname.trim().trim_end_matches('/');
    if hostname.is_empty() {
        return Err(SessionError::Other("hostname is empty".to_string()));
    }

    let candidate = if hostname.contains("://") {
        hostname.to_string()
    } else {
        format!("https://{}", hostname)
    };

    let url = Url::parse(&candidate)
        .map_err(|e| SessionError::Other(format!("invalid hostname {:?}: {}", hostname, e)))?;
    if url.host_str().is_none() {
        return Err(SessionError::Other(format!(
            "invalid hostname {:?}: no host",
            hostname
        )));
    }
    Ok(url)
}
