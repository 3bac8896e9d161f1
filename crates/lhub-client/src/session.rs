//! Authenticated HTTP session

use crate::api::LogicHubApi;
use crate::endpoints::{self, AUTH_TOKEN_HEADER};
use crate::error::{classify, status_error, Result};
use crate::settings::ClientSettings;
use crate::types::{
    Batch, CaseRow, CommandOutput, CommandSummary, DataList, Envelope, Group, NewUser,
    PlaybookExport, PlaybookSummary, PreferenceList, RawCommandResult, User, UserPreference,
};
use async_trait::async_trait;
use lhub_core::{Auth, ConnectionParams, SecureString, SessionError};
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use tracing::{debug, info, instrument};

/// Logged-in session with one instance.
///
/// Password profiles log in once and ride on the session cookie; token
/// profiles send the token header with every request.
pub struct HttpSession {
    client: Client,
    base: Url,
    host: String,
    token: Option<SecureString>,
    settings: ClientSettings,
}

impl std::fmt::Debug for HttpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSession")
            .field("base", &self.base.as_str())
            .field("token", &self.token.is_some())
            .finish()
    }
}

impl HttpSession {
    /// Connect and authenticate
    #[instrument(skip_all, fields(hostname = %params.hostname, verify_ssl = params.verify_ssl))]
    pub async fn connect(params: &ConnectionParams, settings: &ClientSettings) -> Result<Self> {
        let base = endpoints::base_url(&params.hostname)?;
        let host = base.host_str().unwrap_or_default().to_string();

        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .cookie_store(true)
            .danger_accept_invalid_certs(!params.verify_ssl)
            .build()
            .map_err(|e| SessionError::Other(format!("Failed to build HTTP client: {}", e)))?;

        let mut session = Self {
            client,
            base,
            host,
            token: None,
            settings: settings.clone(),
        };

        match &params.auth {
            Auth::Password { username, password } => session.login(username, password).await?,
            Auth::Token { api_key } => {
                session.token = Some(api_key.clone());
                let version = session.version().await?;
                debug!(version = %version, "Token accepted");
            }
        }

        info!(
            hostname = %session.host,
            auth_type = %params.auth.auth_type(),
            "Connected"
        );
        Ok(session)
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    async fn login(&self, username: &str, password: &SecureString) -> Result<()> {
        let body = json!({ "email": username, "password": password.expose() });
        let request = self.client.post(self.url(endpoints::LOGIN)?).json(&body);
        let response = self.send(request).await?;
        debug!(status = %response.status(), "Logged in");
        Ok(())
    }

    fn url(&self, path: &str) -> Result<Url> {
        self.base
            .join(path)
            .map_err(|e| SessionError::Other(format!("Invalid request path {}: {}", path, e)))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let request = match &self.token {
            Some(token) => request.header(AUTH_TOKEN_HEADER, token.expose()),
            None => request,
        };

        let response = request.send().await.map_err(|e| classify(&self.host, &e))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(status_error(&self.host, status, &body))
    }

    async fn decode<T: DeserializeOwned>(&self, response: Response) -> Result<T> {
        let body = response.text().await.map_err(|e| classify(&self.host, &e))?;
        serde_json::from_str(&body).map_err(|e| SessionError::Decode {
            host: self.host.clone(),
            message: e.to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let request = self.client.get(self.url(path)?).query(query);
        let response = self.send(request).await?;
        self.decode(response).await
    }

    async fn post_json<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
        let request = self.client.post(self.url(path)?).json(body);
        let response = self.send(request).await?;
        self.decode(response).await
    }

    fn page(&self) -> Vec<(&'static str, String)> {
        vec![("pageSize", self.settings.page_size.to_string())]
    }
}

#[async_trait]
impl LogicHubApi for HttpSession {
    fn hostname(&self) -> &str {
        &self.host
    }

    async fn version(&self) -> Result<String> {
        let value: Value = self.get_json(endpoints::VERSION, &[]).await?;
        let version = value
            .get("version")
            .or_else(|| value.pointer("/result/version"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string());
        Ok(version)
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let page: Envelope<DataList<User>> = self.get_json(endpoints::USERS, &self.page()).await?;
        debug!(count = page.result.data.len(), "Fetched users");
        Ok(page.result.data)
    }

    async fn list_groups(&self) -> Result<Vec<Group>> {
        let page: Envelope<DataList<Group>> =
            self.get_json(endpoints::GROUPS, &self.page()).await?;
        Ok(page.result.data)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let body = serde_json::to_value(user).map_err(|e| SessionError::Other(e.to_string()))?;
        let created: Envelope<User> = self.post_json(endpoints::USERS, &body).await?;
        Ok(created.result)
    }

    async fn delete_users(&self, user_ids: &[u64]) -> Result<()> {
        let request = self
            .client
            .post(self.url(endpoints::USERS_DELETE)?)
            .json(&json!({ "ids": user_ids }));
        self.send(request).await?;
        Ok(())
    }

    async fn list_playbooks(&self) -> Result<Vec<PlaybookSummary>> {
        let page: Envelope<DataList<PlaybookSummary>> =
            self.get_json(endpoints::PLAYBOOKS, &self.page()).await?;
        Ok(page.result.data)
    }

    async fn export_playbook(&self, flow_id: &str) -> Result<PlaybookExport> {
        let export: Envelope<PlaybookExport> = self
            .get_json(&endpoints::playbook_export(flow_id), &[])
            .await?;
        Ok(export.result)
    }

    async fn reprocess_batch(&self, batch_id: u64) -> Result<()> {
        let request = self
            .client
            .post(self.url(&endpoints::batch_rerun(batch_id))?)
            .json(&json!({}));
        self.send(request).await?;
        Ok(())
    }

    async fn list_stream_batches(&self, stream_id: u64) -> Result<Vec<Batch>> {
        let page: Envelope<DataList<Batch>> = self
            .get_json(&endpoints::stream_batches(stream_id), &self.page())
            .await?;
        debug!(stream_id, count = page.result.data.len(), "Fetched batches");
        Ok(page.result.data)
    }

    async fn list_commands(&self) -> Result<Vec<CommandSummary>> {
        let page: Envelope<DataList<CommandSummary>> =
            self.get_json(endpoints::COMMANDS, &self.page()).await?;
        Ok(page.result.data)
    }

    async fn execute_command(
        &self,
        name: &str,
        params: &Map<String, Value>,
    ) -> Result<CommandOutput> {
        let body = json!({
            "command": name,
            "parameters": params,
            "limit": self.settings.page_size,
        });
        let raw: Envelope<RawCommandResult> = self.post_json(endpoints::COMMAND_EXECUTE, &body).await?;
        Ok(raw.result.into_output())
    }

    async fn search_cases(&self, query: &str, limit: Option<usize>) -> Result<Vec<CaseRow>> {
        let body = json!({
            "query": query,
            "limit": limit.unwrap_or(self.settings.page_size),
        });
        let page: Envelope<DataList<CaseRow>> = self.post_json(endpoints::CASES_SEARCH, &body).await?;
        Ok(page.result.data)
    }

    async fn update_case_status(&self, case_id: &str, status: &str) -> Result<()> {
        let request = self
            .client
            .patch(self.url(&endpoints::case(case_id))?)
            .json(&json!({ "status": status }));
        self.send(request).await?;
        Ok(())
    }

    async fn update_current_user_preferences(
        &self,
        changes: &Map<String, Value>,
    ) -> Result<Vec<UserPreference>> {
        let request = self
            .client
            .put(self.url(endpoints::CURRENT_USER_PREFERENCES)?)
            .json(changes);
        let response = self.send(request).await?;
        let updated: Envelope<PreferenceList> = self.decode(response).await?;
        Ok(updated.result.preferences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lhub_core::SecureString;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};
    use tokio::task::JoinHandle;

    struct Canned {
        status: u16,
        headers: &'static str,
        body: &'static str,
    }

    fn ok(body: &'static str) -> Canned {
        Canned {
            status: 200,
            headers: "",
            body,
        }
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|l| {
                        let (name, value) = l.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    return text;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Serve one canned response per connection and return the raw requests
    async fn serve(responses: Vec<Canned>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for canned in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                requests.push(read_request(&mut socket).await);
                let response = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\n{}Content-Length: {}\r\nConnection: close\r\n\r\n{}",
                    canned.status,
                    canned.headers,
                    canned.body.len(),
                    canned.body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                let _ = socket.shutdown().await;
            }
            requests
        });
        (format!("http://{}", addr), handle)
    }

    fn token_params(host: &str) -> ConnectionParams {
        ConnectionParams {
            hostname: host.to_string(),
            verify_ssl: true,
            auth: Auth::Token {
                api_key: SecureString::new("tok-1"),
            },
        }
    }

    fn password_params(host: &str) -> ConnectionParams {
        ConnectionParams {
            hostname: host.to_string(),
            verify_ssl: true,
            auth: Auth::Password {
                username: "admin".to_string(),
                password: SecureString::new("pw"),
            },
        }
    }

    #[tokio::test]
    async fn test_token_session_sends_header() {
        let (url, server) = serve(vec![ok(r#"{"version": "m96"}"#)]).await;

        let session = HttpSession::connect(&token_params(&url), &ClientSettings::default())
            .await
            .unwrap();
        assert_eq!(session.hostname(), "127.0.0.1");

        let requests = server.await.unwrap();
        let request = requests[0].to_ascii_lowercase();
        assert!(request.starts_with("get /api/version"));
        assert!(request.contains("x-auth-token: tok-1"));
    }

    #[tokio::test]
    async fn test_password_login_keeps_cookie() {
        let (url, server) = serve(vec![
            Canned {
                status: 200,
                headers: "Set-Cookie: JSESSIONID=abc123; Path=/\r\n",
                body: "{}",
            },
            ok(r#"{"result": {"data": [{"userId": 1, "name": "admin", "role": {"value": "admin"}}]}}"#),
        ])
        .await;

        let session = HttpSession::connect(&password_params(&url), &ClientSettings::default())
            .await
            .unwrap();
        let users = session.list_users().await.unwrap();
        assert_eq!(users[0].name, "admin");

        let requests = server.await.unwrap();
        assert!(requests[0].starts_with("POST /api/login"));
        assert!(requests[0].contains(r#""email":"admin""#));
        assert!(requests[1].to_ascii_lowercase().contains("cookie: jsessionid=abc123"));
        assert!(requests[1].contains("pageSize=1000"));
    }

    #[tokio::test]
    async fn test_rejected_login_is_auth_error() {
        let (url, server) = serve(vec![Canned {
            status: 401,
            headers: "",
            body: r#"{"errors": [{"message": "bad credentials"}]}"#,
        }])
        .await;

        let err = HttpSession::connect(&password_params(&url), &ClientSettings::default())
            .await
            .unwrap_err();
        assert!(err.is_auth(), "{err:?}");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_refused_connection_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = HttpSession::connect(
            &token_params(&format!("http://{}", addr)),
            &ClientSettings::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SessionError::Connect { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn test_stream_batches_and_preferences() {
        let (url, server) = serve(vec![
            ok(r#"{"version": "m96"}"#),
            ok(r#"{"result": {"data": [{"id": "batch-5", "state": "error", "from": 1, "to": 2}]}}"#),
            ok(r#"{"result": {"preferences": [{"kind": "notifications", "label": "Assignee", "value": false}]}}"#),
        ])
        .await;

        let session = HttpSession::connect(&token_params(&url), &ClientSettings::default())
            .await
            .unwrap();
        let batches = session.list_stream_batches(12).await.unwrap();
        assert_eq!(batches[0].numeric_id(), Some(5));

        let mut changes = Map::new();
        changes.insert("assigneePreference".to_string(), Value::Bool(false));
        let prefs = session.update_current_user_preferences(&changes).await.unwrap();
        assert_eq!(prefs[0].kind, "notifications");
        assert_eq!(prefs[0].value, Value::Bool(false));

        let requests = server.await.unwrap();
        assert!(requests[1].starts_with("GET /api/demo/hub/stream/stream-12/batches"));
        assert!(requests[2].starts_with("PUT /api/user_management/current_user/preferences"));
        assert!(requests[2].contains(r#""assigneePreference":false"#));
    }

    #[tokio::test]
    async fn test_http_error_keeps_body() {
        let (url, server) = serve(vec![
            ok(r#"{"version": "m96"}"#),
            Canned {
                status: 400,
                headers: "",
                body: r#"{"errors": [{"errorType": "Invalid", "message": "no such flow"}]}"#,
            },
        ])
        .await;

        let session = HttpSession::connect(&token_params(&url), &ClientSettings::default())
            .await
            .unwrap();
        let err = session.export_playbook("flow-9").await.unwrap_err();
        match err {
            SessionError::Http { status, body, .. } => {
                assert_eq!(status, 400);
                assert!(body.contains("no such flow"));
            }
            other => panic!("unexpected {other:?}"),
        }
        server.await.unwrap();
    }
}
