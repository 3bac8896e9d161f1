//! End-to-end tests for the credential store
//!
//! These run across crate boundaries the way the CLI does:
//! - lhub-core: store, connection facade and preferences
//! - lhub-crypto: key pair bootstrap and secret codec
//! - lhub-client: the HTTP validator used during creation

use async_trait::async_trait;
use lhub_core::credentials::{Auth, AuthType, NewConnection, SecureString};
use lhub_core::{
    ConnectionParams, Error, KeyOptions, LogicHubConnection, NonInteractive, Prompter,
    SessionError, SessionValidator, StoreConfig,
};
use lhub_client::{ClientSettings, HttpValidator};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

fn config(dir: &TempDir) -> StoreConfig {
    StoreConfig::new(dir.path()).with_keys(KeyOptions::default().with_bits(1024))
}

/// Answers text prompts in order; everything else fails the test
struct Replies(Mutex<VecDeque<&'static str>>);

impl Replies {
    fn new(answers: &[&'static str]) -> Self {
        Self(Mutex::new(answers.iter().copied().collect()))
    }

    fn pop(&self, message: &str) -> lhub_core::Result<&'static str> {
        self.0
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| Error::Prompt(format!("unexpected prompt: {}", message)))
    }
}

impl Prompter for Replies {
    fn ask_text(&self, message: &str) -> lhub_core::Result<String> {
        self.pop(message).map(str::to_string)
    }

    fn ask_secret(&self, message: &str) -> lhub_core::Result<SecureString> {
        self.pop(message).map(SecureString::new)
    }

    fn ask_choice(&self, message: &str, _options: &[&str]) -> lhub_core::Result<usize> {
        self.pop(message)?
            .parse()
            .map_err(|_| Error::Prompt(format!("bad choice for {}", message)))
    }

    fn confirm(&self, message: &str, _default: bool) -> lhub_core::Result<bool> {
        Ok(self.pop(message)? == "y")
    }
}

/// Accepts every connection and counts the attempts
#[derive(Default)]
struct AcceptAll(Mutex<usize>);

#[async_trait]
impl SessionValidator for AcceptAll {
    async fn validate(&self, _params: &ConnectionParams) -> Result<(), SessionError> {
        *self.0.lock().unwrap() += 1;
        Ok(())
    }
}

#[tokio::test]
async fn test_create_then_get_password_profile() {
    let dir = TempDir::new().unwrap();
    let validator = Arc::new(AcceptAll::default());
    let mut conn = LogicHubConnection::open(config(&dir))
        .unwrap()
        .with_prompter(Arc::new(NonInteractive))
        .with_validator(validator.clone());

    conn.store()
        .create(
            NewConnection::new("dev")
                .hostname("h1")
                .username("u1")
                .password("pw1")
                .verify_ssl(true),
        )
        .await
        .unwrap();
    assert_eq!(*validator.0.lock().unwrap(), 1);

    let record = conn.store().get("dev").unwrap().unwrap();
    assert_eq!(record.hostname, "h1");
    assert_eq!(record.username(), Some("u1"));
    assert_eq!(record.password().map(SecureString::expose), Some("pw1"));
    assert!(record.verify_ssl);
    assert!(record.api_key().is_none());

    let on_disk = std::fs::read_to_string(dir.path().join("credentials")).unwrap();
    assert!(on_disk.contains("[dev]"));
    assert!(!on_disk.contains("pw1"));
}

#[tokio::test]
async fn test_second_process_sees_profile() {
    let dir = TempDir::new().unwrap();
    let mut first = LogicHubConnection::open(config(&dir)).unwrap();
    let mut second = LogicHubConnection::open(config(&dir)).unwrap();
    assert!(second.all_instances().unwrap().is_empty());

    first
        .store()
        .create(
            NewConnection::new("prod")
                .hostname("prod.example.com")
                .api_key("tok-123")
                .verify_ssl(false),
        )
        .await
        .unwrap();

    let record = second.store().get("prod").unwrap().unwrap();
    assert_eq!(record.auth_type(), AuthType::ApiKey);
    assert_eq!(record.api_key().map(SecureString::expose), Some("tok-123"));
    assert!(!record.verify_ssl);
    assert_eq!(second.all_instances().unwrap(), vec!["prod".to_string()]);
}

#[tokio::test]
async fn test_unknown_alias_is_created_interactively() {
    let dir = TempDir::new().unwrap();
    let prompts = Arc::new(Replies::new(&["lab.example.com", "1", "secret-token", "y"]));
    let mut conn = LogicHubConnection::open(config(&dir))
        .unwrap()
        .with_prompter(prompts.clone())
        .with_validator(Arc::new(AcceptAll::default()));

    let record = conn.resolve("lab").await.unwrap();
    assert_eq!(record.hostname, "lab.example.com");
    assert!(matches!(record.auth, Auth::Token { ref api_key } if api_key.expose() == "secret-token"));
    assert!(prompts.0.lock().unwrap().is_empty());

    // Known now, so no further prompts
    let again = conn.resolve("lab").await.unwrap();
    assert_eq!(again, record);
}

#[tokio::test]
async fn test_default_instance_from_preferences() {
    let dir = TempDir::new().unwrap();
    let mut conn = LogicHubConnection::open(config(&dir)).unwrap();
    conn.store()
        .create(
            NewConnection::new("main")
                .hostname("main.example.com")
                .api_key("k")
                .verify_ssl(true),
        )
        .await
        .unwrap();

    assert!(matches!(
        conn.resolve_default(None).await,
        Err(Error::Validation(_))
    ));

    conn.preferences_mut()
        .set("main.default_instance", "main")
        .unwrap();
    conn.preferences().save().unwrap();

    let mut reopened = LogicHubConnection::open(config(&dir)).unwrap();
    let record = reopened.resolve_default(None).await.unwrap();
    assert_eq!(record.name, "main");
}

#[test]
fn test_alternate_store_is_separate() {
    let dir = TempDir::new().unwrap();
    let mut default = LogicHubConnection::open(config(&dir)).unwrap();
    let mut acme =
        LogicHubConnection::open(config(&dir).alternate(Some("acme")).unwrap()).unwrap();

    tokio_test::block_on(
        acme.store().create(
            NewConnection::new("acme-prod")
                .hostname("acme.example.com")
                .username("ops")
                .password("pw")
                .verify_ssl(true),
        ),
    )
    .unwrap();

    assert!(default.all_instances().unwrap().is_empty());
    assert_eq!(acme.all_instances().unwrap(), vec!["acme-prod".to_string()]);

    let files = lhub_core::list_credential_files(dir.path()).unwrap();
    let names: Vec<_> = files.iter().map(|f| f.file_name.as_str()).collect();
    assert_eq!(names, vec!["credentials", "credentials-acme"]);
}

#[tokio::test]
async fn test_unreachable_instance_is_not_stored() {
    // Bind then drop to get a local port with nothing listening
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let dir = TempDir::new().unwrap();
    let settings = ClientSettings {
        timeout: Duration::from_secs(5),
        ..ClientSettings::default()
    };
    let mut conn = LogicHubConnection::open(config(&dir))
        .unwrap()
        .with_validator(Arc::new(HttpValidator::new(settings)));

    let err = conn
        .store()
        .create(
            NewConnection::new("down")
                .hostname(format!("http://127.0.0.1:{}", port))
                .api_key("k")
                .verify_ssl(true),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Session(SessionError::Connect { .. })));
    assert!(!conn.store().contains("down").unwrap());
}
