//! Alias resolution on top of the credential store

use crate::credentials::{validate_name, CredentialRecord, CredentialStore, NewConnection};
use crate::error::{Error, Result};
use crate::paths::StoreConfig;
use crate::preferences::Preferences;
use crate::prompt::Prompter;
use crate::session::SessionValidator;
use std::sync::Arc;
use tracing::{debug, warn};

/// Entry point for callers that want credentials for a named instance.
///
/// Unknown aliases are created interactively on first use, so a fresh
/// install can go straight to `lhub users list prod`.
#[derive(Debug)]
pub struct LogicHubConnection {
    config: StoreConfig,
    store: CredentialStore,
    preferences: Preferences,
}

impl LogicHubConnection {
    /// Open the store and preferences described by `config`
    pub fn open(config: StoreConfig) -> Result<Self> {
        let store = CredentialStore::open(&config)?;
        let preferences = Preferences::load(&config.root)?;
        Ok(Self {
            config,
            store,
            preferences,
        })
    }

    /// Prompter used when an alias has to be created
    #[must_use]
    pub fn with_prompter(mut self, prompter: Arc<dyn Prompter>) -> Self {
        self.store = self.store.with_prompter(prompter);
        self
    }

    /// Validator used when an alias has to be created
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn SessionValidator>) -> Self {
        self.store = self.store.with_validator(validator);
        self
    }

    /// Configuration this connection was opened with
    #[must_use]
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The underlying credential store
    pub fn store(&mut self) -> &mut CredentialStore {
        &mut self.store
    }

    /// Loaded preferences
    #[must_use]
    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    /// Loaded preferences, for `set` followed by `save`
    pub fn preferences_mut(&mut self) -> &mut Preferences {
        &mut self.preferences
    }

    /// Sorted names of every stored instance
    pub fn all_instances(&mut self) -> Result<Vec<String>> {
        self.store.list_names()
    }

    /// Decrypted credentials for `alias`, creating the profile if it is missing
    pub async fn resolve(&mut self, alias: &str) -> Result<CredentialRecord> {
        let name = validate_name(alias)?;
        if let Some(record) = self.store.get(&name)? {
            debug!(instance = %name, "Resolved connection");
            return Ok(record);
        }

        warn!(instance = %name, "Connection not found, creating it");
        self.store.create(NewConnection::new(name.as_str())).await?;
        self.store.get(&name)?.ok_or(Error::NotFound(name))
    }

    /// Resolve `alias`, falling back to the preferred default instance
    pub async fn resolve_default(&mut self, alias: Option<&str>) -> Result<CredentialRecord> {
        let alias = match alias.map(str::trim).filter(|a| !a.is_empty()) {
            Some(a) => a.to_string(),
            None => self
                .preferences
                .default_instance()
                .map(str::to_string)
                .ok_or_else(|| Error::Validation("no instance specified".to_string()))?,
        };
        self.resolve(&alias).await
    }

    /// Resolve several aliases in order. An empty list means every stored
    /// instance.
    ///
    /// Resolution is sequential; callers fan out remote work afterwards.
    pub async fn resolve_many(&mut self, aliases: &[String]) -> Result<Vec<CredentialRecord>> {
        if aliases.is_empty() {
            let mut records = Vec::new();
            for name in self.all_instances()? {
                let record = self
                    .store
                    .get(&name)?
                    .ok_or_else(|| Error::NotFound(name.clone()))?;
                records.push(record);
            }
            return Ok(records);
        }

        let mut records = Vec::with_capacity(aliases.len());
        for alias in aliases {
            records.push(self.resolve(alias).await?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::NonInteractive;
    use crate::testing::{test_config, Answer, ScriptedPrompter, StubValidator};
    use tempfile::TempDir;

    fn open(dir: &TempDir) -> LogicHubConnection {
        LogicHubConnection::open(test_config(dir.path())).unwrap()
    }

    async fn seed(conn: &mut LogicHubConnection, name: &str, host: &str) {
        conn.store()
            .create(
                NewConnection::new(name)
                    .hostname(host)
                    .api_key("tok")
                    .verify_ssl(true),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_resolve_existing() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = open(&temp_dir);
        seed(&mut conn, "prod", "prod.example.com").await;

        let record = conn.resolve("  prod ").await.unwrap();
        assert_eq!(record.hostname, "prod.example.com");
    }

    #[tokio::test]
    async fn test_resolve_missing_creates_interactively() {
        let temp_dir = TempDir::new().unwrap();
        let prompter = Arc::new(ScriptedPrompter::new(vec![
            Answer::Text("new.example.com"),
            Answer::Choice(0),
            Answer::Text("admin"),
            Answer::Secret("pw"),
            Answer::Confirm(true),
        ]));
        let validator = Arc::new(StubValidator::default());
        let mut conn = open(&temp_dir)
            .with_prompter(prompter.clone())
            .with_validator(validator.clone());

        let record = conn.resolve("new").await.unwrap();
        assert_eq!(record.hostname, "new.example.com");
        assert_eq!(record.username(), Some("admin"));
        assert_eq!(prompter.remaining(), 0);
        assert_eq!(validator.calls().len(), 1);
        assert_eq!(conn.all_instances().unwrap(), vec!["new".to_string()]);
    }

    #[tokio::test]
    async fn test_resolve_blank_alias() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = open(&temp_dir).with_prompter(Arc::new(NonInteractive));
        assert!(matches!(conn.resolve(" ").await, Err(Error::BlankName)));
    }

    #[tokio::test]
    async fn test_resolve_default_uses_preferences() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = open(&temp_dir);
        seed(&mut conn, "prod", "prod.example.com").await;

        let err = conn.resolve_default(None).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        conn.preferences_mut()
            .set(crate::preferences::DEFAULT_INSTANCE, "prod")
            .unwrap();
        let record = conn.resolve_default(Some("")).await.unwrap();
        assert_eq!(record.name, "prod");
    }

    #[tokio::test]
    async fn test_resolve_many() {
        let temp_dir = TempDir::new().unwrap();
        let mut conn = open(&temp_dir);
        seed(&mut conn, "b", "b.example.com").await;
        seed(&mut conn, "a", "a.example.com").await;

        let all = conn.resolve_many(&[]).await.unwrap();
        let names: Vec<_> = all.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        let picked = conn
            .resolve_many(&["b".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(picked[0].hostname, "b.example.com");
        assert_eq!(picked[1].hostname, "a.example.com");
    }
}
