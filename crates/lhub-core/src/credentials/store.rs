//! File-backed credential store

use super::backup::{backup_once_per_day, write_atomic};
use super::record::{Auth, AuthType, ConnectionUpdate, CredentialRecord, NewConnection};
use super::secure_string::SecureString;
use crate::error::{Error, Result};
use crate::ini::{self, Document, Section};
use crate::paths::StoreConfig;
use crate::prompt::{NonInteractive, Prompter};
use crate::session::{ConnectionParams, SessionValidator};
use lhub_crypto::{KeyPairStore, SecretCodec};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, warn};

const HOSTNAME: &str = "hostname";
const USERNAME: &str = "username";
const PASSWORD: &str = "password";
const API_KEY: &str = "api_key";
const VERIFY_SSL: &str = "verify_ssl";

/// Known keys in the order they are written
const FIELD_ORDER: [&str; 5] = [HOSTNAME, USERNAME, PASSWORD, API_KEY, VERIFY_SSL];

const AUTH_CHOICES: [&str; 2] = ["Password", "API token"];

const SSL_RETRY_PROMPT: &str =
    "SSL verification failed. Disable SSL verification for this connection?";

/// All connection profiles of one credentials file.
///
/// Every mutation is written to disk immediately, after a once-a-day backup
/// of the previous file. Reads re-parse the file only when its modification
/// time has changed since the last load.
pub struct CredentialStore {
    path: PathBuf,
    codec: SecretCodec,
    document: Document,
    loaded_mtime: Option<SystemTime>,
    prompter: Arc<dyn Prompter>,
    validator: Option<Arc<dyn SessionValidator>>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("path", &self.path)
            .field("profiles", &self.document.len())
            .field("loaded_mtime", &self.loaded_mtime)
            .finish()
    }
}

impl CredentialStore {
    /// Open the store described by `config`, generating the key pair and an
    /// empty credentials file on first use.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        let keys = KeyPairStore::open_with(&config.root, &config.keys)?;
        Self::with_codec(config, SecretCodec::new(Arc::new(keys)))
    }

    /// Open the store with an already loaded codec
    pub fn with_codec(config: &StoreConfig, codec: SecretCodec) -> Result<Self> {
        if !config.root.is_dir() {
            return Err(Error::PathNotFound {
                path: config.root.clone(),
            });
        }

        let mut store = Self {
            path: config.credentials_path(),
            codec,
            document: Document::new(),
            loaded_mtime: None,
            prompter: Arc::new(NonInteractive),
            validator: None,
        };
        store.load()?;
        Ok(store)
    }

    /// Use `prompter` for missing fields during [`create`](Self::create)
    #[must_use]
    pub fn with_prompter(mut self, prompter: Arc<dyn Prompter>) -> Self {
        self.prompter = prompter;
        self
    }

    /// Check new credentials against the remote instance before saving them
    #[must_use]
    pub fn with_validator(mut self, validator: Arc<dyn SessionValidator>) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Path of the credentials file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Codec protecting the secrets of this store
    #[must_use]
    pub fn codec(&self) -> &SecretCodec {
        &self.codec
    }

    /// Read the file from disk, creating it empty if missing
    pub fn load(&mut self) -> Result<()> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "Creating empty credentials file");
            std::fs::write(&self.path, "").map_err(Error::io(&self.path))?;
        }

        let text = std::fs::read_to_string(&self.path).map_err(Error::io(&self.path))?;
        self.document = ini::parse(&text).map_err(|e| Error::Format {
            path: self.path.clone(),
            line: e.line,
            message: e.message,
        })?;
        self.loaded_mtime = current_mtime(&self.path);

        debug!(
            path = %self.path.display(),
            profiles = self.document.len(),
            "Loaded credentials file"
        );
        Ok(())
    }

    /// Reload if the file changed since the last load. Returns whether it did.
    pub fn refresh(&mut self) -> Result<bool> {
        let on_disk = current_mtime(&self.path);
        if on_disk.is_some() && on_disk == self.loaded_mtime {
            return Ok(false);
        }
        self.load()?;
        Ok(true)
    }

    /// Sorted profile names
    pub fn list_names(&mut self) -> Result<Vec<String>> {
        self.refresh()?;
        Ok(self.document.names().map(str::to_string).collect())
    }

    /// Whether a profile exists
    pub fn contains(&mut self, name: &str) -> Result<bool> {
        self.refresh()?;
        Ok(self.document.contains(name.trim()))
    }

    /// Decrypted profile, or `None` when there is no profile called `name`
    pub fn get(&mut self, name: &str) -> Result<Option<CredentialRecord>> {
        self.refresh()?;
        let name = name.trim();
        match self.document.section(name) {
            Some(section) => self.decode(name, section).map(Some),
            None => Ok(None),
        }
    }

    /// Display view of a profile with secrets masked unless `show_secure`
    pub fn show(
        &mut self,
        name: &str,
        show_secure: bool,
    ) -> Result<Option<Vec<(&'static str, String)>>> {
        Ok(self
            .get(name)?
            .map(|record| record.display_fields(show_secure)))
    }

    /// Create a new profile, asking for whatever `new` leaves out.
    ///
    /// Conflicting input is rejected before any prompt or disk access. When a
    /// validator is configured the credentials are tried against the instance
    /// first; a certificate failure offers to turn off SSL verification and
    /// retries once.
    pub async fn create(&mut self, new: NewConnection) -> Result<CredentialRecord> {
        let name = validate_name(&new.name)?;
        let inferred = infer_auth_type(&new)?;

        if self.contains(&name)? {
            return Err(Error::AlreadyExists(name));
        }

        let hostname = match new.hostname.as_deref().map(str::trim) {
            Some(h) if !h.is_empty() => h.to_string(),
            _ => self.ask_until_filled("Hostname")?,
        };
        check_field(HOSTNAME, &hostname)?;

        let auth_type = match inferred {
            Some(t) => t,
            None => match self.prompter.ask_choice("Authentication type", &AUTH_CHOICES)? {
                0 => AuthType::Password,
                _ => AuthType::ApiKey,
            },
        };

        let auth = match auth_type {
            AuthType::Password => {
                let username = match new.username.as_deref().map(str::trim) {
                    Some(u) if !u.is_empty() => u.to_string(),
                    _ => self.ask_until_filled("Username")?,
                };
                check_field(USERNAME, &username)?;
                let password = match new.password {
                    Some(p) if !p.is_blank() => p,
                    _ => self.ask_secret_until_filled("Password")?,
                };
                Auth::Password { username, password }
            }
            AuthType::ApiKey => {
                let api_key = match new.api_key {
                    Some(k) if !k.is_blank() => k,
                    _ => self.ask_secret_until_filled("API token")?,
                };
                Auth::Token { api_key }
            }
        };

        let verify_ssl = match new.verify_ssl {
            Some(v) => v,
            None => self.prompter.confirm("Verify SSL?", true)?,
        };

        let mut params = ConnectionParams {
            hostname,
            verify_ssl,
            auth,
        };
        self.validate_remote(&name, &mut params).await?;

        let record = CredentialRecord {
            name: name.clone(),
            hostname: params.hostname,
            verify_ssl: params.verify_ssl,
            auth: params.auth,
        };
        let section = self.encode(&record)?;
        self.document.insert(name.clone(), section);
        self.write_through()?;

        info!(
            instance = %name,
            hostname = %record.hostname,
            auth_type = %record.auth_type(),
            "Connection created"
        );
        Ok(record)
    }

    /// Merge `update` into the profile `name`, creating the section if absent.
    ///
    /// The merged profile must still be a complete password or token
    /// profile; otherwise nothing is written and `Error::Validation` is
    /// returned.
    pub fn update(&mut self, name: &str, update: ConnectionUpdate) -> Result<()> {
        let name = validate_name(name)?;
        if update.password.is_some() && update.api_key.is_some() {
            return Err(both_secrets());
        }
        if update.username.is_some() && update.api_key.is_some() {
            return Err(username_with_token(&name));
        }
        if let Some(h) = &update.hostname {
            if h.trim().is_empty() {
                return Err(Error::Validation("hostname cannot be blank".to_string()));
            }
            check_field(HOSTNAME, h.trim())?;
        }
        if let Some(u) = &update.username {
            check_field(USERNAME, u.trim())?;
        }

        let password = update
            .password
            .as_ref()
            .map(|p| self.codec.encrypt(p.expose()))
            .transpose()?;
        let api_key = update
            .api_key
            .as_ref()
            .map(|k| self.codec.encrypt(k.expose()))
            .transpose()?;

        self.refresh()?;
        let mut section = self.document.section(&name).cloned().unwrap_or_default();
        let is_token = section.get(API_KEY).is_some() && password.is_none();
        if update.username.is_some() && is_token {
            return Err(username_with_token(&name));
        }

        if let Some(h) = update.hostname {
            section.set(HOSTNAME, h.trim());
        }
        if let Some(u) = update.username {
            section.set(USERNAME, u.trim());
        }
        if let Some(token) = password {
            section.set(PASSWORD, token);
            section.remove(API_KEY);
        }
        if let Some(token) = api_key {
            section.set(API_KEY, token);
            section.remove(PASSWORD);
            section.remove(USERNAME);
        }
        match update.verify_ssl {
            Some(true) => {
                section.remove(VERIFY_SSL);
            }
            Some(false) => section.set(VERIFY_SSL, "False"),
            None => {}
        }
        section.reorder(&FIELD_ORDER);

        self.decode(&name, &section)?;
        self.document.insert(name.clone(), section);
        self.write_through()?;
        debug!(instance = %name, "Connection updated");
        Ok(())
    }

    /// Remove a profile. A missing profile is not an error and leaves the file
    /// untouched; the return value tells whether anything was removed.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        self.refresh()?;
        let name = name.trim();
        if self.document.remove(name).is_none() {
            info!(instance = %name, "Connection not found, nothing to delete");
            return Ok(false);
        }
        self.write_through()?;
        info!(instance = %name, "Connection deleted");
        Ok(true)
    }

    async fn validate_remote(&self, name: &str, params: &mut ConnectionParams) -> Result<()> {
        let Some(validator) = self.validator.as_ref() else {
            return Ok(());
        };

        debug!(instance = %name, hostname = %params.hostname, "Validating connection");
        match validator.validate(params).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_ssl() && params.verify_ssl => {
                warn!(instance = %name, error = %e, "SSL verification failed");
                if !self.prompter.confirm(SSL_RETRY_PROMPT, false)? {
                    return Err(e.into());
                }
                params.verify_ssl = false;
                validator.validate(params).await?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn ask_until_filled(&self, label: &str) -> Result<String> {
        loop {
            let value = self.prompter.ask_text(&format!("{}: ", label))?;
            let value = value.trim();
            if !value.is_empty() {
                return Ok(value.to_string());
            }
            warn!(field = label, "Value cannot be blank");
        }
    }

    fn ask_secret_until_filled(&self, label: &str) -> Result<SecureString> {
        loop {
            let value = self.prompter.ask_secret(&format!("{}: ", label))?;
            if !value.is_blank() {
                return Ok(value);
            }
            warn!(field = label, "Value cannot be blank");
        }
    }

    fn decode(&self, name: &str, section: &Section) -> Result<CredentialRecord> {
        let incomplete = |what: &str| {
            Error::Validation(format!(
                "connection \"{}\" in {} is {}",
                name,
                self.path.display(),
                what
            ))
        };

        let hostname = section
            .get(HOSTNAME)
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| incomplete("missing a hostname"))?
            .to_string();

        let verify_ssl = match section.get(VERIFY_SSL) {
            None => true,
            Some(v) => ini::parse_bool(v)
                .ok_or_else(|| incomplete(&format!("using an invalid verify_ssl value {:?}", v)))?,
        };

        let auth = match (section.get(PASSWORD), section.get(API_KEY)) {
            (Some(_), Some(_)) => return Err(incomplete("holding both a password and an API token")),
            (None, Some(token)) => Auth::Token {
                api_key: self.codec.decrypt(token)?.into(),
            },
            (Some(token), None) => {
                let username = section
                    .get(USERNAME)
                    .map(str::trim)
                    .filter(|u| !u.is_empty())
                    .ok_or_else(|| incomplete("missing a username"))?
                    .to_string();
                Auth::Password {
                    username,
                    password: self.codec.decrypt(token)?.into(),
                }
            }
            (None, None) => return Err(incomplete("missing a password or API token")),
        };

        Ok(CredentialRecord {
            name: name.to_string(),
            hostname,
            verify_ssl,
            auth,
        })
    }

    fn encode(&self, record: &CredentialRecord) -> Result<Section> {
        let mut section = Section::default();
        section.set(HOSTNAME, record.hostname.as_str());
        match &record.auth {
            Auth::Password { username, password } => {
                section.set(USERNAME, username.as_str());
                section.set(PASSWORD, self.codec.encrypt(password.expose())?);
            }
            Auth::Token { api_key } => {
                section.set(API_KEY, self.codec.encrypt(api_key.expose())?);
            }
        }
        if !record.verify_ssl {
            section.set(VERIFY_SSL, "False");
        }
        Ok(section)
    }

    fn write_through(&mut self) -> Result<()> {
        backup_once_per_day(&self.path, chrono::Local::now().date_naive())?;
        write_atomic(&self.path, &self.document.render())?;
        self.loaded_mtime = None;
        Ok(())
    }
}

fn current_mtime(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Trimmed profile name, rejected if blank or unrepresentable as a section
pub(crate) fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::BlankName);
    }
    if name.contains(['[', ']', '\n', '\r']) {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(name.to_string())
}

fn check_field(field: &str, value: &str) -> Result<()> {
    ini::check_value(value).map_err(|e| Error::Validation(format!("{} {}", field, e)))
}

fn username_with_token(name: &str) -> Error {
    Error::Validation(format!(
        "connection \"{}\" uses an API token; a username cannot be set",
        name
    ))
}

fn both_secrets() -> Error {
    Error::Validation("specify either a password or an API token, not both".to_string())
}

/// Auth kind implied by the supplied fields, or `None` when it must be asked
fn infer_auth_type(new: &NewConnection) -> Result<Option<AuthType>> {
    let has_password = new.password.is_some();
    let has_token = new.api_key.is_some();

    if has_password && has_token {
        return Err(both_secrets());
    }

    match new.auth_type {
        Some(AuthType::Password) if has_token => Err(Error::Validation(
            "an API token was supplied for a password connection".to_string(),
        )),
        Some(AuthType::ApiKey) if has_password || new.username.is_some() => Err(Error::Validation(
            "a username or password was supplied for an API token connection".to_string(),
        )),
        Some(t) => Ok(Some(t)),
        None if has_token && new.username.is_some() => Err(Error::Validation(
            "a username was supplied together with an API token".to_string(),
        )),
        None if has_token => Ok(Some(AuthType::ApiKey)),
        None if has_password || new.username.is_some() => Ok(Some(AuthType::Password)),
        None => Ok(None),
    }
}
