//! Connection profile types

use super::secure_string::SecureString;
use crate::error::Error;
use crate::session::ConnectionParams;
use std::fmt;
use std::str::FromStr;

/// How an instance is authenticated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthType {
    /// Username and password login
    Password,
    /// API token sent with every request
    ApiKey,
}

impl AuthType {
    /// Name used on the command line and in logs
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::Password => "password",
            AuthType::ApiKey => "api_key",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "password" => Ok(AuthType::Password),
            "api_key" | "token" | "api_token" => Ok(AuthType::ApiKey),
            other => Err(Error::Validation(format!(
                "unknown auth type {:?} (expected password or api_key)",
                other
            ))),
        }
    }
}

/// Credentials of one profile. A profile has a password login or a token,
/// never both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Auth {
    /// Username and password
    Password {
        /// Login name
        username: String,
        /// Decrypted password
        password: SecureString,
    },
    /// API token
    Token {
        /// Decrypted token
        api_key: SecureString,
    },
}

impl Auth {
    /// Which kind of credentials these are
    #[must_use]
    pub fn auth_type(&self) -> AuthType {
        match self {
            Auth::Password { .. } => AuthType::Password,
            Auth::Token { .. } => AuthType::ApiKey,
        }
    }
}

/// One decrypted connection profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRecord {
    /// Profile name (section name in the store file)
    pub name: String,
    /// Instance hostname
    pub hostname: String,
    /// Whether the server certificate is checked
    pub verify_ssl: bool,
    /// Login credentials
    pub auth: Auth,
}

impl CredentialRecord {
    /// Username for password profiles
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        match &self.auth {
            Auth::Password { username, .. } => Some(username),
            Auth::Token { .. } => None,
        }
    }

    /// Password for password profiles
    #[must_use]
    pub fn password(&self) -> Option<&SecureString> {
        match &self.auth {
            Auth::Password { password, .. } => Some(password),
            Auth::Token { .. } => None,
        }
    }

    /// Token for token profiles
    #[must_use]
    pub fn api_key(&self) -> Option<&SecureString> {
        match &self.auth {
            Auth::Token { api_key } => Some(api_key),
            Auth::Password { .. } => None,
        }
    }

    /// Auth kind
    #[must_use]
    pub fn auth_type(&self) -> AuthType {
        self.auth.auth_type()
    }

    /// Parameters for opening a remote session
    #[must_use]
    pub fn params(&self) -> ConnectionParams {
        ConnectionParams {
            hostname: self.hostname.clone(),
            verify_ssl: self.verify_ssl,
            auth: self.auth.clone(),
        }
    }

    /// Field/value pairs for display. Secrets are masked unless `show_secure`.
    #[must_use]
    pub fn display_fields(&self, show_secure: bool) -> Vec<(&'static str, String)> {
        let secret = |s: &SecureString| {
            if show_secure {
                s.expose().to_string()
            } else {
                s.masked()
            }
        };

        let mut fields = vec![("name", self.name.clone()), ("hostname", self.hostname.clone())];
        match &self.auth {
            Auth::Password { username, password } => {
                fields.push(("username", username.clone()));
                fields.push(("password", secret(password)));
            }
            Auth::Token { api_key } => fields.push(("api_key", secret(api_key))),
        }
        fields.push(("verify_ssl", self.verify_ssl.to_string()));
        fields
    }
}

/// Input to [`CredentialStore::create`](super::CredentialStore::create).
///
/// Anything left unset is asked for interactively.
#[derive(Debug, Clone, Default)]
pub struct NewConnection {
    pub(crate) name: String,
    pub(crate) hostname: Option<String>,
    pub(crate) auth_type: Option<AuthType>,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<SecureString>,
    pub(crate) api_key: Option<SecureString>,
    pub(crate) verify_ssl: Option<bool>,
}

impl NewConnection {
    /// Start a new profile called `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Profile name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Instance hostname
    #[must_use]
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// Force the auth kind instead of inferring or asking
    #[must_use]
    pub fn auth_type(mut self, auth_type: AuthType) -> Self {
        self.auth_type = Some(auth_type);
        self
    }

    /// Login name
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Password
    #[must_use]
    pub fn password(mut self, password: impl Into<SecureString>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// API token
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<SecureString>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Certificate verification; asked for when unset
    #[must_use]
    pub fn verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = Some(verify_ssl);
        self
    }
}

/// Fields to merge into an existing profile with
/// [`CredentialStore::update`](super::CredentialStore::update)
#[derive(Debug, Clone, Default)]
pub struct ConnectionUpdate {
    pub(crate) hostname: Option<String>,
    pub(crate) username: Option<String>,
    pub(crate) password: Option<SecureString>,
    pub(crate) api_key: Option<SecureString>,
    pub(crate) verify_ssl: Option<bool>,
}

impl ConnectionUpdate {
    /// Empty update
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// New hostname
    #[must_use]
    pub fn hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = Some(hostname.into());
        self
    }

    /// New login name
    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// New password; switches the profile to password auth
    #[must_use]
    pub fn password(mut self, password: impl Into<SecureString>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// New token; switches the profile to token auth
    #[must_use]
    pub fn api_key(mut self, api_key: impl Into<SecureString>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// New certificate verification setting
    #[must_use]
    pub fn verify_ssl(mut self, verify_ssl: bool) -> Self {
        self.verify_ssl = Some(verify_ssl);
        self
    }

    /// True when no field is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hostname.is_none()
            && self.username.is_none()
            && self.password.is_none()
            && self.api_key.is_none()
            && self.verify_ssl.is_none()
    }
}

impl From<&CredentialRecord> for ConnectionUpdate {
    fn from(record: &CredentialRecord) -> Self {
        let update = ConnectionUpdate::new()
            .hostname(record.hostname.clone())
            .verify_ssl(record.verify_ssl);
        match &record.auth {
            Auth::Password { username, password } => {
                update.username(username.clone()).password(password.clone())
            }
            Auth::Token { api_key } => update.api_key(api_key.clone()),
        }
    }
}
