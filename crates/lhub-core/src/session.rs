//! Remote session seam: what the store needs to validate new credentials

use crate::credentials::{Auth, SecureString};
use async_trait::async_trait;
use thiserror::Error;

/// Everything needed to open a session against one instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    /// Instance hostname, optionally with scheme and port
    pub hostname: String,
    /// Whether the server certificate is checked
    pub verify_ssl: bool,
    /// Password or token credentials
    pub auth: Auth,
}

impl ConnectionParams {
    /// Username for password logins
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        match &self.auth {
            Auth::Password { username, .. } => Some(username),
            Auth::Token { .. } => None,
        }
    }

    /// Password for password logins
    #[must_use]
    pub fn password(&self) -> Option<&SecureString> {
        match &self.auth {
            Auth::Password { password, .. } => Some(password),
            Auth::Token { .. } => None,
        }
    }

    /// API token for token logins
    #[must_use]
    pub fn api_key(&self) -> Option<&SecureString> {
        match &self.auth {
            Auth::Token { api_key } => Some(api_key),
            Auth::Password { .. } => None,
        }
    }
}

/// Failure to open a remote session.
///
/// `Ssl` is kept apart from the rest because it is the one failure the
/// creation flow can recover from.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Server certificate could not be verified
    #[error("SSL verification failed for {host}: {message}")]
    Ssl {
        /// Host that was contacted
        host: String,
        /// TLS error text
        message: String,
    },

    /// Credentials were rejected
    #[error("Authentication failed for {host}: {message}")]
    Auth {
        /// Host that was contacted
        host: String,
        /// Server response or reason
        message: String,
    },

    /// Host unreachable or timed out
    #[error("Could not connect to {host}: {message}")]
    Connect {
        /// Host that was contacted
        host: String,
        /// Transport error text
        message: String,
    },

    /// Unexpected HTTP status
    #[error("HTTP {status} from {host}: {body}")]
    Http {
        /// Host that was contacted
        host: String,
        /// Status code
        status: u16,
        /// Response body, truncated
        body: String,
    },

    /// Response body did not have the expected shape
    #[error("Unexpected response from {host}: {message}")]
    Decode {
        /// Host that was contacted
        host: String,
        /// Decoder message
        message: String,
    },

    /// Anything else (bad hostname, client construction)
    #[error("{0}")]
    Other(String),
}

impl SessionError {
    /// True for certificate verification failures
    #[must_use]
    pub fn is_ssl(&self) -> bool {
        matches!(self, SessionError::Ssl { .. })
    }

    /// True for rejected credentials
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self, SessionError::Auth { .. })
    }
}

/// Opens a throwaway session to prove credentials work
#[async_trait]
pub trait SessionValidator: Send + Sync {
    /// Connect and authenticate once with `params`
    async fn validate(&self, params: &ConnectionParams) -> Result<(), SessionError>;
}
