//! Credential validation through a real login

use crate::session::HttpSession;
use crate::settings::ClientSettings;
use async_trait::async_trait;
use lhub_core::{ConnectionParams, SessionError, SessionValidator};
use tracing::debug;

/// Validates new profiles by logging in once and dropping the session
#[derive(Debug, Clone, Default)]
pub struct HttpValidator {
    settings: ClientSettings,
}

impl HttpValidator {
    /// Validator using the given client settings
    #[must_use]
    pub fn new(settings: ClientSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl SessionValidator for HttpValidator {
    async fn validate(&self, params: &ConnectionParams) -> Result<(), SessionError> {
        let session = HttpSession::connect(params, &self.settings).await?;
        debug!(base = %session.base_url(), "Credentials validated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lhub_core::{Auth, SecureString};
    use std::time::Duration;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_unreachable_host_fails_validation() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let validator =
            HttpValidator::new(ClientSettings::default().with_timeout(Duration::from_secs(5)));
        let params = ConnectionParams {
            hostname: format!("http://{}", addr),
            verify_ssl: true,
            auth: Auth::Token {
                api_key: SecureString::new("t"),
            },
        };

        let err = validator.validate(&params).await.unwrap_err();
        assert!(!err.is_ssl());
        assert!(matches!(err, SessionError::Connect { .. }));
    }
}
