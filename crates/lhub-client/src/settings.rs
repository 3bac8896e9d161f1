//! HTTP client settings

use std::time::Duration;

/// Default request timeout
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default number of items requested from list endpoints
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Knobs for every request a session makes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    /// Per-request timeout
    pub timeout: Duration,
    /// `User-Agent` header
    pub user_agent: String,
    /// Page size for list calls (one page is fetched)
    pub page_size: usize,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: format!("lhub-cli/{}", env!("CARGO_PKG_VERSION")),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ClientSettings {
    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent; blank keeps the default
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        let user_agent = user_agent.into();
        if !user_agent.trim().is_empty() {
            self.user_agent = user_agent;
        }
        self
    }

    /// Set the list page size (at least 1)
    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }
}
