//! Settings loading
//!
//! Layers, lowest priority first: embedded defaults, the `preferences` file
//! in the config directory, then `LHUB_*` environment variables.

use anyhow::{Context, Result};
use config::{Config, ConfigError, Environment, File, FileFormat, Map, Source, Value};
use lhub_client::ClientSettings;
use lhub_core::Preferences;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Embedded default configuration (compiled into binary)
pub const DEFAULT_CONFIG: &str = include_str!("../../config/default.toml");

/// Effective settings
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// `[main]`
    pub main: MainSettings,
    /// `[commands]`
    pub commands: CommandSettings,
    /// `[http]`
    pub http: HttpSettings,
    /// `[output]`
    pub output: OutputSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MainSettings {
    #[serde(default)]
    pub default_instance: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommandSettings {
    pub table_style: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    #[serde(default)]
    pub user_agent: String,
    pub page_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputSettings {
    pub format: String,
}

impl Settings {
    /// Default instance alias, if one is configured
    pub fn default_instance(&self) -> Option<&str> {
        Some(self.main.default_instance.trim()).filter(|s| !s.is_empty())
    }

    /// HTTP client settings
    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings::default()
            .with_timeout(Duration::from_secs(self.http.timeout_secs.max(1)))
            .with_user_agent(self.http.user_agent.clone())
            .with_page_size(self.http.page_size)
    }
}

/// Preferences file entries as a config source
#[derive(Debug, Clone)]
struct PreferencesSource {
    entries: Vec<(&'static str, String)>,
}

impl PreferencesSource {
    fn new(preferences: &Preferences) -> Self {
        let entries = preferences
            .entries()
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v)))
            .collect();
        Self { entries }
    }
}

impl Source for PreferencesSource {
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
        let origin = "preferences".to_string();
        Ok(self
            .entries
            .iter()
            .map(|(key, value)| (key.to_string(), Value::new(Some(&origin), value.clone())))
            .collect())
    }
}

/// Load settings for the given config directory
pub fn load(config_dir: &Path) -> Result<Settings> {
    let preferences = Preferences::load(config_dir).context("Failed to load preferences")?;
    load_with(&preferences)
}

fn load_with(preferences: &Preferences) -> Result<Settings> {
    let config = Config::builder()
        // 1. Embedded defaults (always available)
        .add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
        // 2. Preferences file
        .add_source(PreferencesSource::new(preferences))
        // 3. Environment variables (highest priority)
        // prefix_separator("_") makes LHUB_HTTP__TIMEOUT_SECS work.
        .add_source(
            Environment::with_prefix("LHUB")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to build configuration")?;

    config
        .try_deserialize()
        .context("Failed to deserialize configuration")
}
