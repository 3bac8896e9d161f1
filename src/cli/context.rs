//! Shared state for one CLI invocation

use super::prompts::TerminalPrompter;
use super::settings::{self, Settings};
use super::{GlobalArgs, OutputArgs};
use anyhow::{bail, Context, Result};
use lhub_actions::output::{self, RenderOptions};
use lhub_actions::{connect_all, NamedSession, OutputFormat, Row, SortKey, TableStyle};
use lhub_client::{ClientSettings, HttpSession, HttpValidator};
use lhub_core::{default_config_dir, CredentialRecord, LogicHubConnection, StoreConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Config directory, settings and the connection facade
pub struct AppContext {
    pub connection: LogicHubConnection,
    pub settings: Settings,
    pub client: ClientSettings,
    config_dir: PathBuf,
}

impl AppContext {
    /// Create the config directory if needed and open the credential store
    pub fn open(global: &GlobalArgs) -> Result<Self> {
        let config_dir = match &global.config_dir {
            Some(dir) => dir.clone(),
            None => default_config_dir()?,
        };
        std::fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory {}", config_dir.display())
        })?;
        debug!(path = %config_dir.display(), "Using config directory");

        let settings = settings::load(&config_dir)?;
        let client = settings.client_settings();
        let store_config = StoreConfig::new(&config_dir).alternate(global.credentials.as_deref())?;

        let connection = LogicHubConnection::open(store_config)?
            .with_prompter(Arc::new(TerminalPrompter))
            .with_validator(Arc::new(HttpValidator::new(client.clone())));

        Ok(Self {
            connection,
            settings,
            client,
            config_dir,
        })
    }

    /// Directory holding keys, credential stores and preferences
    pub fn config_dir(&self) -> &std::path::Path {
        &self.config_dir
    }

    /// Resolve an alias (or the default instance) and log in
    pub async fn session(&mut self, alias: Option<&str>) -> Result<(CredentialRecord, HttpSession)> {
        let alias = alias.or(self.settings.default_instance()).map(str::to_string);
        let record = self.connection.resolve_default(alias.as_deref()).await?;
        let session = HttpSession::connect(&record.params(), &self.client)
            .await
            .with_context(|| format!("Failed to connect to {}", record.name))?;
        Ok((record, session))
    }

    /// Resolve every alias (all stored instances when empty) and log in to
    /// each concurrently. Instances that fail are logged and skipped.
    pub async fn sessions(&mut self, aliases: &[String]) -> Result<Vec<NamedSession>> {
        let records = self.connection.resolve_many(aliases).await?;
        if records.is_empty() {
            bail!("No stored instances");
        }

        let client = self.client.clone();
        let results = connect_all(&records, |record| {
            let params = record.params();
            let client = client.clone();
            async move { HttpSession::connect(&params, &client).await }
        })
        .await;

        let total = results.len();
        let mut sessions = Vec::with_capacity(total);
        for (name, result) in results {
            match result {
                Ok(session) => sessions.push(NamedSession::new(name, Box::new(session))),
                Err(e) => error!(instance = %name, "Skipping instance: {}", e),
            }
        }
        if sessions.is_empty() {
            bail!("Could not connect to any of {} instances", total);
        }
        if sessions.len() < total {
            warn!(connected = sessions.len(), total, "Some instances were skipped");
        }
        Ok(sessions)
    }

    /// Render options from flags, preferences and settings
    pub fn render_options(&self, args: &OutputArgs) -> Result<RenderOptions> {
        let format = match args.output {
            Some(format) => format,
            None => self.settings.output.format.parse::<OutputFormat>()?,
        };
        let style = match args.table_format {
            Some(style) => style,
            None => self.settings.commands.table_style.parse::<TableStyle>()?,
        };
        Ok(RenderOptions::new(format)
            .with_style(style)
            .with_file(args.file.clone()))
    }

    /// Render rows and print them
    pub fn print_rows(
        &self,
        rows: &[Row],
        args: &OutputArgs,
        headers: Option<&[String]>,
        sort: Vec<SortKey>,
    ) -> Result<()> {
        let mut opts = self.render_options(args)?.with_sort(sort);
        if let Some(headers) = headers {
            opts = opts.with_headers(headers.iter().cloned());
        }
        let text = output::emit(rows, &opts)?;
        println!("{}", text);
        Ok(())
    }
}
