//! CLI module for lhub
//!
//! Provides commands:
//! - `connections`: manage stored instance credentials
//! - `preferences`: default instance and table style
//! - `playbooks`, `batches`, `users`, `commands`, `cases`, `notifications`:
//!   remote operations

use clap::{ArgAction, Args, Parser, Subcommand};
use lhub_actions::{OutputFormat, TableStyle};
use std::path::PathBuf;

pub mod batches;
pub mod cases;
pub mod commands;
pub mod connections;
pub mod context;
pub mod logging;
pub mod notifications;
pub mod playbooks;
pub mod preferences;
pub mod prompts;
pub mod settings;
pub mod users;

/// LogicHub command-line client
#[derive(Parser, Debug)]
#[command(name = "lhub")]
#[command(about = "Manage and script LogicHub instances")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Flags accepted by every subcommand
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Use an alternate credential store (credentials-<NAME>)
    #[arg(long = "credentials", value_name = "NAME", global = true)]
    pub credentials: Option<String>,

    /// Config directory (default: $LHUB_CONFIG_DIR or ~/.logichub)
    #[arg(long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Log level: critical, fatal, error, warning, info, debug, notset
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Debug logging for lhub (-vv for all crates)
    #[arg(short = 'v', long = "debug", action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Debug logging for all crates, including HTTP
    #[arg(long, global = true)]
    pub verbose: bool,
}

impl GlobalArgs {
    /// 0 = normal, 1 = debug for lhub, 2 = debug for everything
    pub fn verbosity(&self) -> u8 {
        if self.verbose {
            2
        } else {
            self.debug.min(2)
        }
    }
}

/// Flags for commands that print rows
#[derive(Args, Debug, Clone, Default)]
pub struct OutputArgs {
    /// Output format: table, csv, json, json_pretty
    #[arg(short = 'o', long = "output", value_name = "FORMAT")]
    pub output: Option<OutputFormat>,

    /// Table style: simple, plain, grid, github
    #[arg(short = 't', long = "table-format", value_name = "STYLE")]
    pub table_format: Option<TableStyle>,

    /// Also write the output to this file
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage stored connections
    #[command(subcommand)]
    Connections(connections::ConnectionCommands),
    /// Show or change preferences
    #[command(subcommand)]
    Preferences(preferences::PreferenceCommands),
    /// Playbook operations
    #[command(subcommand)]
    Playbooks(playbooks::PlaybookCommands),
    /// Batch operations
    #[command(subcommand)]
    Batches(batches::BatchCommands),
    /// User management
    #[command(subcommand)]
    Users(users::UserCommands),
    /// List and run commands
    #[command(subcommand)]
    Commands(commands::CommandCommands),
    /// Search and close cases
    #[command(subcommand)]
    Cases(cases::CaseCommands),
    /// Notification preferences of the logged-in user
    #[command(subcommand)]
    Notifications(notifications::NotificationCommands),
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    };

    let mut ctx = context::AppContext::open(&cli.global)?;
    match command {
        Commands::Connections(cmd) => connections::run(&mut ctx, cmd).await,
        Commands::Preferences(cmd) => preferences::run(&mut ctx, cmd),
        Commands::Playbooks(cmd) => playbooks::run(&mut ctx, cmd).await,
        Commands::Batches(cmd) => batches::run(&mut ctx, cmd).await,
        Commands::Users(cmd) => users::run(&mut ctx, cmd).await,
        Commands::Commands(cmd) => commands::run(&mut ctx, cmd).await,
        Commands::Cases(cmd) => cases::run(&mut ctx, cmd).await,
        Commands::Notifications(cmd) => notifications::run(&mut ctx, cmd).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "lhub",
            "users",
            "list",
            "prod",
            "--credentials",
            "acme",
            "-vv",
            "-o",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.global.credentials.as_deref(), Some("acme"));
        assert_eq!(cli.global.verbosity(), 2);
        match cli.command {
            Some(Commands::Users(users::UserCommands::List { instances, output, .. })) => {
                assert_eq!(instances, vec!["prod"]);
                assert_eq!(output.output, Some(OutputFormat::Json));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reprocess_errors_args() {
        let cli = Cli::try_parse_from([
            "lhub", "batches", "reprocess-errors", "prod", "stream-12", "-l", "3", "--poll", "0.5",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Batches(batches::BatchCommands::ReprocessErrors {
                instance,
                stream,
                limit,
                poll,
            })) => {
                assert_eq!(instance, "prod");
                assert_eq!(batches::parse_stream_id(&stream).unwrap(), 12);
                assert_eq!(limit, Some(3));
                assert_eq!(poll, 0.5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
