//! CLI command: `lhub commands {list,run}`

use super::context::AppContext;
use super::users::parse_sort;
use super::OutputArgs;
use anyhow::Result;
use clap::Subcommand;
use lhub_actions::commands::{self, parse_params, RunOptions, DEFAULT_SORT};
use lhub_actions::rows::{split_list, SortKey};
use lhub_actions::ListOptions;
use tracing::error;

#[derive(Subcommand, Debug)]
pub enum CommandCommands {
    /// List commands across instances
    List {
        /// Instance names (default: all stored instances)
        instances: Vec<String>,
        /// Add a hostname column
        #[arg(long)]
        show_hostname: bool,
        /// Columns to show, comma separated ("*" for all)
        #[arg(long, value_name = "A,B")]
        attributes: Option<String>,
        /// Sort columns, comma separated; prefix with - for descending
        #[arg(long, value_name = "A,-B")]
        sort: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Run a command and print its rows
    Run {
        /// Instance name
        instance: String,
        /// Command name
        name: String,
        /// Command parameter as key=value (repeatable)
        #[arg(long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
        /// Fields to show, comma separated
        #[arg(long, value_name = "A,B", conflicts_with = "drop")]
        fields: Option<String>,
        /// Fields to hide, comma separated
        #[arg(long, value_name = "A,B")]
        drop: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
}

pub async fn run(ctx: &mut AppContext, cmd: CommandCommands) -> Result<()> {
    match cmd {
        CommandCommands::List {
            instances,
            show_hostname,
            attributes,
            sort,
            output,
        } => {
            let opts = ListOptions {
                show_hostname,
                attributes: attributes.as_deref().map(split_list).unwrap_or_default(),
                sort: parse_sort(sort.as_deref())?,
                include_inactive: false,
            };

            let sessions = ctx.sessions(&instances).await?;
            let mut rows = Vec::new();
            for session in &sessions {
                match commands::list_commands(session.api.as_ref(), &session.name, &opts).await {
                    Ok(found) => rows.extend(found),
                    Err(e) => error!(instance = %session.name, "Failed to list commands: {}", e),
                }
            }

            let sort = if opts.sort.is_empty() {
                DEFAULT_SORT.iter().map(|k| SortKey::asc(*k)).collect()
            } else {
                opts.sort
            };
            ctx.print_rows(&rows, &output, None, sort)
        }
        CommandCommands::Run {
            instance,
            name,
            params,
            fields,
            drop,
            output,
        } => {
            let params = parse_params(&params)?;
            let opts = RunOptions {
                fields: fields.as_deref().map(split_list).unwrap_or_default(),
                drop: drop.as_deref().map(split_list).unwrap_or_default(),
            };

            let (_, session) = ctx.session(Some(&instance)).await?;
            let result = commands::run_command(&session, &name, &params, &opts).await?;
            let headers = (!result.headers.is_empty()).then_some(result.headers.as_slice());
            ctx.print_rows(&result.rows, &output, headers, Vec::new())
        }
    }
}
