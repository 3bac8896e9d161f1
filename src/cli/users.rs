//! CLI command: `lhub users {list,create,delete}`

use super::context::AppContext;
use super::OutputArgs;
use anyhow::Result;
use clap::Subcommand;
use lhub_actions::bulk::{deletion_sort, delete_user_everywhere};
use lhub_actions::rows::{split_list, SortKey};
use lhub_actions::users::{self, DEFAULT_SORT};
use lhub_actions::ListOptions;
use tracing::error;

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// List users across instances
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
        /// Include deleted and disabled users
        #[arg(long)]
        all: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Create a user
    Create {
        /// Instance name
        instance: String,
        /// Username
        username: String,
        /// Email address
        #[arg(long)]
        email: String,
        /// Group to add the user to (repeatable)
        #[arg(long = "group", value_name = "GROUP")]
        groups: Vec<String>,
    },
    /// Delete a user from many instances at once
    Delete {
        /// Username
        username: String,
        /// Instance names (default: all stored instances)
        instances: Vec<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
}

/// Parse `a,-b` into sort keys
pub fn parse_sort(value: Option<&str>) -> Result<Vec<SortKey>> {
    value
        .map(split_list)
        .unwrap_or_default()
        .iter()
        .map(|k| k.parse::<SortKey>().map_err(Into::into))
        .collect()
}

pub async fn run(ctx: &mut AppContext, cmd: UserCommands) -> Result<()> {
    match cmd {
        UserCommands::List {
            instances,
            show_hostname,
            attributes,
            sort,
            all,
            output,
        } => {
            let opts = ListOptions {
                show_hostname,
                attributes: attributes.as_deref().map(split_list).unwrap_or_default(),
                sort: parse_sort(sort.as_deref())?,
                include_inactive: all,
            };

            let sessions = ctx.sessions(&instances).await?;
            let mut rows = Vec::new();
            for session in &sessions {
                match users::list_users(session.api.as_ref(), &session.name, &opts).await {
                    Ok(found) => rows.extend(found),
                    Err(e) => error!(instance = %session.name, "Failed to list users: {}", e),
                }
            }

            let sort = if opts.sort.is_empty() {
                DEFAULT_SORT.iter().map(|k| SortKey::asc(*k)).collect()
            } else {
                opts.sort
            };
            ctx.print_rows(&rows, &output, None, sort)
        }
        UserCommands::Create {
            instance,
            username,
            email,
            groups,
        } => {
            let (record, session) = ctx.session(Some(&instance)).await?;
            let user = users::create_user(&session, &username, &email, &groups).await?;
            println!("Created user {} (id {}) on {}", user.name, user.user_id, record.name);
            Ok(())
        }
        UserCommands::Delete {
            username,
            instances,
            output,
        } => {
            let sessions = ctx.sessions(&instances).await?;
            let rows = delete_user_everywhere(&sessions, &username).await;
            ctx.print_rows(&rows, &output, None, deletion_sort())
        }
    }
}
