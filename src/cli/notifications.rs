//! CLI command: `lhub notifications disable`

use super::context::AppContext;
use super::OutputArgs;
use anyhow::Result;
use clap::Subcommand;
use lhub_actions::notifications::{disable_notifications, PREFERENCE_HEADERS};
use lhub_actions::SortKey;

#[derive(Subcommand, Debug)]
pub enum NotificationCommands {
    /// Turn off every notification for the logged-in user
    Disable {
        /// Instance name
        instance: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

pub async fn run(ctx: &mut AppContext, cmd: NotificationCommands) -> Result<()> {
    match cmd {
        NotificationCommands::Disable { instance, output } => {
            let (record, session) = ctx.session(Some(&instance)).await?;
            let rows = disable_notifications(&session).await?;
            println!("Preferences updated for {} [{}]", record.name, record.hostname);

            let headers: Vec<String> = PREFERENCE_HEADERS.iter().map(|h| h.to_string()).collect();
            ctx.print_rows(
                &rows,
                &output,
                Some(headers.as_slice()),
                vec![SortKey::asc("kind"), SortKey::asc("label")],
            )
        }
    }
}
