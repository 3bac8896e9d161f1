//! CLI command: `lhub playbooks export`

use super::context::AppContext;
use anyhow::{bail, Result};
use clap::Subcommand;
use lhub_actions::export_playbooks;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum PlaybookCommands {
    /// Export every playbook into a dated folder
    Export {
        /// Instance name
        instance: String,
        /// Parent folder for the export
        dir: PathBuf,
        /// Export only the first N playbooks (by id)
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },
}

pub async fn run(ctx: &mut AppContext, cmd: PlaybookCommands) -> Result<()> {
    match cmd {
        PlaybookCommands::Export {
            instance,
            dir,
            limit,
        } => {
            let (_, session) = ctx.session(Some(&instance)).await?;
            let summary = export_playbooks(&session, &dir, limit).await?;

            println!(
                "Exported {} playbooks to {}",
                summary.exported.len(),
                summary.folder.display()
            );
            if summary.is_success() {
                return Ok(());
            }
            for (flow_id, failed) in &summary.failed {
                println!("  FAILED {} ({}): {}", flow_id, failed.name, failed.errors.join("; "));
            }
            bail!(
                "{} playbooks failed to export; see {}",
                summary.failed.len(),
                summary.folder.join(lhub_actions::playbooks::FAILURES_LOG).display()
            )
        }
    }
}
