//! CLI command: `lhub cases {search,close}`

use super::context::AppContext;
use super::{prompts, OutputArgs};
use anyhow::{bail, Result};
use clap::Subcommand;
use lhub_actions::cases::{self, case_ids, CASE_HEADERS};
use lhub_actions::{Row, SortKey};
use serde_json::Value;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum CaseCommands {
    /// Run an advanced case search
    Search {
        /// Instance name
        instance: String,
        /// Query text; read from stdin when left out
        query: Option<String>,
        /// Maximum number of results
        #[arg(short = 'l', long)]
        limit: Option<usize>,
        /// Offer to resolve every case found
        #[arg(long)]
        close: bool,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Set the status of cases
    Close {
        /// Instance name
        instance: String,
        /// Case ids
        #[arg(required = true)]
        ids: Vec<String>,
        /// Status to set (default: Resolved)
        #[arg(long)]
        resolution: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
}

pub async fn run(ctx: &mut AppContext, cmd: CaseCommands) -> Result<()> {
    match cmd {
        CaseCommands::Search {
            instance,
            query,
            limit,
            close,
            output,
        } => {
            let query = match query {
                Some(query) => query,
                None => prompts::multi_line(
                    "Type or paste your case query below. Press enter twice when finished.\n",
                )?,
            };

            let (_, session) = ctx.session(Some(&instance)).await?;
            let rows = cases::search_cases(&session, &query, limit).await?;
            let headers: Vec<String> = CASE_HEADERS.iter().map(|h| h.to_string()).collect();
            ctx.print_rows(&rows, &output, Some(headers.as_slice()), vec![SortKey::desc("createdAt")])?;

            if !close || rows.is_empty() {
                return Ok(());
            }
            if !prompts::confirm("Proceed with closing cases?", false)? {
                return Ok(());
            }
            let results = cases::close_cases(&session, &case_ids(&rows), None).await;
            report(ctx, results, &output)
        }
        CaseCommands::Close {
            instance,
            ids,
            resolution,
            output,
        } => {
            let (_, session) = ctx.session(Some(&instance)).await?;
            let results = cases::close_cases(&session, &ids, resolution.as_deref()).await;
            report(ctx, results, &output)
        }
    }
}

fn report(ctx: &AppContext, results: Vec<cases::CloseResult>, output: &OutputArgs) -> Result<()> {
    let failed = results.iter().filter(|r| r.result.is_err()).count();
    let rows: Vec<Row> = results
        .into_iter()
        .map(|r| {
            let mut row = Row::new();
            row.insert("case".into(), Value::from(r.case_id));
            let result = match r.result {
                Ok(()) => "closed".to_string(),
                Err(e) => format!("failed: {}", e),
            };
            row.insert("result".into(), Value::from(result));
            row
        })
        .collect();

    ctx.print_rows(&rows, output, None, vec![SortKey::asc("case")])?;
    info!(closed = rows.len() - failed, failed, "Cases updated");
    if failed > 0 {
        bail!("{} of {} cases could not be closed", failed, rows.len());
    }
    Ok(())
}
