//! CLI command: `lhub batches {reprocess,reprocess-errors}`

use super::context::AppContext;
use anyhow::{bail, Result};
use clap::Subcommand;
use lhub_actions::batches::{reprocess_batches, reprocess_error_batches, ErrorBatchOptions};
use std::time::Duration;

#[derive(Subcommand, Debug)]
pub enum BatchCommands {
    /// Rerun batches by id
    Reprocess {
        /// Instance name
        instance: String,
        /// Batch ids
        #[arg(required = true)]
        ids: Vec<u64>,
        /// Seconds to wait between reruns
        #[arg(long, value_name = "SECS")]
        delay: Option<f64>,
    },
    /// Rerun the error batches of a stream one at a time, oldest first
    ReprocessErrors {
        /// Instance name
        instance: String,
        /// Stream id, e.g. 12 or stream-12
        stream: String,
        /// Maximum number of batches to rerun
        #[arg(short = 'l', long)]
        limit: Option<usize>,
        /// Seconds between status checks
        #[arg(long, value_name = "SECS", default_value_t = 5.0)]
        poll: f64,
    },
}

pub async fn run(ctx: &mut AppContext, cmd: BatchCommands) -> Result<()> {
    match cmd {
        BatchCommands::Reprocess {
            instance,
            ids,
            delay,
        } => {
            let delay = delay.map(seconds).transpose()?;
            let (record, session) = ctx.session(Some(&instance)).await?;
            let done = reprocess_batches(&session, &record.name, &ids, delay).await?;
            println!("Reprocessed {} batches on {}", done.len(), record.name);
            Ok(())
        }
        BatchCommands::ReprocessErrors {
            instance,
            stream,
            limit,
            poll,
        } => {
            let stream_id = parse_stream_id(&stream)?;
            let opts = ErrorBatchOptions {
                limit,
                poll_interval: seconds(poll)?,
            };
            let (record, session) = ctx.session(Some(&instance)).await?;
            let done = reprocess_error_batches(&session, &record.name, stream_id, &opts).await?;
            if done.is_empty() {
                println!("No error batches reprocessed on {}, stream {}", record.name, stream_id);
            } else {
                println!(
                    "Reprocessed {} error batches on {}, stream {}",
                    done.len(),
                    record.name,
                    stream_id
                );
            }
            Ok(())
        }
    }
}

fn seconds(secs: f64) -> Result<Duration> {
    if !secs.is_finite() || secs < 0.0 {
        bail!("Delay must be a non-negative number of seconds");
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Accept `12` as well as `stream-12`
pub fn parse_stream_id(value: &str) -> Result<u64> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    match digits.parse() {
        Ok(id) => Ok(id),
        Err(_) => bail!("Invalid stream id {:?}", value),
    }
}
