//! lhub - LogicHub command-line client
//!
//! Entry point: parse flags, set up logging, run one command.

#![forbid(unsafe_code)]

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error};

mod cli;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();

    let cli = cli::Cli::parse();
    if let Err(e) = cli::logging::init(cli.global.log_level.as_deref(), cli.global.verbosity()) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }
    debug!(version = env!("CARGO_PKG_VERSION"), "Starting lhub");

    let result = tokio::select! {
        result = cli::run(cli) => result,
        _ = tokio::signal::ctrl_c() => Err(lhub_core::Error::Cancelled.into()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let cancelled = e
                .chain()
                .filter_map(|c| c.downcast_ref::<lhub_core::Error>())
                .any(|c| matches!(c, lhub_core::Error::Cancelled));
            if cancelled {
                error!("Canceled by user");
            } else if let Some(err) = e.downcast_ref::<lhub_core::Error>() {
                error!("Failed with exception: {}", lhub_core::format_error_for_cli(err));
            } else {
                error!("Failed with exception: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}
