//! Log setup: `RUST_LOG` wins, otherwise the CLI flags decide

use anyhow::{bail, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates whose logs `-v` turns up
const OWN_CRATES: [&str; 5] = ["lhub", "lhub_core", "lhub_client", "lhub_actions", "lhub_crypto"];

/// Map a `--log-level` name onto a tracing level directive
pub fn level_directive(level: &str) -> Result<&'static str> {
    Ok(match level.trim().to_ascii_lowercase().as_str() {
        "critical" | "fatal" | "error" => "error",
        "warn" | "warning" => "warn",
        "info" => "info",
        "debug" => "debug",
        "notset" => "off",
        other => bail!(
            "Invalid log level {:?} (expected critical, fatal, error, warn, warning, info, debug or notset)",
            other
        ),
    })
}

/// Filter directives for the given flags.
///
/// `verbosity` 1 turns on debug for the lhub crates, 2 for everything.
pub fn filter_directives(level: Option<&str>, verbosity: u8) -> Result<String> {
    if verbosity >= 2 {
        return Ok("debug".to_string());
    }

    let own = if verbosity == 1 {
        "debug"
    } else {
        match level {
            Some(level) => level_directive(level)?,
            None => "info",
        }
    };
    let mut directives = vec!["warn".to_string()];
    if own == "off" {
        directives[0] = "off".to_string();
    }
    directives.extend(OWN_CRATES.iter().map(|c| format!("{}={}", c, own)));
    Ok(directives.join(","))
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for results.
pub fn init(level: Option<&str>, verbosity: u8) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(filter_directives(level, verbosity)?)?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(verbosity > 0)
                .with_writer(std::io::stderr),
        )
        .try_init()?;
    Ok(())
}
