//! CLI command: `lhub preferences {show,set,unset}`

use super::context::AppContext;
use anyhow::Result;
use clap::Subcommand;
use lhub_actions::TableStyle;
use lhub_core::preferences::TABLE_STYLE;

#[derive(Subcommand, Debug)]
pub enum PreferenceCommands {
    /// Show every preference
    Show,
    /// Set a preference (main.default_instance or commands.table_style)
    Set {
        /// Preference key; the section may be left out
        key: String,
        /// New value
        value: String,
    },
    /// Clear a preference
    Unset {
        /// Preference key
        key: String,
    },
}

pub fn run(ctx: &mut AppContext, cmd: PreferenceCommands) -> Result<()> {
    match cmd {
        PreferenceCommands::Show => {
            for (key, value) in ctx.connection.preferences().entries() {
                println!("{:<24} {}", key, value.as_deref().unwrap_or("(not set)"));
            }
            Ok(())
        }
        PreferenceCommands::Set { key, value } => {
            let key_name = key.trim();
            let is_style = key_name == TABLE_STYLE || Some(key_name) == TABLE_STYLE.rsplit('.').next();
            if is_style && !value.trim().is_empty() {
                value.parse::<TableStyle>()?;
            }
            let preferences = ctx.connection.preferences_mut();
            preferences.set(&key, &value)?;
            preferences.save()?;
            println!("Saved {} = {}", key.trim(), value.trim());
            Ok(())
        }
        PreferenceCommands::Unset { key } => {
            let preferences = ctx.connection.preferences_mut();
            preferences.unset(&key)?;
            preferences.save()?;
            println!("Cleared {}", key.trim());
            Ok(())
        }
    }
}
