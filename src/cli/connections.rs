//! CLI command: `lhub connections`
//!
//! Lists, shows, creates, updates and deletes stored instance profiles.

use super::context::AppContext;
use super::prompts;
use anyhow::{anyhow, Result};
use clap::Subcommand;
use lhub_core::{
    list_credential_files, AuthType, ConnectionUpdate, CredentialRecord, Error, NewConnection,
};
use tracing::{error, info};

#[derive(Subcommand, Debug)]
pub enum ConnectionCommands {
    /// List stored instance names
    List,
    /// Show one profile, or all of them
    Show {
        /// Instance name (default: the default instance, or all)
        alias: Option<String>,
        /// Show every stored profile
        #[arg(long)]
        all: bool,
        /// Print passwords and tokens in clear text
        #[arg(long)]
        show_secure: bool,
    },
    /// Store a new instance profile
    Create {
        /// Instance name
        alias: String,
        /// Hostname, optionally with scheme and port
        #[arg(short = 's', long = "server")]
        hostname: Option<String>,
        /// Authentication type: password or api_key
        #[arg(short = 't', long = "auth-type")]
        auth_type: Option<AuthType>,
        /// API token
        #[arg(short = 'a', long = "api-key")]
        api_key: Option<String>,
        /// Username for password logins
        #[arg(short = 'u', long)]
        username: Option<String>,
        /// Password
        #[arg(short = 'p', long)]
        password: Option<String>,
        /// Do not verify the server certificate
        #[arg(short = 'n', long = "no-verify-ssl")]
        no_verify_ssl: bool,
    },
    /// Change fields of a stored profile
    Update {
        /// Instance name
        alias: String,
        /// New hostname
        #[arg(short = 's', long = "server")]
        hostname: Option<String>,
        /// Switch to token login with this API token
        #[arg(short = 'a', long = "api-key")]
        api_key: Option<String>,
        /// New username
        #[arg(short = 'u', long)]
        username: Option<String>,
        /// Switch to password login with this password
        #[arg(short = 'p', long)]
        password: Option<String>,
        /// Verify the server certificate (true/false)
        #[arg(long = "verify-ssl")]
        verify_ssl: Option<bool>,
    },
    /// Delete a stored profile
    Delete {
        /// Instance name
        alias: String,
    },
    /// List credential store files in the config directory
    Files,
}

pub async fn run(ctx: &mut AppContext, cmd: ConnectionCommands) -> Result<()> {
    match cmd {
        ConnectionCommands::List => cmd_list(ctx),
        ConnectionCommands::Show {
            alias,
            all,
            show_secure,
        } => cmd_show(ctx, alias.as_deref(), all, show_secure).await,
        ConnectionCommands::Create {
            alias,
            hostname,
            auth_type,
            api_key,
            username,
            password,
            no_verify_ssl,
        } => {
            let mut new = NewConnection::new(alias);
            if let Some(hostname) = hostname {
                new = new.hostname(hostname);
            }
            if let Some(auth_type) = auth_type {
                new = new.auth_type(auth_type);
            }
            if let Some(api_key) = api_key {
                new = new.api_key(api_key);
            }
            if let Some(username) = username {
                new = new.username(username);
            }
            if let Some(password) = password {
                new = new.password(password);
            }
            if no_verify_ssl {
                new = new.verify_ssl(false);
            }
            let record = ctx.connection.store().create(new).await?;
            println!("Connection saved: {}", record.name);
            Ok(())
        }
        ConnectionCommands::Update {
            alias,
            hostname,
            api_key,
            username,
            password,
            verify_ssl,
        } => {
            let mut update = ConnectionUpdate::new();
            if let Some(hostname) = hostname {
                update = update.hostname(hostname);
            }
            if let Some(api_key) = api_key {
                update = update.api_key(api_key);
            }
            if let Some(username) = username {
                update = update.username(username);
            }
            if let Some(password) = password {
                update = update.password(password);
            }
            if let Some(verify_ssl) = verify_ssl {
                update = update.verify_ssl(verify_ssl);
            }
            if update.is_empty() {
                return Err(anyhow!("Nothing to update"));
            }
            ctx.connection.store().update(&alias, update)?;
            println!("Connection updated: {}", alias);
            Ok(())
        }
        ConnectionCommands::Delete { alias } => {
            if ctx.connection.store().delete(&alias)? {
                println!("Connection deleted: {}", alias);
            } else {
                println!("No stored connection named {}", alias);
            }
            Ok(())
        }
        ConnectionCommands::Files => cmd_files(ctx),
    }
}

fn cmd_list(ctx: &mut AppContext) -> Result<()> {
    let names = ctx.connection.all_instances()?;
    if names.is_empty() {
        println!("No stored instances");
    } else {
        for name in names {
            println!("{}", name);
        }
    }
    Ok(())
}

fn print_record(record: &CredentialRecord, show_secure: bool) {
    println!("[{}]", record.name);
    for (key, value) in record.display_fields(show_secure).into_iter().skip(1) {
        println!("    {:<10} {}", format!("{}:", key), value);
    }
    println!();
}

async fn cmd_show(
    ctx: &mut AppContext,
    alias: Option<&str>,
    all: bool,
    show_secure: bool,
) -> Result<()> {
    let alias = match alias {
        Some(alias) => Some(alias.to_string()),
        None if all => None,
        None => ctx.settings.default_instance().map(str::to_string),
    };

    let Some(alias) = alias else {
        let names = ctx.connection.all_instances()?;
        if names.is_empty() {
            println!("No stored instances");
        }
        for name in names {
            if let Some(record) = ctx.connection.store().get(&name)? {
                print_record(&record, show_secure);
            }
        }
        return Ok(());
    };

    if let Some(record) = ctx.connection.store().get(&alias)? {
        print_record(&record, show_secure);
        return Ok(());
    }

    info!(instance = %alias, "No stored connection; creating it");
    let record = create_with_retry(ctx, &alias).await?;
    print_record(&record, show_secure);
    Ok(())
}

/// Interactive creation that offers another attempt after a rejected login
/// or certificate failure
async fn create_with_retry(ctx: &mut AppContext, alias: &str) -> Result<CredentialRecord> {
    loop {
        match ctx.connection.store().create(NewConnection::new(alias)).await {
            Ok(record) => return Ok(record),
            Err(Error::Session(e)) if e.is_auth() || e.is_ssl() => {
                error!(instance = %alias, "{}", e);
                if !prompts::confirm("Try again?", true)? {
                    return Err(Error::Session(e).into());
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

fn cmd_files(ctx: &AppContext) -> Result<()> {
    let files = list_credential_files(ctx.config_dir())?;
    if files.is_empty() {
        println!("No credential files");
    }
    for file in files {
        match file.suffix {
            Some(suffix) => println!("{}  (--credentials {})", file.file_name, suffix),
            None => println!("{}  (default)", file.file_name),
        }
    }
    Ok(())
}
