//! LHub Core - credential management for the LogicHub CLI
//!
//! This crate owns everything needed to turn an instance alias into usable
//! connection credentials:
//! - Paths: the `~/.logichub` layout, default and alternate credential files
//! - Credentials: the encrypted, file-backed store with dated backups
//! - Connection: alias resolution with interactive creation on first use
//! - Preferences: user-level defaults (default instance, table style)
//!
//! Terminal I/O and the remote platform are reached only through the
//! [`Prompter`] and [`SessionValidator`] traits so the store can run headless.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod connection;
pub mod credentials;
pub mod error;
pub mod ini;
pub mod paths;
pub mod preferences;
pub mod prompt;
pub mod session;

#[cfg(test)]
mod testing;

pub use connection::LogicHubConnection;
pub use credentials::{
    Auth, AuthType, ConnectionUpdate, CredentialRecord, CredentialStore, NewConnection,
    SecureString,
};
pub use error::{format_error_for_cli, Error, Result};
pub use paths::{default_config_dir, list_credential_files, StoreConfig, StoreFile};
pub use preferences::Preferences;
pub use prompt::{NonInteractive, Prompter};
pub use session::{ConnectionParams, SessionError, SessionValidator};

pub use lhub_crypto::{CryptoError, KeyOptions};
