//! Credential store - encrypted connection profiles on disk
//!
//! Each credentials file holds one section per instance. Passwords and API
//! tokens are stored as RSA ciphertext tokens and only exist in plaintext
//! inside a [`SecureString`].
//!
//! - **Write-through**: create/update/delete rewrite the file immediately
//! - **Backups**: the previous file is copied to `<file>.<YYYY-MM-DD>.bak`
//!   once per calendar day
//! - **Reload**: reads re-parse the file only when its mtime changed

#![forbid(unsafe_code)]

mod backup;
mod record;
mod secure_string;
mod store;


pub use record::{Auth, AuthType, ConnectionUpdate, CredentialRecord, NewConnection};
pub use secure_string::SecureString;
pub use store::CredentialStore;

pub(crate) use backup::write_atomic;
pub(crate) use store::validate_name;
