//! Error types for lhub-core

use crate::session::SessionError;
use lhub_crypto::CryptoError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// A directory or file the caller pointed at does not exist
    #[error("Path not found: {}", .path.display())]
    PathNotFound {
        /// Missing path
        path: PathBuf,
    },

    /// Home directory could not be determined
    #[error("Failed to determine the LogicHub config directory")]
    NoConfigDir,

    /// Key pair problems and undecryptable secrets
    #[error("Encryption key error: {0}")]
    Crypto(CryptoError),

    /// Instance name was empty or whitespace
    #[error("Instance name cannot be blank")]
    BlankName,

    /// Instance name contains characters the credentials file cannot hold
    #[error("Invalid instance name {0:?}: names cannot contain '[', ']' or line breaks")]
    InvalidName(String),

    /// Rejected input (conflicting auth fields, unknown keys, ...)
    #[error("Invalid input: {0}")]
    Validation(String),

    /// `create` was called for a name that is already stored
    #[error("Connection \"{0}\" already exists")]
    AlreadyExists(String),

    /// A connection could not be found after creation
    #[error("Connection \"{0}\" not found")]
    NotFound(String),

    /// Credential or preferences file could not be parsed
    #[error("Invalid file {}: line {line}: {message}", .path.display())]
    Format {
        /// File being parsed
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// Parser message
        message: String,
    },

    /// A value had to be collected interactively but no prompt is available
    #[error("{0} is required but interactive input is not available")]
    InputRequired(String),

    /// The prompt itself failed
    #[error("Prompt failed: {0}")]
    Prompt(String),

    /// The user aborted a prompt
    #[error("Canceled by user")]
    Cancelled,

    /// Remote validation of new credentials failed
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Filesystem error
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<CryptoError> for Error {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::KeyDirNotFound(path) => Error::PathNotFound { path },
            other => Error::Crypto(other),
        }
    }
}

impl Error {
    /// Wrap an I/O error with the path it happened on
    pub fn io(path: impl AsRef<Path>) -> impl FnOnce(std::io::Error) -> Error {
        let path = path.as_ref().to_path_buf();
        move |source| Error::Io { path, source }
    }

    /// Whether the error was caused by what the user typed or passed in
    #[must_use]
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Error::BlankName
                | Error::InvalidName(_)
                | Error::Validation(_)
                | Error::AlreadyExists(_)
                | Error::NotFound(_)
                | Error::PathNotFound { .. }
                | Error::Cancelled
        )
    }

    /// Hint shown after the message on the command line
    #[must_use]
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::Crypto(CryptoError::Decryption(_)) => Some(
                "the credentials file was encrypted with a different key pair; recreate the connection",
            ),
            Error::Crypto(CryptoError::MissingKeyHalf { .. }) => {
                Some("restore the missing key file from a backup or remove both key files")
            }
            Error::AlreadyExists(_) => Some("delete the connection first or pick another name"),
            Error::InputRequired(_) => Some("pass the value as a command-line option"),
            Error::Session(SessionError::Ssl { .. }) => {
                Some("use --no-verify-ssl for hosts with self-signed certificates")
            }
            _ => None,
        }
    }
}

/// Format an error as a single line for the command line
pub fn format_error_for_cli(error: &Error) -> String {
    match error.suggestion() {
        Some(hint) => format!("{} (hint: {})", error, hint),
        None => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_dir_maps_to_path_not_found() {
        let err: Error = CryptoError::KeyDirNotFound(PathBuf::from("/missing")).into();
        assert!(matches!(err, Error::PathNotFound { ref path } if path == Path::new("/missing")));
        assert!(err.is_user_error());
    }

    #[test]
    fn test_decryption_is_encryption_key_error() {
        let err: Error = CryptoError::Decryption("bad padding".to_string()).into();
        assert!(matches!(err, Error::Crypto(_)));
        assert!(!err.is_user_error());
        assert!(format_error_for_cli(&err).contains("hint:"));
    }

    #[test]
    fn test_cli_format_is_single_line() {
        let err = Error::AlreadyExists("prod".to_string());
        let line = format_error_for_cli(&err);
        assert!(line.starts_with("Connection \"prod\" already exists"));
        assert!(!line.contains('\n'));
    }
}
