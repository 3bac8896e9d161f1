//! Error types for convenience operations

use lhub_core::SessionError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for actions
pub type Result<T> = std::result::Result<T, ActionError>;

/// Failure of a convenience operation
#[derive(Debug, Error)]
pub enum ActionError {
    /// The remote call failed
    #[error(transparent)]
    Api(#[from] SessionError),

    /// Bad user input (parameters, field lists, sort keys)
    #[error("{0}")]
    InvalidInput(String),

    /// A named remote object does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A batch failed again or reported a state this client does not know
    #[error("{0}")]
    Batch(String),

    /// A downloaded export could not be decoded or saved
    #[error("{0}")]
    Export(String),

    /// File system failure
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path being read or written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding of output failed
    #[error("Failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ActionError {
    /// Build a mapper that tags an I/O error with the path it happened on
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> ActionError {
        let path = path.into();
        move |source| ActionError::Io { path, source }
    }
}
