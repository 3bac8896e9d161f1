//! Crypto error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading keys or handling ciphertext tokens.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The directory that should hold the key pair does not exist
    #[error("Key location does not exist: {}", .0.display())]
    KeyDirNotFound(PathBuf),

    /// Exactly one half of the key pair is on disk
    #[error("Found {} but could not find {}", .found.display(), .missing.display())]
    MissingKeyHalf {
        /// The half that exists
        found: PathBuf,
        /// The half that is missing
        missing: PathBuf,
    },

    /// A key file exists but is not a PKCS#1 PEM RSA key
    #[error("Invalid key file {}: {reason}", .path.display())]
    InvalidKey {
        /// Offending file
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// The public key on disk was not derived from the private key on disk
    #[error("Public key {} does not match private key {}", .public.display(), .private.display())]
    KeyMismatch {
        /// Public key file
        public: PathBuf,
        /// Private key file
        private: PathBuf,
    },

    /// Key generation failed
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    /// Plaintext does not fit in one RSA block
    #[error("Secret is too long to encrypt ({len} bytes, max {max})")]
    MessageTooLong {
        /// Plaintext length in bytes
        len: usize,
        /// Capacity of the key
        max: usize,
    },

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    Encryption(String),

    /// Token is malformed, truncated or was produced under another key pair
    #[error("Decryption failed: {0}")]
    Decryption(String),

    /// Reading or writing a key file failed
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Result type for crypto operations
pub type Result<T> = std::result::Result<T, CryptoError>;

pub(crate) fn io_error(path: &std::path::Path) -> impl FnOnce(std::io::Error) -> CryptoError + '_ {
    move |source| CryptoError::Io {
        path: path.to_path_buf(),
        source,
    }
}
