//! LHub Crypto - key pair storage and secret tokens.
//!
//! Secrets stored in a credentials file are encrypted with an RSA key pair
//! kept next to that file:
//! - `.lhub.pub` / `.lhub.pem` hold the PKCS#1 PEM encoded halves
//! - a missing pair is generated on first use (4096 bits by default)
//! - ciphertext is RSA PKCS#1 v1.5, base64 encoded so it fits in a text file
//!
//! The private key file carries no passphrase. Filesystem permissions on the
//! containing directory are the only protection boundary.

#![forbid(unsafe_code)]

mod codec;
mod error;
mod keypair;

pub use codec::SecretCodec;
pub use error::{CryptoError, Result};
pub use keypair::{
    KeyOptions, KeyPairStore, DEFAULT_KEY_BITS, DEFAULT_PRIVATE_KEY_FILE, DEFAULT_PUBLIC_KEY_FILE,
};

pub use zeroize::Zeroizing;
