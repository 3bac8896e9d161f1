//! RSA key pair persisted as two PEM files

use crate::error::{io_error, CryptoError, Result};
use rsa::pkcs1::{
    DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding,
};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey, RsaPublicKey};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zeroize::Zeroizing;

/// Default public key file name
pub const DEFAULT_PUBLIC_KEY_FILE: &str = ".lhub.pub";

/// Default private key file name
pub const DEFAULT_PRIVATE_KEY_FILE: &str = ".lhub.pem";

/// Modulus size used when a new pair is generated
pub const DEFAULT_KEY_BITS: usize = 4096;

/// PKCS#1 v1.5 padding overhead in bytes
const PKCS1_PADDING: usize = 11;

/// File names and key size for a key pair location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyOptions {
    /// Public key file name inside the key directory
    pub public_file: String,
    /// Private key file name inside the key directory
    pub private_file: String,
    /// Modulus size for newly generated pairs
    pub bits: usize,
}

impl Default for KeyOptions {
    fn default() -> Self {
        Self {
            public_file: DEFAULT_PUBLIC_KEY_FILE.to_string(),
            private_file: DEFAULT_PRIVATE_KEY_FILE.to_string(),
            bits: DEFAULT_KEY_BITS,
        }
    }
}

impl KeyOptions {
    /// Override the file names. Blank overrides keep the defaults.
    #[must_use]
    pub fn with_files(mut self, public_file: Option<&str>, private_file: Option<&str>) -> Self {
        if let Some(name) = public_file.map(str::trim).filter(|n| !n.is_empty()) {
            self.public_file = name.to_string();
        }
        if let Some(name) = private_file.map(str::trim).filter(|n| !n.is_empty()) {
            self.private_file = name.to_string();
        }
        self
    }

    /// Override the modulus size for generated pairs
    #[must_use]
    pub fn with_bits(mut self, bits: usize) -> Self {
        self.bits = bits;
        self
    }
}

/// Owner of the RSA key pair for one credential directory.
///
/// After construction both halves are loaded in memory. No other type sees the
/// raw key material; [`crate::SecretCodec`] encrypts and decrypts through it.
pub struct KeyPairStore {
    public_path: PathBuf,
    private_path: PathBuf,
    public: RsaPublicKey,
    private: RsaPrivateKey,
}

impl KeyPairStore {
    /// Open the key pair in `dir` using the default file names and size
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(dir, &KeyOptions::default())
    }

    /// Open the key pair in `dir`, generating it when neither file exists.
    pub fn open_with(dir: impl AsRef<Path>, options: &KeyOptions) -> Result<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(CryptoError::KeyDirNotFound(dir.to_path_buf()));
        }

        let public_path = dir.join(&options.public_file);
        let private_path = dir.join(&options.private_file);

        match (public_path.exists(), private_path.exists()) {
            (false, false) => Self::generate(public_path, private_path, options.bits),
            (true, false) => Err(CryptoError::MissingKeyHalf {
                found: public_path,
                missing: private_path,
            }),
            (false, true) => Err(CryptoError::MissingKeyHalf {
                found: private_path,
                missing: public_path,
            }),
            (true, true) => Self::load(public_path, private_path),
        }
    }

    fn generate(public_path: PathBuf, private_path: PathBuf, bits: usize) -> Result<Self> {
        info!(bits, "Existing encryption keys not found, generating a new key pair");

        let mut rng = rand::thread_rng();
        let private = RsaPrivateKey::new(&mut rng, bits)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public = RsaPublicKey::from(&private);

        let public_pem = public
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let private_pem = private
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;

        std::fs::write(&public_path, public_pem.as_bytes()).map_err(io_error(&public_path))?;
        std::fs::write(&private_path, private_pem.as_bytes()).map_err(io_error(&private_path))?;

        info!(
            public = %public_path.display(),
            private = %private_path.display(),
            "Keys successfully generated"
        );

        Ok(Self {
            public_path,
            private_path,
            public,
            private,
        })
    }

    fn load(public_path: PathBuf, private_path: PathBuf) -> Result<Self> {
        let public_pem = std::fs::read_to_string(&public_path).map_err(io_error(&public_path))?;
        let private_pem = Zeroizing::new(
            std::fs::read_to_string(&private_path).map_err(io_error(&private_path))?,
        );

        let public = RsaPublicKey::from_pkcs1_pem(public_pem.trim()).map_err(|e| {
            CryptoError::InvalidKey {
                path: public_path.clone(),
                reason: e.to_string(),
            }
        })?;
        let private = RsaPrivateKey::from_pkcs1_pem(private_pem.trim()).map_err(|e| {
            CryptoError::InvalidKey {
                path: private_path.clone(),
                reason: e.to_string(),
            }
        })?;

        if RsaPublicKey::from(&private) != public {
            return Err(CryptoError::KeyMismatch {
                public: public_path,
                private: private_path,
            });
        }

        debug!(public = %public_path.display(), "Loaded encryption keys");
        Ok(Self {
            public_path,
            private_path,
            public,
            private,
        })
    }

    /// Path of the public key file
    #[must_use]
    pub fn public_key_path(&self) -> &Path {
        &self.public_path
    }

    /// Path of the private key file
    #[must_use]
    pub fn private_key_path(&self) -> &Path {
        &self.private_path
    }

    /// Modulus size in bits
    #[must_use]
    pub fn bits(&self) -> usize {
        self.public.size() * 8
    }

    /// Largest plaintext (in bytes) that fits in one block
    #[must_use]
    pub fn max_plaintext_len(&self) -> usize {
        self.public.size().saturating_sub(PKCS1_PADDING)
    }

    pub(crate) fn encrypt_bytes(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let max = self.max_plaintext_len();
        if plaintext.len() > max {
            return Err(CryptoError::MessageTooLong {
                len: plaintext.len(),
                max,
            });
        }
        self.public
            .encrypt(&mut rand::thread_rng(), Pkcs1v15Encrypt, plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))
    }

    pub(crate) fn decrypt_bytes(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        self.private
            .decrypt(Pkcs1v15Encrypt, ciphertext)
            .map(Zeroizing::new)
            .map_err(|e| CryptoError::Decryption(e.to_string()))
    }
}

impl std::fmt::Debug for KeyPairStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPairStore")
            .field("public_path", &self.public_path)
            .field("private_path", &self.private_path)
            .field("private", &"[REDACTED]")
            .finish()
    }
}
