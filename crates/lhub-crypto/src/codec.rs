//! Ciphertext tokens: RSA-encrypted, base64-encoded secrets

use crate::error::{CryptoError, Result};
use crate::keypair::KeyPairStore;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::sync::Arc;
use zeroize::Zeroizing;

/// Encrypts and decrypts secrets with a [`KeyPairStore`].
///
/// Holds no state of its own beyond a handle to the keys, so clones are cheap
/// and every clone produces tokens readable by every other.
#[derive(Debug, Clone)]
pub struct SecretCodec {
    keys: Arc<KeyPairStore>,
}

impl SecretCodec {
    /// Create a codec backed by `keys`
    #[must_use]
    pub fn new(keys: Arc<KeyPairStore>) -> Self {
        Self { keys }
    }

    /// Key pair used by this codec
    #[must_use]
    pub fn keys(&self) -> &KeyPairStore {
        &self.keys
    }

    /// Encrypt `plaintext` into a base64 ciphertext token.
    ///
    /// PKCS#1 v1.5 padding is randomized, so two calls on the same input yield
    /// different tokens.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let ciphertext = self.keys.encrypt_bytes(plaintext.as_bytes())?;
        Ok(BASE64.encode(ciphertext))
    }

    /// Decrypt a token produced by [`SecretCodec::encrypt`] under the same key pair.
    pub fn decrypt(&self, token: &str) -> Result<Zeroizing<String>> {
        let ciphertext = BASE64
            .decode(token.trim())
            .map_err(|e| CryptoError::Decryption(format!("malformed token: {}", e)))?;

        let plaintext = self.keys.decrypt_bytes(&ciphertext)?;
        let text = std::str::from_utf8(&plaintext)
            .map_err(|_| CryptoError::Decryption("plaintext is not valid UTF-8".to_string()))?;
        Ok(Zeroizing::new(text.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keypair::KeyOptions;
    use tempfile::TempDir;

    fn codec_in(dir: &TempDir) -> SecretCodec {
        let keys = KeyPairStore::open_with(dir.path(), &KeyOptions::default().with_bits(1024)).unwrap();
        SecretCodec::new(Arc::new(keys))
    }

    #[test]
    fn test_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let codec = codec_in(&temp_dir);

        for secret in ["pw1", "", "pässwörd ✓ 秘密", "with = and # and , chars"] {
            let token = codec.encrypt(secret).unwrap();
            assert_ne!(token, secret);
            assert_eq!(codec.decrypt(&token).unwrap().as_str(), secret);
        }
    }

    #[test]
    fn test_tokens_are_randomized() {
        let temp_dir = TempDir::new().unwrap();
        let codec = codec_in(&temp_dir);

        let first = codec.encrypt("same").unwrap();
        let second = codec.encrypt("same").unwrap();
        assert_ne!(first, second);
        assert_eq!(codec.decrypt(&first).unwrap().as_str(), "same");
        assert_eq!(codec.decrypt(&second).unwrap().as_str(), "same");
    }

    #[test]
    fn test_reloaded_keys_decrypt_old_tokens() {
        let temp_dir = TempDir::new().unwrap();
        let token = codec_in(&temp_dir).encrypt("persisted").unwrap();

        let reopened = codec_in(&temp_dir);
        assert_eq!(reopened.decrypt(&token).unwrap().as_str(), "persisted");
    }

    #[test]
    fn test_wrong_key_fails() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let token = codec_in(&dir_a).encrypt("secret").unwrap();

        let err = codec_in(&dir_b).decrypt(&token).unwrap_err();
        assert!(matches!(err, CryptoError::Decryption(_)));
    }

    #[test]
    fn test_malformed_and_truncated_tokens() {
        let temp_dir = TempDir::new().unwrap();
        let codec = codec_in(&temp_dir);

        assert!(matches!(
            codec.decrypt("%%% not base64 %%%"),
            Err(CryptoError::Decryption(_))
        ));

        let token = codec.encrypt("secret").unwrap();
        let truncated = BASE64.encode(&BASE64.decode(&token).unwrap()[..40]);
        assert!(matches!(
            codec.decrypt(&truncated),
            Err(CryptoError::Decryption(_))
        ));
    }

    #[test]
    fn test_message_too_long() {
        let temp_dir = TempDir::new().unwrap();
        let codec = codec_in(&temp_dir);
        let max = codec.keys().max_plaintext_len();

        assert!(codec.encrypt(&"x".repeat(max)).is_ok());
        let err = codec.encrypt(&"x".repeat(max + 1)).unwrap_err();
        assert!(matches!(err, CryptoError::MessageTooLong { len, .. } if len == max + 1));
    }
}
