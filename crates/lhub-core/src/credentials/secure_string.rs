//! In-memory holder for decrypted passwords and API tokens

use subtle::ConstantTimeEq;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Plaintext secret that is wiped from memory when dropped.
///
/// Decrypted passwords and API tokens live only in this type. `Debug` and
/// `Display` never print the value, and equality runs in constant time.
///
/// ```
/// use lhub_core::SecureString;
///
/// let token = SecureString::new("api-key-12345");
/// assert_eq!(token.expose(), "api-key-12345");
/// assert!(!format!("{:?}", token).contains("api-key"));
/// assert_eq!(token.masked(), "*************");
/// ```
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SecureString {
    inner: String,
}

impl SecureString {
    /// Wrap a secret value
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self { inner: s.into() }
    }

    /// Borrow the plaintext. Keep the borrow short.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.inner
    }

    /// Length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// True for an empty secret
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// True when the secret is empty or only whitespace
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.inner.trim().is_empty()
    }

    /// One `*` per character, for display views that hide secrets
    #[must_use]
    pub fn masked(&self) -> String {
        "*".repeat(self.inner.chars().count())
    }
}

impl From<Zeroizing<String>> for SecureString {
    fn from(value: Zeroizing<String>) -> Self {
        Self::new(value.as_str())
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self { inner: value }
    }
}

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString([REDACTED, {} bytes])", self.inner.len())
    }
}

impl std::fmt::Display for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl PartialEq for SecureString {
    fn eq(&self, other: &Self) -> bool {
        self.inner.as_bytes().ct_eq(other.inner.as_bytes()).into()
    }
}

impl Eq for SecureString {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacted_formatting() {
        let secret = SecureString::new("hunter2");
        assert_eq!(format!("{}", secret), "[REDACTED]");
        assert!(!format!("{:?}", secret).contains("hunter2"));
    }

    #[test]
    fn test_blank_and_mask() {
        assert!(SecureString::new("  ").is_blank());
        assert!(!SecureString::new("x").is_blank());
        assert_eq!(SecureString::new("pässwd").masked(), "******");
    }

    #[test]
    fn test_equality() {
        assert_eq!(SecureString::from("a"), SecureString::new("a".to_string()));
        assert_ne!(SecureString::from("a"), SecureString::from("b"));
    }
}
