//! [`Key`]: the root secret shared by every cipher in a session.

use std::fmt;

use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::FpeError;

/// Length of keys produced by [`Key::generate`] when no length is requested.
pub const DEFAULT_KEY_LEN: usize = 16;

/// Keys shorter than this are accepted but flagged by [`Key::is_short`].
pub const RECOMMENDED_KEY_LEN: usize = 16;

/// Immutable key material.
///
/// The bytes carry no structure, version or checksum. They are zeroed when
/// the last owner drops the key and are never printed, not even by `Debug`.
#[derive(Clone)]
pub struct Key {
    bytes: Zeroizing<Vec<u8>>,
}

impl Key {
    /// Wrap caller-supplied key bytes.
    ///
    /// # Errors
    ///
    /// Returns [`FpeError::InvalidKey`] if `bytes` is empty.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, FpeError> {
        let bytes = Zeroizing::new(bytes.into());
        if bytes.is_empty() {
            return Err(FpeError::InvalidKey);
        }
        Ok(Self { bytes })
    }

    /// Generate `len` random bytes from the OS CSPRNG.
    ///
    /// # Errors
    ///
    /// Returns [`FpeError::InvalidKey`] if `len` is zero.
    pub fn generate(len: usize) -> Result<Self, FpeError> {
        if len == 0 {
            return Err(FpeError::InvalidKey);
        }
        let mut bytes = Zeroizing::new(vec![0u8; len]);
        OsRng.fill_bytes(&mut bytes);
        Ok(Self { bytes })
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Key length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`: an empty key cannot be constructed.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// `true` if the key is shorter than [`RECOMMENDED_KEY_LEN`].
    pub fn is_short(&self) -> bool {
        self.bytes.len() < RECOMMENDED_KEY_LEN
    }

    /// Short, non-reversible identifier for the key (first 8 bytes of its
    /// SHA-256 digest, hex encoded). Safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.as_bytes());
        digest[..8].iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key bytes stay out of logs and panics.
        f.write_str("Key([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_key_rejected() {
        assert_eq!(Key::from_bytes(Vec::new()).unwrap_err(), FpeError::InvalidKey);
    }

    #[test]
    fn generate_zero_length_rejected() {
        assert_eq!(Key::generate(0).unwrap_err(), FpeError::InvalidKey);
    }

    #[test]
    fn generate_produces_requested_length() {
        let key = Key::generate(DEFAULT_KEY_LEN).unwrap();
        assert_eq!(key.len(), DEFAULT_KEY_LEN);
        assert!(!key.is_short());
    }

    #[test]
    fn generated_keys_differ() {
        let a = Key::generate(32).unwrap();
        let b = Key::generate(32).unwrap();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn short_key_accepted_but_flagged() {
        let key = Key::from_bytes(b"pavanteja".to_vec()).unwrap();
        assert!(key.is_short());
    }

    #[test]
    fn fingerprint_is_stable_and_hex() {
        let key = Key::from_bytes(b"0123456789abcdef".to_vec()).unwrap();
        let fp = key.fingerprint();
        assert_eq!(fp.len(), 16);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp, key.clone().fingerprint());
    }

    #[test]
    fn key_redacted_in_debug() {
        let key = Key::from_bytes(b"super-secret-key".to_vec()).unwrap();
        let dbg = format!("{key:?}");
        assert!(dbg.contains("REDACTED"));
        assert!(!dbg.contains("super"));
    }
}
