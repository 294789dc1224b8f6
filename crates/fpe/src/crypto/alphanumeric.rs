//! Positional rotation cipher for mixed letter/digit values.
//!
//! Each ASCII letter rotates within its own case alphabet (mod 26) and each
//! ASCII digit within `0-9` (mod 10) by a keyed shift that depends only on the
//! character's position. Everything else (`@`, `.`, `-`, spaces, non-ASCII)
//! is copied through unchanged, so e-mail addresses and IDs keep their shape.

use std::fmt;

use hmac::Mac;

use super::{keyed_mac, HmacSha256};
use crate::{FpeError, Key};

const KEYSTREAM_LABEL: &[u8] = b"fpe.alpha";

/// Position-indexed keystream: `HMAC-SHA256(key, "fpe.alpha" ‖ position)`.
///
/// [`Keystream::shift`] takes a position and nothing else, so the shift for a
/// position is identical on the encrypt and decrypt side whatever character
/// sits there.
#[derive(Clone)]
pub struct Keystream {
    mac: HmacSha256,
}

impl Keystream {
    /// Key the keystream.
    ///
    /// # Errors
    ///
    /// Returns [`FpeError::InvalidKey`] if the key cannot be used.
    pub fn new(key: &Key) -> Result<Self, FpeError> {
        Ok(Self {
            mac: keyed_mac(key.as_bytes())?,
        })
    }

    /// Raw shift for the character at `position` (zero-based, counted in
    /// characters). Reduced by the caller to the alphabet size.
    pub fn shift(&self, position: usize) -> u16 {
        let mut mac = self.mac.clone();
        mac.update(KEYSTREAM_LABEL);
        mac.update(&(position as u64).to_be_bytes());
        let out = mac.finalize().into_bytes();
        u16::from_be_bytes([out[0], out[1]])
    }
}

impl fmt::Debug for Keystream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Keystream([REDACTED])")
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Forward,
    Backward,
}

/// Format-preserving cipher for alphanumeric values.
///
/// Works for any length, including single characters. Infallible once built.
#[derive(Debug, Clone)]
pub struct AlphanumericCipher {
    keystream: Keystream,
}

impl AlphanumericCipher {
    /// Build a cipher for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`FpeError::InvalidKey`] if the key cannot be used.
    pub fn new(key: &Key) -> Result<Self, FpeError> {
        Ok(Self {
            keystream: Keystream::new(key)?,
        })
    }

    /// Encrypt `value`. Empty values come back empty.
    pub fn encrypt(&self, value: &str) -> String {
        self.transform(value, Direction::Forward)
    }

    /// Inverse of [`AlphanumericCipher::encrypt`].
    pub fn decrypt(&self, value: &str) -> String {
        self.transform(value, Direction::Backward)
    }

    fn transform(&self, value: &str, direction: Direction) -> String {
        value
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if c.is_ascii_alphanumeric() {
                    rotate(c, self.keystream.shift(i), direction)
                } else {
                    c
                }
            })
            .collect()
    }
}

fn rotate(c: char, shift: u16, direction: Direction) -> char {
    let (base, modulus) = match c {
        'A'..='Z' => (b'A', 26u16),
        'a'..='z' => (b'a', 26u16),
        '0'..='9' => (b'0', 10u16),
        _ => return c,
    };
    let offset = u16::from(c as u8 - base);
    let shift = shift % modulus;
    let rotated = match direction {
        Direction::Forward => (offset + shift) % modulus,
        Direction::Backward => (offset + modulus - shift) % modulus,
    };
    char::from(base + rotated as u8)
}
