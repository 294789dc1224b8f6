//! Keyed primitives behind both format-preserving ciphers.
//!
//! # Construction
//!
//! ```text
//! Key ─ HMAC-SHA256("fpe.round-key" ‖ round) ─► RoundKey[r]
//!                                                 └─► RoundFunction::mask(R, width)
//! Key ─ HMAC-SHA256("fpe.alpha" ‖ position)   ─► Keystream::shift(position)
//! ```
//!
//! The numeric cipher is a Feistel network over the decimal digits of a value;
//! the round function is pluggable ([`round::RoundStrategy`]). The alphanumeric
//! cipher rotates each letter or digit by a shift that depends on the key and
//! the character position only.
//!
//! Neither cipher authenticates. Decrypting with the wrong key yields a value
//! of the right shape that is not the plaintext; detecting that is the
//! caller's job.

pub mod alphanumeric;
pub mod key;
pub mod numeric;
pub mod round;
pub mod round_key;

use hmac::{Hmac, Mac};
use sha2::Sha256;

pub(crate) type HmacSha256 = Hmac<Sha256>;

/// Build an HMAC-SHA256 instance keyed with `key`.
///
/// HMAC accepts keys of any length, so this only fails on an empty key.
pub(crate) fn keyed_mac(key: &[u8]) -> Result<HmacSha256, crate::FpeError> {
    if key.is_empty() {
        return Err(crate::FpeError::InvalidKey);
    }
    HmacSha256::new_from_slice(key).map_err(|_| crate::FpeError::InvalidKey)
}
