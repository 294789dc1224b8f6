//! Per-round sub-key derivation.

use std::fmt;

use hmac::Mac;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::keyed_mac;
use crate::{FpeError, Key};

/// Byte length of a derived round key.
pub const ROUND_KEY_LEN: usize = 32;

const ROUND_KEY_LABEL: &[u8] = b"fpe.round-key";

/// Sub-key for one Feistel round: `HMAC-SHA256(key, "fpe.round-key" ‖ round)`.
///
/// A pure function of `(key, round)`; distinct rounds give unrelated keys and
/// no key bytes leak into the result.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct RoundKey([u8; ROUND_KEY_LEN]);

impl RoundKey {
    /// Raw sub-key bytes.
    pub fn as_bytes(&self) -> &[u8; ROUND_KEY_LEN] {
        &self.0
    }
}

impl fmt::Debug for RoundKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RoundKey([REDACTED])")
    }
}

/// Derive the sub-key for `round`.
///
/// # Errors
///
/// Returns [`FpeError::InvalidKey`] if the key material is unusable.
pub fn derive_round_key(key: &Key, round: u32) -> Result<RoundKey, FpeError> {
    let mut mac = keyed_mac(key.as_bytes())?;
    mac.update(ROUND_KEY_LABEL);
    mac.update(&round.to_be_bytes());
    let mut out = [0u8; ROUND_KEY_LEN];
    out.copy_from_slice(&mac.finalize().into_bytes());
    Ok(RoundKey(out))
}

/// Derive the full schedule for rounds `0..rounds`.
pub(crate) fn derive_round_keys(key: &Key, rounds: u32) -> Result<Vec<RoundKey>, FpeError> {
    (0..rounds).map(|r| derive_round_key(key, r)).collect()
}
