//! Feistel round functions.
//!
//! A round function turns one half of the digit string into a pseudorandom
//! decimal mask for the other half, and knows how to add and subtract that
//! mask. Two interchangeable strategies share the same Feistel skeleton
//! ([`super::numeric::NumericCipher`]):
//!
//! | strategy           | mask                                 | mixing                   |
//! |--------------------|--------------------------------------|--------------------------|
//! | [`ModularRound`]   | keyed hash reduced modulo `10^width` | `(L + f) mod 10^width`   |
//! | [`DigitwiseRound`] | one keyed-hash digit per position    | `(Lᵢ + fᵢ) mod 10` each  |
//!
//! Digits are represented as values `0..=9`, most significant first.

use std::fmt;

use hmac::Mac;
use serde::{Deserialize, Serialize};

use super::keyed_mac;
use super::round_key::RoundKey;
use crate::FpeError;

const ROUND_STREAM_LABEL: &[u8] = b"fpe.round";

/// Extra hash bytes drawn beyond what `10^width` needs, to keep the modular
/// reduction close to uniform.
const REDUCTION_MARGIN: usize = 16;

/// Keyed pseudorandom mask used inside each Feistel round.
///
/// Implementations must be deterministic functions of
/// `(round_key, source, width)` and `remove` must undo `apply` exactly.
pub trait RoundFunction: Send + Sync {
    /// Derive a `width`-digit mask from the `source` half.
    ///
    /// # Errors
    ///
    /// Returns [`FpeError::InvalidKey`] if the round key cannot key the hash.
    fn mask(&self, round_key: &RoundKey, source: &[u8], width: usize) -> Result<Vec<u8>, FpeError>;

    /// Mix `mask` into `half` in place. Both slices have the same length.
    fn apply(&self, half: &mut [u8], mask: &[u8]);

    /// Inverse of [`RoundFunction::apply`].
    fn remove(&self, half: &mut [u8], mask: &[u8]);
}

/// Whole-half modular addition: the mask is a single number in `[0, 10^width)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModularRound;

impl RoundFunction for ModularRound {
    fn mask(&self, round_key: &RoundKey, source: &[u8], width: usize) -> Result<Vec<u8>, FpeError> {
        // log2(10) / 8 ≈ 0.4153 bytes per decimal digit.
        let byte_len = width * 416 / 1000 + 1 + REDUCTION_MARGIN;
        let bytes = keyed_stream(round_key, source, width, byte_len)?;
        Ok(reduce_mod_pow10(bytes, width))
    }

    fn apply(&self, half: &mut [u8], mask: &[u8]) {
        debug_assert_eq!(half.len(), mask.len());
        let mut carry = 0u8;
        for (d, m) in half.iter_mut().zip(mask.iter()).rev() {
            let sum = *d + *m + carry;
            *d = sum % 10;
            carry = sum / 10;
        }
    }

    fn remove(&self, half: &mut [u8], mask: &[u8]) {
        debug_assert_eq!(half.len(), mask.len());
        let mut borrow = 0u8;
        for (d, m) in half.iter_mut().zip(mask.iter()).rev() {
            let sub = *m + borrow;
            if *d >= sub {
                *d -= sub;
                borrow = 0;
            } else {
                *d = *d + 10 - sub;
                borrow = 1;
            }
        }
    }
}

/// Per-digit additive mask: every position gets its own keyed digit, no carry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DigitwiseRound;

impl RoundFunction for DigitwiseRound {
    fn mask(&self, round_key: &RoundKey, source: &[u8], width: usize) -> Result<Vec<u8>, FpeError> {
        let bytes = keyed_stream(round_key, source, width, width)?;
        Ok(bytes.into_iter().map(|b| b % 10).collect())
    }

    fn apply(&self, half: &mut [u8], mask: &[u8]) {
        debug_assert_eq!(half.len(), mask.len());
        for (d, m) in half.iter_mut().zip(mask) {
            *d = (*d + *m) % 10;
        }
    }

    fn remove(&self, half: &mut [u8], mask: &[u8]) {
        debug_assert_eq!(half.len(), mask.len());
        for (d, m) in half.iter_mut().zip(mask) {
            *d = (*d + 10 - *m) % 10;
        }
    }
}

/// Round-function strategy selected by configuration.
///
/// Fixed per deployment: ciphertext produced under one strategy only decrypts
/// under the same strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundStrategy {
    /// [`ModularRound`].
    #[default]
    Modular,
    /// [`DigitwiseRound`].
    Digitwise,
}

impl RoundFunction for RoundStrategy {
    fn mask(&self, round_key: &RoundKey, source: &[u8], width: usize) -> Result<Vec<u8>, FpeError> {
        match self {
            RoundStrategy::Modular => ModularRound.mask(round_key, source, width),
            RoundStrategy::Digitwise => DigitwiseRound.mask(round_key, source, width),
        }
    }

    fn apply(&self, half: &mut [u8], mask: &[u8]) {
        match self {
            RoundStrategy::Modular => ModularRound.apply(half, mask),
            RoundStrategy::Digitwise => DigitwiseRound.apply(half, mask),
        }
    }

    fn remove(&self, half: &mut [u8], mask: &[u8]) {
        match self {
            RoundStrategy::Modular => ModularRound.remove(half, mask),
            RoundStrategy::Digitwise => DigitwiseRound.remove(half, mask),
        }
    }
}

impl fmt::Display for RoundStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundStrategy::Modular => f.write_str("modular"),
            RoundStrategy::Digitwise => f.write_str("digitwise"),
        }
    }
}

/// `len` bytes of `HMAC(round_key, label ‖ width ‖ |source| ‖ source ‖ counter)`,
/// one 32-byte block per counter value.
fn keyed_stream(
    round_key: &RoundKey,
    source: &[u8],
    width: usize,
    len: usize,
) -> Result<Vec<u8>, FpeError> {
    let mut base = keyed_mac(round_key.as_bytes())?;
    base.update(ROUND_STREAM_LABEL);
    base.update(&(width as u64).to_be_bytes());
    base.update(&(source.len() as u64).to_be_bytes());
    base.update(source);

    let mut out = Vec::with_capacity(len + 32);
    let mut counter = 0u32;
    while out.len() < len {
        let mut mac = base.clone();
        mac.update(&counter.to_be_bytes());
        out.extend_from_slice(&mac.finalize().into_bytes());
        counter = counter.wrapping_add(1);
    }
    out.truncate(len);
    Ok(out)
}

/// Lowest `width` decimal digits of the big-endian integer in `bytes`,
/// most significant first. Equivalent to `int(bytes) mod 10^width`.
fn reduce_mod_pow10(mut bytes: Vec<u8>, width: usize) -> Vec<u8> {
    let mut digits = vec![0u8; width];
    for slot in digits.iter_mut().rev() {
        let mut rem = 0u16;
        for b in bytes.iter_mut() {
            let cur = (rem << 8) | u16::from(*b);
            *b = (cur / 10) as u8;
            rem = cur % 10;
        }
        *slot = rem as u8;
    }
    digits
}
