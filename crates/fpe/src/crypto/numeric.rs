//! Format-preserving Feistel cipher over the decimal digits of a value.
//!
//! The digits of the input are collected left to right, encrypted as one
//! digit string, and written back into the digit positions of the original
//! value. Every non-digit character stays where it was.
//!
//! # Feistel skeleton
//!
//! For `n` digits, `L` holds the first `⌊n/2⌋` and `R` the remaining `⌈n/2⌉`.
//! Each round computes `f = mask(R, |L|)` with that round's key, replaces
//! `L` with `L ⊕ f` (strategy-specific addition) and swaps the halves, so the
//! half lengths alternate. Decryption walks the rounds backwards, recomputing
//! the mask from the current left half and subtracting it.
//!
//! # Single digits
//!
//! With `n = 1` the left half is empty and no round can mix anything: the
//! value is returned unchanged by both directions. [`is_mixable`]
//! lets callers detect and report these values.

use super::round::{RoundFunction, RoundStrategy};
use super::round_key::{derive_round_keys, RoundKey};
use crate::{FormatPattern, FpeError, Key};

/// Round count used when none is configured.
pub const DEFAULT_ROUNDS: u32 = 10;

/// `true` if `value` has enough digits (two or more) to be mixed.
pub fn is_mixable(value: &str) -> bool {
    value.bytes().filter(u8::is_ascii_digit).nth(1).is_some()
}

/// Keyed Feistel cipher over digit strings.
///
/// Holds the precomputed round-key schedule and the round function; both are
/// immutable, so one instance can be shared across threads.
pub struct NumericCipher<F = RoundStrategy> {
    round_keys: Vec<RoundKey>,
    round_fn: F,
}

impl NumericCipher<RoundStrategy> {
    /// Build a cipher with one of the configurable strategies.
    ///
    /// # Errors
    ///
    /// Returns [`FpeError::InvalidRounds`] if `rounds` is zero and
    /// [`FpeError::InvalidKey`] if the key cannot be used.
    pub fn new(key: &Key, rounds: u32, strategy: RoundStrategy) -> Result<Self, FpeError> {
        Self::with_round_function(key, rounds, strategy)
    }
}

impl<F: RoundFunction> NumericCipher<F> {
    /// Build a cipher around any [`RoundFunction`].
    ///
    /// # Errors
    ///
    /// Same as [`NumericCipher::new`].
    pub fn with_round_function(key: &Key, rounds: u32, round_fn: F) -> Result<Self, FpeError> {
        if rounds == 0 {
            return Err(FpeError::InvalidRounds);
        }
        Ok(Self {
            round_keys: derive_round_keys(key, rounds)?,
            round_fn,
        })
    }

    /// Number of Feistel rounds.
    pub fn rounds(&self) -> u32 {
        self.round_keys.len() as u32
    }

    /// Encrypt the digits of `value`, keeping every other character in place.
    ///
    /// Empty values and values without digits are returned unchanged.
    pub fn encrypt(&self, value: &str) -> Result<String, FpeError> {
        self.transform(value, |digits| self.encrypt_digits(digits))
    }

    /// Inverse of [`NumericCipher::encrypt`].
    pub fn decrypt(&self, value: &str) -> Result<String, FpeError> {
        self.transform(value, |digits| self.decrypt_digits(digits))
    }

    /// Encrypt after checking `value` against `pattern`, or against "digits
    /// only" when no pattern is declared.
    ///
    /// # Errors
    ///
    /// Returns [`FpeError::InvalidInput`] if the value has the wrong shape.
    pub fn encrypt_strict(
        &self,
        value: &str,
        pattern: Option<&FormatPattern>,
    ) -> Result<String, FpeError> {
        if value.is_empty() {
            return Ok(String::new());
        }
        check_shape(value, pattern)?;
        self.encrypt(value)
    }

    /// Inverse of [`NumericCipher::encrypt_strict`]. Ciphertext has the same
    /// shape as plaintext, so the same check applies.
    pub fn decrypt_strict(
        &self,
        value: &str,
        pattern: Option<&FormatPattern>,
    ) -> Result<String, FpeError> {
        if value.is_empty() {
            return Ok(String::new());
        }
        check_shape(value, pattern)?;
        self.decrypt(value)
    }

    /// Encrypt a digit string given as values `0..=9`.
    pub fn encrypt_digits(&self, digits: &[u8]) -> Result<Vec<u8>, FpeError> {
        let n = digits.len();
        if n / 2 == 0 {
            return Ok(digits.to_vec());
        }
        let (l, r) = digits.split_at(n / 2);
        let (mut left, mut right) = (l.to_vec(), r.to_vec());

        for round_key in &self.round_keys {
            let mask = self.round_fn.mask(round_key, &right, left.len())?;
            self.round_fn.apply(&mut left, &mask);
            std::mem::swap(&mut left, &mut right);
        }

        left.extend_from_slice(&right);
        Ok(left)
    }

    /// Decrypt a digit string given as values `0..=9`.
    pub fn decrypt_digits(&self, digits: &[u8]) -> Result<Vec<u8>, FpeError> {
        let n = digits.len();
        if n / 2 == 0 {
            return Ok(digits.to_vec());
        }
        // Halves swap lengths every round.
        let left_len = if self.round_keys.len() % 2 == 0 {
            n / 2
        } else {
            n - n / 2
        };
        let (l, r) = digits.split_at(left_len);
        let (mut left, mut right) = (l.to_vec(), r.to_vec());

        for round_key in self.round_keys.iter().rev() {
            let mask = self.round_fn.mask(round_key, &left, right.len())?;
            self.round_fn.remove(&mut right, &mask);
            std::mem::swap(&mut left, &mut right);
        }

        left.extend_from_slice(&right);
        Ok(left)
    }

    fn transform<T>(&self, value: &str, op: T) -> Result<String, FpeError>
    where
        T: FnOnce(&[u8]) -> Result<Vec<u8>, FpeError>,
    {
        let digits: Vec<u8> = value
            .bytes()
            .filter(u8::is_ascii_digit)
            .map(|b| b - b'0')
            .collect();
        if digits.is_empty() {
            return Ok(value.to_owned());
        }
        let out = op(&digits)?;
        Ok(reinterleave(value, &out))
    }
}

/// Write `digits` into the digit positions of `skeleton`, left to right.
/// Missing digits are filled with `'0'`.
fn reinterleave(skeleton: &str, digits: &[u8]) -> String {
    let mut next = digits.iter();
    skeleton
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                next.next().map_or('0', |d| char::from(b'0' + d))
            } else {
                c
            }
        })
        .collect()
}

fn check_shape(value: &str, pattern: Option<&FormatPattern>) -> Result<(), FpeError> {
    match pattern {
        Some(p) if !p.matches(value) => Err(FpeError::invalid_input(format!(
            "value does not match format `{p}`"
        ))),
        None if !value.bytes().all(|b| b.is_ascii_digit()) => {
            Err(FpeError::invalid_input("expected only digits"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::round::{DigitwiseRound, ModularRound};

    fn key() -> Key {
        Key::from_bytes(b"0123456789abcdef".to_vec()).unwrap()
    }

    fn cipher(strategy: RoundStrategy) -> NumericCipher {
        NumericCipher::new(&key(), DEFAULT_ROUNDS, strategy).unwrap()
    }

    #[test]
    fn zero_rounds_rejected() {
        assert!(matches!(
            NumericCipher::new(&key(), 0, RoundStrategy::Modular),
            Err(FpeError::InvalidRounds)
        ));
    }

    #[test]
    fn ssn_round_trip_keeps_dashes() {
        for strategy in [RoundStrategy::Modular, RoundStrategy::Digitwise] {
            let c = cipher(strategy);
            let enc = c.encrypt("123-45-6789").unwrap();
            assert_eq!(enc.len(), 11);
            assert_eq!(&enc[3..4], "-");
            assert_eq!(&enc[6..7], "-");
            assert_eq!(enc.bytes().filter(u8::is_ascii_digit).count(), 9);
            assert_ne!(enc, "123-45-6789");
            assert_eq!(c.decrypt(&enc).unwrap(), "123-45-6789");
        }
    }

    #[test]
    fn single_digit_is_identity() {
        let c = cipher(RoundStrategy::Modular);
        assert_eq!(c.encrypt("7").unwrap(), "7");
        assert_eq!(c.decrypt("7").unwrap(), "7");
        assert_eq!(c.encrypt("#7-").unwrap(), "#7-");
        assert!(!is_mixable("a7b"));
        assert!(!is_mixable("N/A"));
        assert!(is_mixable("7-7"));
    }

    #[test]
    fn empty_and_digitless_pass_through() {
        let c = cipher(RoundStrategy::Digitwise);
        assert_eq!(c.encrypt("").unwrap(), "");
        assert_eq!(c.encrypt("N/A").unwrap(), "N/A");
        assert_eq!(c.decrypt("---").unwrap(), "---");
    }

    #[test]
    fn odd_and_even_round_counts_invert() {
        for rounds in [1, 2, 3, 6, 7, 10] {
            let c = NumericCipher::new(&key(), rounds, RoundStrategy::Modular).unwrap();
            for value in ["12", "123", "4111111111111111", "3782822463100050"] {
                let enc = c.encrypt(value).unwrap();
                assert_eq!(c.decrypt(&enc).unwrap(), value, "rounds={rounds}");
            }
        }
    }

    #[test]
    fn long_values_do_not_overflow() {
        let c = cipher(RoundStrategy::Modular);
        let value = "1234564567898765435678909876545678987654";
        let enc = c.encrypt(value).unwrap();
        assert_eq!(enc.len(), value.len());
        assert_eq!(c.decrypt(&enc).unwrap(), value);
    }

    #[test]
    fn strategies_are_distinct() {
        let a = cipher(RoundStrategy::Modular).encrypt("4111111111111111").unwrap();
        let b = cipher(RoundStrategy::Digitwise).encrypt("4111111111111111").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn generic_round_function_matches_enum() {
        let generic = NumericCipher::with_round_function(&key(), 10, ModularRound).unwrap();
        let by_enum = cipher(RoundStrategy::Modular);
        assert_eq!(
            generic.encrypt("987-65-4321").unwrap(),
            by_enum.encrypt("987-65-4321").unwrap()
        );
        let generic = NumericCipher::with_round_function(&key(), 10, DigitwiseRound).unwrap();
        assert_eq!(
            generic.encrypt("987-65-4321").unwrap(),
            cipher(RoundStrategy::Digitwise).encrypt("987-65-4321").unwrap()
        );
    }

    #[test]
    fn strict_accepts_matching_pattern() {
        let c = cipher(RoundStrategy::Modular);
        let p = FormatPattern::parse("999-99-9999").unwrap();
        let enc = c.encrypt_strict("123-45-6789", Some(&p)).unwrap();
        assert!(p.matches(&enc));
        assert_eq!(c.decrypt_strict(&enc, Some(&p)).unwrap(), "123-45-6789");
    }

    #[test]
    fn strict_rejects_wrong_shape() {
        let c = cipher(RoundStrategy::Modular);
        let p = FormatPattern::parse("999-99-9999").unwrap();
        assert!(matches!(
            c.encrypt_strict("123456789", Some(&p)),
            Err(FpeError::InvalidInput { .. })
        ));
        assert!(matches!(
            c.encrypt_strict("12-34", None),
            Err(FpeError::InvalidInput { .. })
        ));
        assert_eq!(c.encrypt_strict("", None).unwrap(), "");
    }

    #[test]
    fn reinterleave_pads_missing_digits() {
        assert_eq!(reinterleave("12-34", &[5, 6, 7]), "56-70");
    }

    #[test]
    fn rounds_reported() {
        assert_eq!(cipher(RoundStrategy::Modular).rounds(), DEFAULT_ROUNDS);
    }
}
