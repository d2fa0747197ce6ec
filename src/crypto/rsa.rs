//! Textbook RSA encoding for the relay exercise.
//!
//! The relay hands out a public key pair `(n, e)` and expects each code
//! point raised to `e` modulo `n`, one residue per cell. No padding scheme
//! is involved; this is the classroom construction, not real RSA.

use num_bigint::BigUint;

use crate::error::CryptoRangeError;

/// Encodes `text` as `codepoint ^ e (mod n)`, one cell per character.
///
/// The caller must supply a nonzero modulus; the task layer validates the
/// relay's parameters before they reach this function.
///
/// # Arguments
/// * `text` - Plaintext to encode
/// * `n` - Public modulus, nonzero
/// * `e` - Public exponent
///
/// # Returns
/// One cell per character, or [`CryptoRangeError::Rsa`] when a residue
/// exceeds `u32::MAX` and cannot be framed.
pub fn rsa_encode(text: &str, n: &BigUint, e: &BigUint) -> Result<Vec<u8>, CryptoRangeError> {
    let mut out = Vec::with_capacity(text.len() * 4);
    for (index, ch) in text.chars().enumerate() {
        let residue = BigUint::from(ch as u32).modpow(e, n);
        let cell = u32::try_from(&residue).map_err(|_| CryptoRangeError::Rsa {
            index,
            value: residue.to_string(),
        })?;
        out.extend_from_slice(&cell.to_be_bytes());
    }
    Ok(out)
}
