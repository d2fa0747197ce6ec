//! Shift and Vigenere ciphers over Unicode code points.
//!
//! Both ciphers treat the plaintext as a sequence of code points and emit
//! one 4-byte big-endian cell per character, ready for cell framing. The
//! relay checks submissions cell by cell, so results are returned as raw
//! cells rather than text.

use crate::error::CryptoRangeError;

/// Encodes each character as its code point in a 4-byte big-endian cell.
pub fn codepoint_cells(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 4);
    for ch in text.chars() {
        out.extend_from_slice(&(ch as u32).to_be_bytes());
    }
    out
}

/// Shift-encodes `text` by adding `key` to every code point.
///
/// # Arguments
/// * `text` - Plaintext to encode
/// * `key` - Shift amount, may be negative
///
/// # Returns
/// One cell per character, or [`CryptoRangeError::Shift`] when a shifted
/// value leaves the `0..=u32::MAX` cell range.
pub fn shift_encode(text: &str, key: i64) -> Result<Vec<u8>, CryptoRangeError> {
    shift_by(text, i128::from(key))
}

/// Shift-decodes `text` by subtracting `key` from every code point.
pub fn shift_decode(text: &str, key: i64) -> Result<Vec<u8>, CryptoRangeError> {
    shift_by(text, -i128::from(key))
}

fn shift_by(text: &str, delta: i128) -> Result<Vec<u8>, CryptoRangeError> {
    let mut out = Vec::with_capacity(text.len() * 4);
    for (index, ch) in text.chars().enumerate() {
        let value = ch as i128 + delta;
        let cell = u32::try_from(value).map_err(|_| CryptoRangeError::Shift { index, value })?;
        out.extend_from_slice(&cell.to_be_bytes());
    }
    Ok(out)
}

/// Vigenere-encodes `text` by adding the code points of `key` cyclically.
///
/// The sum of two scalar values always fits a cell, so this cannot fail.
/// An empty key yields an empty result.
pub fn vigenere_encode(text: &str, key: &str) -> Vec<u8> {
    let key_points: Vec<u32> = key.chars().map(|c| c as u32).collect();
    if key_points.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(text.len() * 4);
    for (i, ch) in text.chars().enumerate() {
        let value = ch as u32 + key_points[i % key_points.len()];
        out.extend_from_slice(&value.to_be_bytes());
    }
    out
}
