//! SHA-256 hashing for the relay's hash exercises.

use sha2::{Digest, Sha256};

use super::classic::codepoint_cells;

/// SHA-256 digest of `text`, as lowercase hex.
pub fn digest_hex(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Encodes the hex digest of `text` as cells, one per hex character.
pub fn hash_generate(text: &str) -> Vec<u8> {
    codepoint_cells(&digest_hex(text))
}

/// Checks `claimed_hex` against the digest of `text`.
///
/// The comparison is exact; a digest in uppercase hex does not match.
/// Returns the verdict as cells spelling `True` or `False`.
pub fn hash_verify(text: &str, claimed_hex: &str) -> Vec<u8> {
    let verdict = if digest_hex(text) == claimed_hex {
        "True"
    } else {
        "False"
    };
    codepoint_cells(verdict)
}
