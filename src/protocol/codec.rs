//! ISC wire format encoding and decoding.
//!
//! Every frame starts with a fixed header:
//! 1. `ISC` magic (3 bytes)
//! 2. kind byte (ASCII, see [`FrameKind`])
//! 3. two header bytes whose meaning depends on the kind
//!
//! For textual kinds the two bytes are a big-endian `u16` character count,
//! followed by one 4-byte cell per character: the character's UTF-8 bytes
//! right-aligned in the cell, zero-padded on the left. For image frames the
//! two bytes are width and height, followed by `width * height` RGB
//! triplets.

use crate::error::{EncodingError, FramingError};

use super::frame::{FrameKind, RasterImage};

/// Frame magic preceding every message.
pub const MAGIC: [u8; 3] = *b"ISC";

/// Width of one character cell in bytes.
pub const CELL_BYTES: usize = 4;

/// Encodes a textual payload into a complete frame.
///
/// Each character occupies one cell regardless of how many UTF-8 bytes it
/// needs; a cell holds any Unicode scalar value, so encoding itself cannot
/// lose data.
///
/// # Arguments
/// * `kind` - Frame kind byte to emit
/// * `text` - Payload text, counted in characters
///
/// # Returns
/// The frame bytes, or [`EncodingError::TooManyCells`] when the character
/// count does not fit the length field.
pub fn encode_text(kind: FrameKind, text: &str) -> Result<Vec<u8>, EncodingError> {
    let count = text.chars().count();
    let length = u16::try_from(count).map_err(|_| EncodingError::TooManyCells(count))?;

    let mut frame = Vec::with_capacity(MAGIC.len() + 3 + count * CELL_BYTES);
    frame.extend_from_slice(&MAGIC);
    frame.push(kind.as_byte());
    frame.extend_from_slice(&length.to_be_bytes());

    let mut buf = [0u8; CELL_BYTES];
    for ch in text.chars() {
        let encoded = ch.encode_utf8(&mut buf);
        let pad = CELL_BYTES - encoded.len();
        frame.resize(frame.len() + pad, 0);
        frame.extend_from_slice(encoded.as_bytes());
    }
    Ok(frame)
}

/// Encodes an already cell-shaped payload into a complete frame.
///
/// Cipher outputs arrive here as raw cells; they are framed verbatim, with
/// the length field set to the cell count.
///
/// # Arguments
/// * `kind` - Frame kind byte to emit
/// * `cells` - Payload bytes, a whole number of 4-byte cells
///
/// # Returns
/// The frame bytes, [`EncodingError::RaggedCells`] when the payload is not
/// cell-aligned, or [`EncodingError::TooManyCells`] when it is too long.
pub fn encode_cells(kind: FrameKind, cells: &[u8]) -> Result<Vec<u8>, EncodingError> {
    if cells.len() % CELL_BYTES != 0 {
        return Err(EncodingError::RaggedCells(cells.len()));
    }
    let count = cells.len() / CELL_BYTES;
    let length = u16::try_from(count).map_err(|_| EncodingError::TooManyCells(count))?;

    let mut frame = Vec::with_capacity(MAGIC.len() + 3 + cells.len());
    frame.extend_from_slice(&MAGIC);
    frame.push(kind.as_byte());
    frame.extend_from_slice(&length.to_be_bytes());
    frame.extend_from_slice(cells);
    Ok(frame)
}

/// Validates the three magic bytes at the start of a frame.
pub fn decode_header(bytes: [u8; 3]) -> Result<(), FramingError> {
    if bytes == MAGIC {
        Ok(())
    } else {
        Err(FramingError::BadMagic(bytes))
    }
}

/// Maps the kind byte following the magic to a [`FrameKind`].
pub fn decode_type(byte: u8) -> FrameKind {
    FrameKind::from_byte(byte)
}

/// Reads the big-endian character count of a textual frame.
pub fn decode_length(bytes: [u8; 2]) -> u16 {
    u16::from_be_bytes(bytes)
}

/// Decodes a cell payload back into text.
///
/// Each 4-byte cell is stripped of its leading zero padding and the
/// remaining bytes decoded as UTF-8, with undecodable sequences replaced by
/// U+FFFD. A trailing partial cell is ignored.
pub fn decode_text(payload: &[u8]) -> String {
    let mut out = String::with_capacity(payload.len() / CELL_BYTES);
    for cell in payload.chunks_exact(CELL_BYTES) {
        let start = cell.iter().position(|&b| b != 0).unwrap_or(CELL_BYTES);
        out.push_str(&String::from_utf8_lossy(&cell[start..]));
    }
    out
}

/// Builds a [`RasterImage`] from an image frame's dimensions and pixel bytes.
///
/// A byte count that is not a multiple of three is trimmed down to whole
/// RGB triplets rather than rejected.
pub fn decode_image(width: u8, height: u8, pixel_bytes: &[u8]) -> RasterImage {
    let whole = pixel_bytes.len() - pixel_bytes.len() % 3;
    RasterImage {
        width,
        height,
        pixels: pixel_bytes[..whole].to_vec(),
    }
}

/// Renders a cell payload for display without interpreting cell boundaries.
///
/// All zero bytes are dropped and the rest decoded as UTF-8 with
/// replacement. This is the preview shown for outgoing cipher payloads.
pub fn cells_preview(cells: &[u8]) -> String {
    let bytes: Vec<u8> = cells.iter().copied().filter(|&b| b != 0).collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_ascii_text() {
        let frame = encode_text(FrameKind::Text, "abc").unwrap();
        assert_eq!(
            frame,
            b"ISCt\x00\x03\x00\x00\x00a\x00\x00\x00b\x00\x00\x00c"
        );
    }

    #[test]
    fn test_encode_empty_text() {
        let frame = encode_text(FrameKind::Relay, "").unwrap();
        assert_eq!(frame, b"ISCs\x00\x00");
    }

    #[test]
    fn test_encode_multibyte_cells() {
        // Two-, three- and four-byte UTF-8, each right-aligned in its cell.
        let frame = encode_text(FrameKind::Text, "\u{e9}\u{20ac}\u{1d11e}").unwrap();
        assert_eq!(&frame[..6], b"ISCt\x00\x03");
        assert_eq!(&frame[6..10], &[0x00, 0x00, 0xc3, 0xa9]);
        assert_eq!(&frame[10..14], &[0x00, 0xe2, 0x82, 0xac]);
        assert_eq!(&frame[14..18], &[0xf0, 0x9d, 0x84, 0x9e]);
    }

    #[test]
    fn test_encode_length_counts_chars_not_bytes() {
        let frame = encode_text(FrameKind::Text, "\u{20ac}\u{20ac}").unwrap();
        assert_eq!(decode_length([frame[4], frame[5]]), 2);
        assert_eq!(frame.len(), 6 + 2 * CELL_BYTES);
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let text = "a".repeat(u16::MAX as usize + 1);
        let result = encode_text(FrameKind::Text, &text);
        assert!(matches!(result, Err(EncodingError::TooManyCells(65536))));
    }

    #[test]
    fn test_encode_cells_valid() {
        let cells = [0u8, 0, 0, b'h', 0, 0, 0, b'i'];
        let frame = encode_cells(FrameKind::Relay, &cells).unwrap();
        assert_eq!(&frame[..6], b"ISCs\x00\x02");
        assert_eq!(&frame[6..], &cells);
    }

    #[test]
    fn test_encode_cells_rejects_ragged() {
        let result = encode_cells(FrameKind::Relay, &[1, 2, 3]);
        assert!(matches!(result, Err(EncodingError::RaggedCells(3))));
    }

    #[test]
    fn test_decode_header() {
        assert!(decode_header(*b"ISC").is_ok());
        let err = decode_header(*b"XYZ").unwrap_err();
        assert_eq!(err, FramingError::BadMagic(*b"XYZ"));
    }

    #[test]
    fn test_decode_text_strips_cell_padding() {
        let payload = [0u8, 0, 0, b'h', 0, 0, 0, b'i'];
        assert_eq!(decode_text(&payload), "hi");
    }

    #[test]
    fn test_decode_text_multibyte() {
        let payload = [0x00, 0x00, 0xc3, 0xa9, 0xf0, 0x9d, 0x84, 0x9e];
        assert_eq!(decode_text(&payload), "\u{e9}\u{1d11e}");
    }

    #[test]
    fn test_decode_text_replaces_invalid_utf8() {
        let payload = [0x00, 0x00, 0x00, 0xff];
        assert_eq!(decode_text(&payload), "\u{fffd}");
    }

    #[test]
    fn test_decode_text_ignores_partial_cell() {
        let payload = [0u8, 0, 0, b'a', 0, 0];
        assert_eq!(decode_text(&payload), "a");
    }

    #[test]
    fn test_decode_text_all_zero_cell_is_empty() {
        let payload = [0u8, 0, 0, 0];
        assert_eq!(decode_text(&payload), "");
    }

    #[test]
    fn test_text_round_trip() {
        let original = "hello \u{e9}\u{20ac}\u{1d11e} world";
        let frame = encode_text(FrameKind::Text, original).unwrap();
        assert!(decode_header([frame[0], frame[1], frame[2]]).is_ok());
        assert_eq!(decode_type(frame[3]), FrameKind::Text);
        let count = decode_length([frame[4], frame[5]]) as usize;
        assert_eq!(count, original.chars().count());
        assert_eq!(decode_text(&frame[6..]), original);
    }

    #[test]
    fn test_decode_image_trims_partial_pixels() {
        let image = decode_image(2, 1, &[1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(image.pixels, vec![1, 2, 3, 4, 5, 6]);
        assert!(image.is_complete());
    }

    #[test]
    fn test_cells_preview_drops_zero_bytes() {
        let cells = [0u8, 0, 0, b'h', 0, 0, 0, b'i'];
        assert_eq!(cells_preview(&cells), "hi");
    }

    #[test]
    fn test_cells_preview_multibyte() {
        let cells = [0x00, 0x00, 0xc3, 0xa9];
        assert_eq!(cells_preview(&cells), "\u{e9}");
    }
}
