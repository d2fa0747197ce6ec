//! Frame kinds and decoded frame payloads.

/// Kind of an ISC frame, carried as a single ASCII byte after the magic.
///
/// Unknown kind bytes are preserved in [`FrameKind::Other`] so that new
/// frame kinds introduced by the relay decode as text instead of breaking
/// the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Ordinary chat text (`t`), broadcast to every connected client.
    Text,
    /// Relay-directed message (`s`), used by the crypto exercises.
    Relay,
    /// Raw RGB image (`i`).
    Image,
    /// Any other kind byte, kept verbatim.
    Other(u8),
}

impl FrameKind {
    /// Returns the wire byte for this kind.
    pub const fn as_byte(self) -> u8 {
        match self {
            FrameKind::Text => b't',
            FrameKind::Relay => b's',
            FrameKind::Image => b'i',
            FrameKind::Other(byte) => byte,
        }
    }

    /// Maps a wire byte to its kind. Never produces `Other` for a known byte.
    pub const fn from_byte(byte: u8) -> Self {
        match byte {
            b't' => FrameKind::Text,
            b's' => FrameKind::Relay,
            b'i' => FrameKind::Image,
            other => FrameKind::Other(other),
        }
    }
}

/// A raw RGB image carried by an image frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    /// Width in pixels.
    pub width: u8,
    /// Height in pixels.
    pub height: u8,
    /// Row-major RGB triplets, possibly short of `width * height`.
    pub pixels: Vec<u8>,
}

impl RasterImage {
    /// Byte count a complete `width x height` RGB raster would have.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Whether every pixel announced by the header actually arrived.
    pub fn is_complete(&self) -> bool {
        self.pixels.len() == self.expected_len()
    }
}

/// A fully decoded incoming frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// Chat text from another client (or our own echo).
    Text(String),
    /// Relay-directed text, fed to the task coordinator.
    Relay(String),
    /// An image broadcast.
    Image(RasterImage),
    /// Text payload of an unrecognised kind.
    Other {
        /// The unrecognised kind byte.
        kind: u8,
        /// Payload decoded as cell text.
        text: String,
    },
}

impl Frame {
    /// Returns the kind this frame arrived with.
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Text(_) => FrameKind::Text,
            Frame::Relay(_) => FrameKind::Relay,
            Frame::Image(_) => FrameKind::Image,
            Frame::Other { kind, .. } => FrameKind::Other(*kind),
        }
    }
}
