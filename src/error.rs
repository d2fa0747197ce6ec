//! Error types for the protocol, transport and task layers.

use thiserror::Error;

/// Failure to establish a TCP connection to the relay.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The relay address could not be reached.
    #[error("could not connect to {addr}: {source}")]
    Connect {
        /// Address in `host:port` form.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur while encoding an outgoing frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    /// The payload holds more cells than the 16-bit length field can describe.
    #[error("payload of {0} cells exceeds the u16 frame length")]
    TooManyCells(usize),

    /// A pre-encoded payload is not a whole number of 4-byte cells.
    #[error("raw payload of {0} bytes is not a multiple of the cell width")]
    RaggedCells(usize),
}

/// Errors that can occur while decoding an incoming frame header.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FramingError {
    /// The stream did not start with the `ISC` magic.
    #[error("bad frame magic {0:02x?}")]
    BadMagic([u8; 3]),
}

/// Errors that can occur while reading a frame from the relay.
///
/// Both variants are fatal for the connection that produced them. The stream
/// position is unknown afterwards, so the reader must not attempt to resume.
#[derive(Debug, Error)]
pub enum ReceiveError {
    /// The socket failed or closed mid-frame.
    #[error("connection lost: {0}")]
    Io(#[from] std::io::Error),

    /// The byte stream desynchronised from the frame grammar.
    #[error(transparent)]
    Framing(#[from] FramingError),
}

/// A cipher output does not fit a 4-byte wire cell.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoRangeError {
    /// A shifted code point left the `0..=u32::MAX` range.
    #[error("shifted value {value} at index {index} does not fit a wire cell")]
    Shift {
        /// Character position in the plaintext.
        index: usize,
        /// The out-of-range shifted value.
        value: i128,
    },

    /// An RSA residue is too large for a wire cell.
    #[error("RSA residue {value} at index {index} does not fit a wire cell")]
    Rsa {
        /// Character position in the plaintext.
        index: usize,
        /// The oversized residue, in decimal.
        value: String,
    },
}

/// A task input message could not be parsed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TaskInputError {
    /// The key message held no whitespace-separated token.
    #[error("key message {0:?} holds no key token")]
    MissingKey(String),

    /// The shift key token was not an integer.
    #[error("invalid shift key {0:?}")]
    InvalidShiftKey(String),

    /// The RSA parameter message was not in `n=<modulus>, e=<exponent>` form.
    #[error("invalid RSA parameters {0:?}")]
    InvalidRsaParams(String),

    /// The peer's partial key was not a decimal integer.
    #[error("invalid partial key {0:?}")]
    InvalidPartialKey(String),
}

/// Errors that abort an in-progress task.
///
/// The coordinator returns to idle and sends nothing when one of these
/// occurs; the buffered inputs for the task are discarded.
#[derive(Debug, Error)]
pub enum TaskError {
    /// An input message was malformed.
    #[error(transparent)]
    Input(#[from] TaskInputError),

    /// A cipher result fell outside the wire cell range.
    #[error(transparent)]
    Range(#[from] CryptoRangeError),
}
