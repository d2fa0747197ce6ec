//! # iscat - terminal client for the ISC relay chat protocol
//!
//! iscat talks to a relay that broadcasts framed messages to every
//! connected client. Each frame starts with the `ISC` magic, a kind
//! byte and a character count, and carries every character as a
//! 4-byte cell. The client renders the traffic in a TUI, saves
//! received images to disk, and plays the relay's cryptography
//! exercises.
//!
//! ## Overview
//!
//! - Text frames (`t`) are plain chat traffic
//! - Server frames (`s`) carry exercise traffic; sending a
//!   `task <cipher> <direction> <n>` announcement arms a task and the
//!   relay's follow-up messages drive it to completion
//! - Image frames (`i`) are raw RGB rasters, saved as PNG
//! - `/crypto` runs the same ciphers locally without touching the wire
//!
//! ## Example
//!
//! ```rust
//! use iscat::protocol::{codec, FrameKind};
//!
//! let frame = codec::encode_text(FrameKind::Text, "hi").unwrap();
//! assert_eq!(&frame[..3], b"ISC");
//! assert_eq!(frame[3], b't');
//! ```
//!
//! ## Modules
//!
//! - [`protocol`]: ISC frame encoding and decoding
//! - [`net`]: TCP connection to the relay, framed reads and writes
//! - [`client`]: background client task, echo handling, image saving
//! - [`tasks`]: relay-driven task state machine
//! - [`crypto`]: shift, vigenere, RSA, hashing and Diffie-Hellman
//! - [`command`]: input line interpretation (`/s`, `/task`, `/crypto`)
//! - [`tui`]: ratatui chat interface

pub mod client;
pub mod command;
pub mod config;
pub mod crypto;
pub mod error;
pub mod net;
pub mod protocol;
pub mod tasks;
pub mod tui;

// Re-export commonly used types at the crate root
pub use client::{ClientEvent, ClientHandle, RelayClient, StatusEvent};
pub use config::ClientConfig;
pub use error::{
    ConnectionError, CryptoRangeError, EncodingError, FramingError, ReceiveError, TaskError,
    TaskInputError,
};
pub use protocol::{Frame, FrameKind, RasterImage};
pub use tasks::{TaskCoordinator, TaskReply, TaskRequest};
