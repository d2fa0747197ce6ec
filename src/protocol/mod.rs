//! ISC frame protocol: kinds, wire codec and decoded payloads.

pub mod codec;
pub mod frame;

pub use codec::{CELL_BYTES, MAGIC};
pub use frame::{Frame, FrameKind, RasterImage};
