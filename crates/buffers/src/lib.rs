//! Byte-level plumbing for the BSON codec: a cursor-tracking reader over a
//! borrowed slice and an auto-growing, seekable writer.
//!
//! All multi-byte reads and writes are little-endian, which is the only
//! byte order the format uses.

use thiserror::Error;

mod reader;
mod writer;

pub use reader::Reader;
pub use writer::Writer;

/// Error type for buffer cursor operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BufferError {
    #[error("unexpected end of buffer")]
    EndOfBuffer,
    #[error("seek position out of bounds")]
    SeekOutOfBounds,
}
