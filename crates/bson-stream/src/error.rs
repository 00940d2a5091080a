//! Decode and encode error types.

use bson_stream_buffers::BufferError;
use thiserror::Error;

/// Error type for decoding operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unexpected end of input")]
    UnexpectedEof,
    #[error("invalid length field: {0}")]
    InvalidLength(i64),
    #[error("document length mismatch: expected end at byte {expected}, found {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("unsupported opcode 0x{0:02x}")]
    UnsupportedOpcode(u8),
    #[error("opcode 0x{0:02x} is reserved and cannot be registered")]
    ReservedOpcode(u8),
    #[error("invalid UTF-8 in string data")]
    InvalidUtf8,
    #[error("string missing its null terminator")]
    InvalidStringTerminator,
    #[error("invalid boolean byte 0x{0:02x}")]
    InvalidBoolean(u8),
    #[error("binary with subtype 0x{subtype:02x} has invalid payload length {len}")]
    InvalidBinary { subtype: u8, len: usize },
    #[error("invalid array key {key:?}, expected index {expected}")]
    InvalidArrayKey { key: String, expected: usize },
    #[error("document ended in an invalid state")]
    InvalidEndState,
}

impl From<BufferError> for DecodeError {
    fn from(_: BufferError) -> Self {
        DecodeError::UnexpectedEof
    }
}

/// Error type for encoding operations.
///
/// The `path` carried by the element-level variants is the dotted key path
/// from the root to the offending element, with literal `.` characters in
/// keys escaped as `\.`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodeError {
    #[error("root value must be a document")]
    NonDocumentRoot,
    #[error("key {key:?} at path {path:?} contains a null byte")]
    InvalidKey { path: String, key: String },
    #[error("value at path {path:?} has no encoding")]
    UnsupportedValue { path: String },
}

/// Joins key segments into a dotted diagnostic path, escaping literal `.`
/// characters in each segment.
pub(crate) fn dotted_path<'k, I>(segments: I) -> String
where
    I: IntoIterator<Item = &'k str>,
{
    segments
        .into_iter()
        .map(|s| s.replace('.', "\\."))
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_path_escapes_literal_dots() {
        assert_eq!(dotted_path(["a", "b.c", "d"]), "a.b\\.c.d");
        assert_eq!(dotted_path(["solo"]), "solo");
        assert_eq!(dotted_path(std::iter::empty::<&str>()), "");
    }
}
