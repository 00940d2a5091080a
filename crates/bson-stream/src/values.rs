//! The BSON value model.
//!
//! BSON documents are ordered sequences of `(key, value)` pairs; arrays are
//! documents whose keys are the decimal string of each element's index.

use uuid::Uuid;

/// Generic binary subtype.
pub const BINARY_SUBTYPE_GENERIC: u8 = 0x00;
/// Legacy UUID binary subtype.
pub const BINARY_SUBTYPE_UUID_OLD: u8 = 0x03;
/// UUID binary subtype.
pub const BINARY_SUBTYPE_UUID: u8 = 0x04;

/// BSON binary data (subtype byte + raw bytes).
#[derive(Debug, Clone, PartialEq)]
pub struct BsonBinary {
    pub subtype: u8,
    pub data: Vec<u8>,
}

/// A BSON value that can appear as a document field value.
///
/// Integers come in two flavors: the generic [`BsonValue::Integer`], whose
/// wire width is chosen from its magnitude on encode, and the width-pinned
/// [`BsonValue::Int32`] / [`BsonValue::Int64`] / [`BsonValue::UInt64`]
/// wrappers, which always take their own tag. Decoding with
/// `typed_integers` produces the pinned variants so a re-encode reproduces
/// the original bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum BsonValue {
    /// 64-bit float (0x01).
    Float(f64),
    /// UTF-8 string (0x02).
    Str(String),
    /// Embedded document (0x03).
    Document(Vec<(String, BsonValue)>),
    /// Array (0x04).
    Array(Vec<BsonValue>),
    /// Binary data (0x05).
    Binary(BsonBinary),
    /// UUID, stored as binary subtype 0x04 (0x05).
    Uuid(Uuid),
    /// Undefined, deprecated in the format but still decoded (0x06).
    Undefined,
    /// Boolean (0x08).
    Boolean(bool),
    /// UTC datetime, milliseconds since the Unix epoch (0x09).
    DateTime(i64),
    /// Null (0x0A).
    Null,
    /// Generic integer; encodes as 0x10 when it fits `i32`, as 0x12
    /// otherwise.
    Integer(i64),
    /// Width-pinned 32-bit integer (0x10).
    Int32(i32),
    /// 64-bit unsigned counter/timestamp (0x11).
    UInt64(u64),
    /// Width-pinned 64-bit integer (0x12).
    Int64(i64),
    /// Min-key sentinel (0xFF).
    MinKey,
    /// Max-key sentinel (0x7F).
    MaxKey,
}

impl BsonValue {
    /// Returns true for the container variants (document or array).
    pub fn is_container(&self) -> bool {
        matches!(self, BsonValue::Document(_) | BsonValue::Array(_))
    }
}
