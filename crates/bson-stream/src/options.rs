//! Decoder configuration.

use crate::values::BsonValue;

/// Options controlling how a scanner or decoder interprets the stream.
///
/// Construct with `..Default::default()` and hand to
/// [`crate::BsonDecoder::with_options`] or
/// [`crate::BsonScanner::with_options`].
#[derive(Debug, Clone)]
pub struct DecoderOptions {
    /// Value produced for the min-key opcode (0xFF).
    pub min_key: BsonValue,
    /// Value produced for the max-key opcode (0x7F).
    pub max_key: BsonValue,
    /// Value produced for the null opcode (0x0A).
    pub null: BsonValue,
    /// When true, 0x10 and 0x12 decode to the width-pinned
    /// [`BsonValue::Int32`] / [`BsonValue::Int64`] instead of the generic
    /// [`BsonValue::Integer`], so re-encoding reproduces the original
    /// integer widths. 0x11 always decodes to [`BsonValue::UInt64`].
    pub typed_integers: bool,
    /// When true, malformed UTF-8 no longer fails the decode: keys fall
    /// back to replacement-character decoding and string values to a
    /// generic-subtype [`BsonValue::Binary`] carrying the raw bytes.
    pub utf8_fallback: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            min_key: BsonValue::MinKey,
            max_key: BsonValue::MaxKey,
            null: BsonValue::Null,
            typed_integers: false,
            utf8_fallback: false,
        }
    }
}
