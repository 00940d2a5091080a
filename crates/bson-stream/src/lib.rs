//! Streaming BSON codec.
//!
//! Converts between a tree of typed values ([`BsonValue`]) and the
//! length-prefixed binary document format, in both directions without
//! native recursion: the decode side ([`BsonScanner`], [`BsonDecoder`])
//! and the encode side ([`BsonEncoder`]) each drive an explicit frame
//! stack, so nesting depth is bounded by heap, not by the call stack.
//!
//! The scanner is the streaming entry point: it yields one structural or
//! value event per step and accepts a skip directive at every frame start,
//! which makes it possible to search a large document without decoding
//! sibling subtrees. [`BsonDecoder::decode`] and [`BsonEncoder::encode`]
//! are the materializing wrappers on top.
//!
//! ```
//! use bson_stream::{decode, encode, BsonValue};
//!
//! let doc = BsonValue::Document(vec![
//!     ("greeting".to_string(), BsonValue::Str("hello".to_string())),
//!     ("count".to_string(), BsonValue::Integer(3)),
//! ]);
//! let bytes = encode(&doc).unwrap();
//! let fields = decode(&bytes).unwrap();
//! assert_eq!(fields[0].0, "greeting");
//! ```

pub mod decoder;
pub mod encoder;
pub mod error;
pub mod json;
pub mod opcodes;
pub mod options;
pub mod scanner;
pub mod strings;
pub mod values;

pub use bson_stream_buffers::{BufferError, Reader, Writer};
pub use decoder::BsonDecoder;
pub use encoder::BsonEncoder;
pub use error::{DecodeError, EncodeError};
pub use opcodes::{OpcodeHandler, OpcodeRegistry};
pub use options::DecoderOptions;
pub use scanner::{BsonScanner, ScanEvent};
pub use uuid::Uuid;
pub use values::{
    BsonBinary, BsonValue, BINARY_SUBTYPE_GENERIC, BINARY_SUBTYPE_UUID, BINARY_SUBTYPE_UUID_OLD,
};

/// Encodes a root document value to bytes with default settings.
pub fn encode(value: &BsonValue) -> Result<Vec<u8>, EncodeError> {
    BsonEncoder::new().encode(value)
}

/// Decodes an encoded document to its fields with default settings.
pub fn decode(data: &[u8]) -> Result<Vec<(String, BsonValue)>, DecodeError> {
    BsonDecoder::new().decode(data)
}
