//! Element type tags and the runtime-extensible opcode registry.

use std::collections::HashMap;
use std::sync::Arc;

use bson_stream_buffers::Reader;
use uuid::Uuid;

use crate::error::DecodeError;
use crate::options::DecoderOptions;
use crate::strings;
use crate::values::{
    BsonBinary, BsonValue, BINARY_SUBTYPE_UUID, BINARY_SUBTYPE_UUID_OLD,
};

/// End of document/array; never a valid element tag.
pub const TERMINATOR: u8 = 0x00;
/// 64-bit float.
pub const FLOAT: u8 = 0x01;
/// Length-prefixed UTF-8 string.
pub const STRING: u8 = 0x02;
/// Embedded document.
pub const DOCUMENT: u8 = 0x03;
/// Array (document with decimal-string keys).
pub const ARRAY: u8 = 0x04;
/// Binary data with a subtype byte.
pub const BINARY: u8 = 0x05;
/// Undefined (deprecated).
pub const UNDEFINED: u8 = 0x06;
/// ObjectId; recognized but unimplemented.
pub const OBJECT_ID: u8 = 0x07;
/// Boolean.
pub const BOOLEAN: u8 = 0x08;
/// UTC datetime in milliseconds.
pub const DATETIME: u8 = 0x09;
/// Null.
pub const NULL: u8 = 0x0a;
/// Regular expression; recognized but unimplemented.
pub const REGEX: u8 = 0x0b;
/// DBPointer; recognized but unimplemented.
pub const DB_POINTER: u8 = 0x0c;
/// JavaScript code; recognized but unimplemented.
pub const JS_CODE: u8 = 0x0d;
/// Symbol; recognized but unimplemented.
pub const SYMBOL: u8 = 0x0e;
/// JavaScript code with scope; recognized but unimplemented.
pub const JS_CODE_WITH_SCOPE: u8 = 0x0f;
/// 32-bit signed integer.
pub const INT32: u8 = 0x10;
/// 64-bit unsigned counter/timestamp.
pub const UINT64: u8 = 0x11;
/// 64-bit signed integer.
pub const INT64: u8 = 0x12;
/// Decimal128; recognized but unimplemented.
pub const DECIMAL128: u8 = 0x13;
/// Max-key sentinel.
pub const MAX_KEY: u8 = 0x7f;
/// Min-key sentinel.
pub const MIN_KEY: u8 = 0xff;

/// A decode callback for one element tag. Handlers read the element's
/// payload from the reader and return the decoded value.
pub type OpcodeHandler =
    Arc<dyn Fn(&mut Reader<'_>) -> Result<BsonValue, DecodeError> + Send + Sync>;

fn handler<F>(f: F) -> OpcodeHandler
where
    F: Fn(&mut Reader<'_>) -> Result<BsonValue, DecodeError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Maps element tags to decode callbacks.
///
/// The container tags (0x03/0x04) and the terminator are handled by the
/// scan engine itself — they push and pop frames — so they cannot be
/// registered here. Everything else may be overridden or added, which is
/// how consumer extension types come in: a custom handler maps its opcode
/// onto any [`BsonValue`].
///
/// Cloning is cheap; handlers are shared.
#[derive(Clone)]
pub struct OpcodeRegistry {
    handlers: HashMap<u8, OpcodeHandler>,
}

impl OpcodeRegistry {
    /// Builds the default registry for the given options. The null and
    /// min-key/max-key handlers produce clones of the configured sentinel
    /// values; the integer handlers honor `typed_integers`.
    pub fn with_options(options: &DecoderOptions) -> Self {
        let mut handlers: HashMap<u8, OpcodeHandler> = HashMap::new();

        handlers.insert(FLOAT, handler(|r| Ok(BsonValue::Float(r.f64_le()?))));
        let utf8_fallback = options.utf8_fallback;
        handlers.insert(
            STRING,
            handler(move |r| strings::read_string_value(r, utf8_fallback)),
        );
        handlers.insert(BINARY, handler(read_binary));
        handlers.insert(UNDEFINED, handler(|_| Ok(BsonValue::Undefined)));
        handlers.insert(BOOLEAN, handler(|r| match r.u8()? {
            0x00 => Ok(BsonValue::Boolean(false)),
            0x01 => Ok(BsonValue::Boolean(true)),
            other => Err(DecodeError::InvalidBoolean(other)),
        }));
        handlers.insert(DATETIME, handler(|r| Ok(BsonValue::DateTime(r.i64_le()?))));
        let null = options.null.clone();
        handlers.insert(NULL, handler(move |_| Ok(null.clone())));
        if options.typed_integers {
            handlers.insert(INT32, handler(|r| Ok(BsonValue::Int32(r.i32_le()?))));
            handlers.insert(INT64, handler(|r| Ok(BsonValue::Int64(r.i64_le()?))));
        } else {
            handlers.insert(
                INT32,
                handler(|r| Ok(BsonValue::Integer(i64::from(r.i32_le()?)))),
            );
            handlers.insert(INT64, handler(|r| Ok(BsonValue::Integer(r.i64_le()?))));
        }
        handlers.insert(UINT64, handler(|r| Ok(BsonValue::UInt64(r.u64_le()?))));
        let max_key = options.max_key.clone();
        handlers.insert(MAX_KEY, handler(move |_| Ok(max_key.clone())));
        let min_key = options.min_key.clone();
        handlers.insert(MIN_KEY, handler(move |_| Ok(min_key.clone())));

        Self { handlers }
    }

    /// Registers (or overrides) the handler for an opcode. The terminator
    /// and the container tags are rejected with
    /// [`DecodeError::ReservedOpcode`].
    pub fn register<F>(&mut self, opcode: u8, f: F) -> Result<(), DecodeError>
    where
        F: Fn(&mut Reader<'_>) -> Result<BsonValue, DecodeError> + Send + Sync + 'static,
    {
        match opcode {
            TERMINATOR | DOCUMENT | ARRAY => Err(DecodeError::ReservedOpcode(opcode)),
            _ => {
                self.handlers.insert(opcode, Arc::new(f));
                Ok(())
            }
        }
    }

    /// Dispatches an opcode to its handler. Tags without a handler —
    /// including the recognized-but-unimplemented ones (0x07, 0x0B–0x0F,
    /// 0x13) — fail with [`DecodeError::UnsupportedOpcode`].
    pub fn dispatch(
        &self,
        opcode: u8,
        reader: &mut Reader<'_>,
    ) -> Result<BsonValue, DecodeError> {
        match self.handlers.get(&opcode) {
            Some(f) => f(reader),
            None => Err(DecodeError::UnsupportedOpcode(opcode)),
        }
    }
}

fn read_binary(reader: &mut Reader<'_>) -> Result<BsonValue, DecodeError> {
    let length = reader.i32_le()?;
    if length < 0 {
        return Err(DecodeError::InvalidLength(i64::from(length)));
    }
    let subtype = reader.u8()?;
    let data = reader.buf(length as usize)?;
    if subtype == BINARY_SUBTYPE_UUID || subtype == BINARY_SUBTYPE_UUID_OLD {
        let bytes: [u8; 16] = data
            .try_into()
            .map_err(|_| DecodeError::InvalidBinary {
                subtype,
                len: data.len(),
            })?;
        return Ok(BsonValue::Uuid(Uuid::from_bytes(bytes)));
    }
    Ok(BsonValue::Binary(BsonBinary {
        subtype,
        data: data.to_vec(),
    }))
}
