//! The backpatching encode engine.
//!
//! Containers are written with a zero length placeholder first; once a
//! frame's children are exhausted the engine seeks back, overwrites the
//! placeholder with the real length, and seeks forward again. Nesting is
//! tracked on an explicit frame stack, so documents thousands of levels
//! deep cost heap, not native stack.

use std::borrow::Cow;

use bson_stream_buffers::Writer;

use crate::error::{dotted_path, EncodeError};
use crate::opcodes;
use crate::strings;
use crate::values::{BsonValue, BINARY_SUBTYPE_UUID};

/// Cursor over the remaining children of one open frame.
#[derive(Clone, Copy)]
enum Children<'v> {
    Doc(&'v [(String, BsonValue)]),
    Arr(&'v [BsonValue]),
}

/// Traversal state for one open frame being written.
struct WriteFrame<'v> {
    key: Cow<'v, str>,
    /// Offset of the frame's length placeholder.
    len_pos: usize,
    children: Children<'v>,
    idx: usize,
}

fn element_path(stack: &[WriteFrame<'_>], key: &str) -> String {
    dotted_path(
        stack
            .iter()
            .skip(1)
            .map(|f| f.key.as_ref())
            .chain(std::iter::once(key)),
    )
}

/// Encodes a value tree to bytes.
///
/// # Example
///
/// ```
/// use bson_stream::{BsonEncoder, BsonValue};
///
/// let fields = vec![("value".to_string(), BsonValue::Integer(123))];
/// let bytes = BsonEncoder::new().encode_document(&fields).unwrap();
/// assert_eq!(bytes, b"\x10\x00\x00\x00\x10value\x00\x7b\x00\x00\x00\x00");
/// ```
pub struct BsonEncoder {
    writer: Writer,
}

impl Default for BsonEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BsonEncoder {
    pub fn new() -> Self {
        Self {
            writer: Writer::new(),
        }
    }

    /// Encodes a root value, which must be a document.
    pub fn encode(&mut self, value: &BsonValue) -> Result<Vec<u8>, EncodeError> {
        match value {
            BsonValue::Document(fields) => self.encode_document(fields),
            _ => Err(EncodeError::NonDocumentRoot),
        }
    }

    /// Encodes a document given as key-value pairs, in order.
    pub fn encode_document(
        &mut self,
        fields: &[(String, BsonValue)],
    ) -> Result<Vec<u8>, EncodeError> {
        // Discard anything left behind by a previously failed call.
        self.writer.flush();

        let mut stack: Vec<WriteFrame<'_>> = Vec::new();
        let len_pos = self.writer.pos();
        self.writer.i32_le(0);
        stack.push(WriteFrame {
            key: Cow::Borrowed(""),
            len_pos,
            children: Children::Doc(fields),
            idx: 0,
        });

        loop {
            let (children, idx, frame_len_pos) = match stack.last() {
                Some(frame) => (frame.children, frame.idx, frame.len_pos),
                None => break,
            };

            let next = match children {
                Children::Doc(fields) => fields
                    .get(idx)
                    .map(|(k, v)| (Cow::Borrowed(k.as_str()), v)),
                Children::Arr(items) => items.get(idx).map(|v| (Cow::Owned(idx.to_string()), v)),
            };

            let Some((key, value)) = next else {
                // Frame exhausted: terminator, then backpatch the length.
                self.writer.u8(opcodes::TERMINATOR);
                let end = self.writer.pos();
                let length = (end - frame_len_pos) as i32;
                self.writer
                    .seek(frame_len_pos)
                    .expect("length placeholder lies inside the written region");
                self.writer.i32_le(length);
                self.writer
                    .seek(end)
                    .expect("frame end lies inside the written region");
                stack.pop();
                continue;
            };

            if let Some(frame) = stack.last_mut() {
                frame.idx += 1;
            }

            // Array keys are generated decimal strings; only document keys
            // can carry an interior null byte.
            if matches!(children, Children::Doc(_)) && key.as_bytes().contains(&0) {
                return Err(EncodeError::InvalidKey {
                    path: element_path(&stack, &key),
                    key: key.into_owned(),
                });
            }

            match value {
                BsonValue::Document(fields) => {
                    self.writer.u8(opcodes::DOCUMENT);
                    strings::write_cstring(&mut self.writer, &key);
                    let len_pos = self.writer.pos();
                    self.writer.i32_le(0);
                    stack.push(WriteFrame {
                        key,
                        len_pos,
                        children: Children::Doc(fields),
                        idx: 0,
                    });
                }
                BsonValue::Array(items) => {
                    self.writer.u8(opcodes::ARRAY);
                    strings::write_cstring(&mut self.writer, &key);
                    let len_pos = self.writer.pos();
                    self.writer.i32_le(0);
                    stack.push(WriteFrame {
                        key,
                        len_pos,
                        children: Children::Arr(items),
                        idx: 0,
                    });
                }
                scalar => self.write_scalar(&key, scalar),
            }
        }

        Ok(self.writer.flush())
    }

    fn write_scalar(&mut self, key: &str, value: &BsonValue) {
        match value {
            BsonValue::Float(f) => {
                self.writer.u8(opcodes::FLOAT);
                strings::write_cstring(&mut self.writer, key);
                self.writer.f64_le(*f);
            }
            BsonValue::Str(s) => {
                self.writer.u8(opcodes::STRING);
                strings::write_cstring(&mut self.writer, key);
                strings::write_string(&mut self.writer, s);
            }
            BsonValue::Binary(bin) => {
                self.writer.u8(opcodes::BINARY);
                strings::write_cstring(&mut self.writer, key);
                self.writer.i32_le(bin.data.len() as i32);
                self.writer.u8(bin.subtype);
                self.writer.buf(&bin.data);
            }
            BsonValue::Uuid(u) => {
                self.writer.u8(opcodes::BINARY);
                strings::write_cstring(&mut self.writer, key);
                self.writer.i32_le(16);
                self.writer.u8(BINARY_SUBTYPE_UUID);
                self.writer.buf(u.as_bytes());
            }
            BsonValue::Undefined => {
                self.writer.u8(opcodes::UNDEFINED);
                strings::write_cstring(&mut self.writer, key);
            }
            // Boolean is classified before the integer family: a boolean
            // is representable as an integer and must never take a
            // numeric tag.
            BsonValue::Boolean(b) => {
                self.writer.u8(opcodes::BOOLEAN);
                strings::write_cstring(&mut self.writer, key);
                self.writer.u8(u8::from(*b));
            }
            BsonValue::DateTime(ms) => {
                self.writer.u8(opcodes::DATETIME);
                strings::write_cstring(&mut self.writer, key);
                self.writer.i64_le(*ms);
            }
            BsonValue::Null => {
                self.writer.u8(opcodes::NULL);
                strings::write_cstring(&mut self.writer, key);
            }
            BsonValue::Integer(v) => match i32::try_from(*v) {
                Ok(v32) => {
                    self.writer.u8(opcodes::INT32);
                    strings::write_cstring(&mut self.writer, key);
                    self.writer.i32_le(v32);
                }
                Err(_) => {
                    self.writer.u8(opcodes::INT64);
                    strings::write_cstring(&mut self.writer, key);
                    self.writer.i64_le(*v);
                }
            },
            BsonValue::Int32(v) => {
                self.writer.u8(opcodes::INT32);
                strings::write_cstring(&mut self.writer, key);
                self.writer.i32_le(*v);
            }
            BsonValue::UInt64(v) => {
                self.writer.u8(opcodes::UINT64);
                strings::write_cstring(&mut self.writer, key);
                self.writer.u64_le(*v);
            }
            BsonValue::Int64(v) => {
                self.writer.u8(opcodes::INT64);
                strings::write_cstring(&mut self.writer, key);
                self.writer.i64_le(*v);
            }
            BsonValue::MinKey => {
                self.writer.u8(opcodes::MIN_KEY);
                strings::write_cstring(&mut self.writer, key);
            }
            BsonValue::MaxKey => {
                self.writer.u8(opcodes::MAX_KEY);
                strings::write_cstring(&mut self.writer, key);
            }
            BsonValue::Document(_) | BsonValue::Array(_) => {
                unreachable!("containers are framed by the engine")
            }
        }
    }
}
