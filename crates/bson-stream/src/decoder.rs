//! The materializing decoder: drives a scanner and builds the value tree.

use bson_stream_buffers::Reader;

use crate::error::DecodeError;
use crate::opcodes::OpcodeRegistry;
use crate::options::DecoderOptions;
use crate::scanner::{BsonScanner, ScanEvent};
use crate::values::BsonValue;

/// Accumulator for one container being filled in.
enum Node {
    Doc {
        key: String,
        fields: Vec<(String, BsonValue)>,
    },
    Arr {
        key: String,
        items: Vec<BsonValue>,
    },
}

impl Node {
    fn attach(&mut self, key: String, value: BsonValue) -> Result<(), DecodeError> {
        match self {
            Node::Doc { fields, .. } => {
                // Duplicate keys are legal in the format; the last write
                // wins and keeps the original position.
                match fields.iter_mut().find(|(k, _)| *k == key) {
                    Some(slot) => slot.1 = value,
                    None => fields.push((key, value)),
                }
            }
            Node::Arr { items, .. } => {
                if key != items.len().to_string() {
                    return Err(DecodeError::InvalidArrayKey {
                        key,
                        expected: items.len(),
                    });
                }
                items.push(value);
            }
        }
        Ok(())
    }

    fn into_key_value(self) -> (String, BsonValue) {
        match self {
            Node::Doc { key, fields } => (key, BsonValue::Document(fields)),
            Node::Arr { key, items } => (key, BsonValue::Array(items)),
        }
    }
}

/// Decodes an encoded document into a `Vec<(String, BsonValue)>`.
///
/// # Example
///
/// ```
/// use bson_stream::{BsonDecoder, BsonValue};
///
/// let data = b"\x10\x00\x00\x00\x10value\x00\x7b\x00\x00\x00\x00";
/// let fields = BsonDecoder::new().decode(data).unwrap();
/// assert_eq!(fields, vec![("value".to_string(), BsonValue::Integer(123))]);
/// ```
pub struct BsonDecoder {
    options: DecoderOptions,
    registry: OpcodeRegistry,
}

impl Default for BsonDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl BsonDecoder {
    pub fn new() -> Self {
        Self::with_options(DecoderOptions::default())
    }

    pub fn with_options(options: DecoderOptions) -> Self {
        let registry = OpcodeRegistry::with_options(&options);
        Self { options, registry }
    }

    /// Registers a custom opcode handler used by every subsequent
    /// [`BsonDecoder::decode`] call. See [`OpcodeRegistry::register`].
    pub fn register_opcode<F>(&mut self, opcode: u8, f: F) -> Result<(), DecodeError>
    where
        F: Fn(&mut Reader<'_>) -> Result<BsonValue, DecodeError> + Send + Sync + 'static,
    {
        self.registry.register(opcode, f)
    }

    /// Decodes a document, materializing the whole tree. Array frames are
    /// validated as they fill: each key must be the decimal string of the
    /// running element count.
    pub fn decode(&self, data: &[u8]) -> Result<Vec<(String, BsonValue)>, DecodeError> {
        let mut scanner =
            BsonScanner::with_registry(data, self.registry.clone(), self.options.utf8_fallback);
        let mut stack: Vec<Node> = Vec::new();
        let mut result: Option<Vec<(String, BsonValue)>> = None;

        while let Some(event) = scanner.next_event()? {
            match event {
                ScanEvent::DocumentStart { key, array } => {
                    if array {
                        stack.push(Node::Arr {
                            key,
                            items: Vec::new(),
                        });
                    } else {
                        stack.push(Node::Doc {
                            key,
                            fields: Vec::new(),
                        });
                    }
                }
                ScanEvent::Value { key, value } => {
                    stack
                        .last_mut()
                        .ok_or(DecodeError::InvalidEndState)?
                        .attach(key, value)?;
                }
                ScanEvent::DocumentEnd { .. } => {
                    let node = stack.pop().ok_or(DecodeError::InvalidEndState)?;
                    let (key, value) = node.into_key_value();
                    match stack.last_mut() {
                        Some(parent) => parent.attach(key, value)?,
                        None => match value {
                            BsonValue::Document(fields) => result = Some(fields),
                            // The root frame is never an array.
                            _ => return Err(DecodeError::InvalidEndState),
                        },
                    }
                }
            }
        }

        result.ok_or(DecodeError::InvalidEndState)
    }
}
