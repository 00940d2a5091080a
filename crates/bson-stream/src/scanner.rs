//! The streaming decode engine.
//!
//! A [`BsonScanner`] walks an encoded document one event at a time over an
//! explicit, heap-allocated frame stack, so nesting depth never touches the
//! native call stack. The traversal is cooperative: at every
//! [`ScanEvent::DocumentStart`] the engine suspends, and the consumer may
//! call [`BsonScanner::skip`] to seek past the whole subtree instead of
//! descending into it — the basis for scanning a large document without
//! materializing it.

use bson_stream_buffers::Reader;

use crate::error::{dotted_path, DecodeError};
use crate::opcodes::{self, OpcodeRegistry};
use crate::options::DecoderOptions;
use crate::strings;
use crate::values::BsonValue;

/// One structural or value event of the traversal.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanEvent {
    /// A document or array frame opened. The scanner is now suspended:
    /// calling [`BsonScanner::skip`] before the next step seeks past the
    /// frame instead of entering it. The root document arrives as the
    /// first event with the empty key.
    DocumentStart { key: String, array: bool },
    /// The frame nested under `key` closed.
    DocumentEnd { key: String, array: bool },
    /// A scalar element.
    Value { key: String, value: BsonValue },
}

/// Traversal state for one open frame.
struct ScanFrame {
    key: String,
    /// Offset of the frame's length field.
    len_pos: usize,
    /// Value of the length field: bytes from `len_pos` through the
    /// terminator inclusive.
    length: usize,
    array: bool,
}

enum ScanState {
    /// Nothing read yet; the next step opens the root frame.
    Start,
    /// Inside a frame, reading elements.
    Scanning,
    /// Suspended at a `DocumentStart`, awaiting the consumer's directive.
    Suspended {
        key: String,
        array: bool,
        len_pos: usize,
        length: usize,
    },
    Done,
}

/// Suspendable, non-recursive scanner over an encoded document.
pub struct BsonScanner<'a> {
    reader: Reader<'a>,
    registry: OpcodeRegistry,
    utf8_fallback: bool,
    stack: Vec<ScanFrame>,
    state: ScanState,
    skip_requested: bool,
}

impl<'a> BsonScanner<'a> {
    /// Creates a scanner with default options.
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_options(data, DecoderOptions::default())
    }

    /// Creates a scanner with the given options.
    pub fn with_options(data: &'a [u8], options: DecoderOptions) -> Self {
        let registry = OpcodeRegistry::with_options(&options);
        Self::with_registry(data, registry, options.utf8_fallback)
    }

    /// Creates a scanner around an existing registry.
    pub fn with_registry(data: &'a [u8], registry: OpcodeRegistry, utf8_fallback: bool) -> Self {
        Self {
            reader: Reader::new(data),
            registry,
            utf8_fallback,
            stack: Vec::new(),
            state: ScanState::Start,
            skip_requested: false,
        }
    }

    /// Registers a custom opcode handler. See [`OpcodeRegistry::register`].
    pub fn register_opcode<F>(&mut self, opcode: u8, f: F) -> Result<(), DecodeError>
    where
        F: Fn(&mut Reader<'_>) -> Result<BsonValue, DecodeError> + Send + Sync + 'static,
    {
        self.registry.register(opcode, f)
    }

    /// Requests that the frame whose `DocumentStart` was just emitted be
    /// skipped. This is a hint: it is honored only while the scanner is
    /// suspended at a start event and ignored at any other time.
    pub fn skip(&mut self) {
        if matches!(self.state, ScanState::Suspended { .. }) {
            self.skip_requested = true;
        }
    }

    /// Number of frames currently open.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Current byte offset of the cursor.
    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    /// Dotted key path of the open frames, for diagnostics.
    pub fn path(&self) -> String {
        dotted_path(self.stack.iter().skip(1).map(|f| f.key.as_str()))
    }

    /// Advances the traversal by one step and returns the next event, or
    /// `None` once the root frame has closed (or been skipped). After an
    /// error the traversal is finished; it does not resynchronize.
    pub fn next_event(&mut self) -> Result<Option<ScanEvent>, DecodeError> {
        let result = self.advance();
        if result.is_err() {
            self.state = ScanState::Done;
        }
        result
    }

    fn advance(&mut self) -> Result<Option<ScanEvent>, DecodeError> {
        match std::mem::replace(&mut self.state, ScanState::Scanning) {
            ScanState::Done => {
                self.state = ScanState::Done;
                return Ok(None);
            }
            ScanState::Start => {
                let len_pos = self.reader.pos();
                let length = self.read_frame_length(len_pos)?;
                self.state = ScanState::Suspended {
                    key: String::new(),
                    array: false,
                    len_pos,
                    length,
                };
                return Ok(Some(ScanEvent::DocumentStart {
                    key: String::new(),
                    array: false,
                }));
            }
            ScanState::Suspended {
                key,
                array,
                len_pos,
                length,
            } => {
                if self.skip_requested {
                    self.skip_requested = false;
                    // Resume at the byte just past the subtree: the length
                    // field counts from its own first byte through the
                    // terminator.
                    self.reader.seek(len_pos + length)?;
                    if self.stack.is_empty() {
                        self.state = ScanState::Done;
                        return Ok(None);
                    }
                } else {
                    self.stack.push(ScanFrame {
                        key,
                        len_pos,
                        length,
                        array,
                    });
                }
            }
            ScanState::Scanning => {}
        }
        self.step()
    }

    /// Reads one element of the current frame.
    fn step(&mut self) -> Result<Option<ScanEvent>, DecodeError> {
        let opcode = self.reader.u8()?;

        if opcode == opcodes::TERMINATOR {
            let frame = self.stack.pop().ok_or(DecodeError::InvalidEndState)?;
            let expected = frame.len_pos + frame.length;
            let actual = self.reader.pos();
            if actual != expected {
                return Err(DecodeError::LengthMismatch { expected, actual });
            }
            if self.stack.is_empty() {
                self.state = ScanState::Done;
            }
            return Ok(Some(ScanEvent::DocumentEnd {
                key: frame.key,
                array: frame.array,
            }));
        }

        let key = strings::read_cstring(&mut self.reader, self.utf8_fallback)?;

        if opcode == opcodes::DOCUMENT || opcode == opcodes::ARRAY {
            let len_pos = self.reader.pos();
            let length = self.read_frame_length(len_pos)?;
            let array = opcode == opcodes::ARRAY;
            self.state = ScanState::Suspended {
                key: key.clone(),
                array,
                len_pos,
                length,
            };
            return Ok(Some(ScanEvent::DocumentStart { key, array }));
        }

        let value = self.registry.dispatch(opcode, &mut self.reader)?;
        Ok(Some(ScanEvent::Value { key, value }))
    }

    /// Reads and validates a frame's length field. The smallest legal
    /// frame is the field itself plus the terminator (five bytes), and the
    /// frame must fit inside the source.
    fn read_frame_length(&mut self, len_pos: usize) -> Result<usize, DecodeError> {
        let raw = self.reader.i32_le()?;
        if raw < 5 {
            return Err(DecodeError::InvalidLength(i64::from(raw)));
        }
        let length = raw as usize;
        if len_pos + length > self.reader.data.len() {
            return Err(DecodeError::InvalidLength(i64::from(raw)));
        }
        Ok(length)
    }
}
