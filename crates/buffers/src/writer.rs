//! Seekable binary writer backed by a growable buffer.

use crate::BufferError;

/// A binary writer that grows automatically and supports seeking back
/// into already written bytes.
///
/// The cursor may be repositioned anywhere inside the written region with
/// [`Writer::seek`]; subsequent writes overwrite in place and extend the
/// buffer only when they run past its end. This is the contract the
/// length-backpatching encoder relies on: write a placeholder, keep going,
/// seek back, overwrite, seek forward.
///
/// # Example
///
/// ```
/// use bson_stream_buffers::Writer;
///
/// let mut writer = Writer::new();
/// writer.i32_le(0); // placeholder
/// writer.u8(0xab);
/// let end = writer.pos();
/// writer.seek(0).unwrap();
/// writer.i32_le(5);
/// writer.seek(end).unwrap();
/// assert_eq!(writer.flush(), [0x05, 0x00, 0x00, 0x00, 0xab]);
/// ```
pub struct Writer {
    /// The underlying byte buffer.
    pub data: Vec<u8>,
    /// Current cursor position.
    pub x: usize,
}

impl Default for Writer {
    fn default() -> Self {
        Self::new()
    }
}

impl Writer {
    /// Creates an empty writer.
    pub fn new() -> Self {
        Self {
            data: Vec::new(),
            x: 0,
        }
    }

    /// Creates a writer with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            x: 0,
        }
    }

    /// Returns the current cursor position.
    #[inline]
    pub fn pos(&self) -> usize {
        self.x
    }

    /// Moves the cursor to an absolute position. The position must lie
    /// within the written region.
    pub fn seek(&mut self, pos: usize) -> Result<(), BufferError> {
        if pos > self.data.len() {
            return Err(BufferError::SeekOutOfBounds);
        }
        self.x = pos;
        Ok(())
    }

    /// Returns the written bytes and resets the writer.
    pub fn flush(&mut self) -> Vec<u8> {
        self.x = 0;
        std::mem::take(&mut self.data)
    }

    #[inline]
    fn put(&mut self, src: &[u8]) {
        let end = self.x + src.len();
        if end > self.data.len() {
            self.data.resize(end, 0);
        }
        self.data[self.x..end].copy_from_slice(src);
        self.x = end;
    }

    /// Writes a single byte.
    #[inline]
    pub fn u8(&mut self, val: u8) {
        self.put(&[val]);
    }

    /// Writes a signed 32-bit integer (little-endian).
    #[inline]
    pub fn i32_le(&mut self, val: i32) {
        self.put(&val.to_le_bytes());
    }

    /// Writes a signed 64-bit integer (little-endian).
    #[inline]
    pub fn i64_le(&mut self, val: i64) {
        self.put(&val.to_le_bytes());
    }

    /// Writes an unsigned 64-bit integer (little-endian).
    #[inline]
    pub fn u64_le(&mut self, val: u64) {
        self.put(&val.to_le_bytes());
    }

    /// Writes a 64-bit floating point number (little-endian).
    #[inline]
    pub fn f64_le(&mut self, val: f64) {
        self.put(&val.to_le_bytes());
    }

    /// Writes a byte slice.
    pub fn buf(&mut self, buf: &[u8]) {
        self.put(buf);
    }

    /// Writes the UTF-8 bytes of a string. Returns the byte count written.
    pub fn utf8(&mut self, s: &str) -> usize {
        let bytes = s.as_bytes();
        self.put(bytes);
        bytes.len()
    }
}
