//! Key and string codecs: null-terminated C-strings and length-prefixed
//! UTF-8 strings.

use bson_stream_buffers::{Reader, Writer};

use crate::error::DecodeError;
use crate::values::{BsonBinary, BsonValue, BINARY_SUBTYPE_GENERIC};

/// Window size for the C-string terminator scan.
const SCAN_CHUNK: usize = 1024;

/// Reads a null-terminated C-string.
///
/// Scans the source in windows rather than byte-at-a-time, accumulating
/// across window boundaries until a zero byte is found, and consumes
/// through the terminator only. With `utf8_fallback` set, malformed UTF-8
/// decodes lossily instead of failing.
pub fn read_cstring(reader: &mut Reader<'_>, utf8_fallback: bool) -> Result<String, DecodeError> {
    let mut bytes: Vec<u8> = Vec::new();
    loop {
        let chunk = reader.peek_buf(SCAN_CHUNK);
        if chunk.is_empty() {
            return Err(DecodeError::UnexpectedEof);
        }
        match chunk.iter().position(|&b| b == 0) {
            Some(i) => {
                bytes.extend_from_slice(&chunk[..i]);
                reader.skip(i + 1)?;
                break;
            }
            None => {
                bytes.extend_from_slice(chunk);
                reader.skip(chunk.len())?;
            }
        }
    }
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) if utf8_fallback => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
        Err(_) => Err(DecodeError::InvalidUtf8),
    }
}

/// Reads a length-prefixed string value: int32 byte count including the
/// terminator, that many bytes, the last of which must be zero.
///
/// With `utf8_fallback` set, a malformed string decodes as generic binary
/// carrying the raw bytes instead of failing.
pub fn read_string_value(
    reader: &mut Reader<'_>,
    utf8_fallback: bool,
) -> Result<BsonValue, DecodeError> {
    let length = reader.i32_le()?;
    if length < 1 {
        return Err(DecodeError::InvalidLength(i64::from(length)));
    }
    let data = reader.buf(length as usize)?;
    let (body, terminator) = data.split_at(data.len() - 1);
    if terminator[0] != 0 {
        return Err(DecodeError::InvalidStringTerminator);
    }
    match std::str::from_utf8(body) {
        Ok(s) => Ok(BsonValue::Str(s.to_owned())),
        Err(_) if utf8_fallback => Ok(BsonValue::Binary(BsonBinary {
            subtype: BINARY_SUBTYPE_GENERIC,
            data: body.to_vec(),
        })),
        Err(_) => Err(DecodeError::InvalidUtf8),
    }
}

/// Writes a null-terminated C-string. The caller is responsible for
/// rejecting keys with interior null bytes first.
pub fn write_cstring(writer: &mut Writer, s: &str) {
    writer.utf8(s);
    writer.u8(0);
}

/// Writes a length-prefixed string: int32 (byte count + 1), UTF-8 bytes,
/// terminating zero.
pub fn write_string(writer: &mut Writer, s: &str) {
    let len = s.len() as i32 + 1;
    writer.i32_le(len);
    writer.utf8(s);
    writer.u8(0);
}
