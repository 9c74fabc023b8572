//! Tagged, length-prefixed binary codec.
//!
//! ## Format
//!
//! Every encoded value carries a 4-byte header followed by its payload:
//!
//! ```text
//! ┌──────────┬──────────────────┬─────────────────────┐
//! │ tag: u8  │ size: u24 LE     │ payload             │
//! └──────────┴──────────────────┴─────────────────────┘
//! ```
//!
//! The meaning of `size` depends on the tag: byte count for primitives,
//! strings and byte blobs; entry count for maps; member count for lists;
//! field count for objects. No value may declare a size above
//! [`MAX_WIRE_SIZE`] (2^24 - 1); encoding such a value fails before any
//! bytes are produced.
//!
//! Composite values nest complete encodings:
//! - **Map**: `size` repetitions of (String key, value). The value type is
//!   uniform and supplied by the caller; a map is not self-describing.
//! - **List**: `size` members of a uniform, caller-supplied type.
//! - **Object**: a fixed, caller-known ordered sequence of
//!   (String field-name, value) pairs. Object decoding is strictly
//!   positional: each field name is read and compared against the expected
//!   name, and a mismatch fails the decode. Reordering fields on either
//!   side breaks compatibility.
//!
//! Numeric payloads are little-endian; strings are UTF-8 and their size
//! field records the UTF-8 **byte** length.
//!
//! Decoding never panics: a bad tag, a truncated buffer or an invalid
//! payload yields a [`WireError`] that the caller treats as a malformed
//! message.

use std::collections::BTreeMap;

use byteorder::{ByteOrder, LittleEndian};
use num_enum::TryFromPrimitive;
use thiserror::Error;

/// Largest size a single value may declare (2^24 - 1).
pub const MAX_WIRE_SIZE: usize = 0xFF_FFFF;

/// Bytes occupied by a value header.
pub const HEADER_SIZE: usize = 4;

/// Wire type tags. The set is closed; an unlisted tag is a decode error.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, TryFromPrimitive)]
pub enum WireType {
    Bool = 1,
    Int32 = 2,
    Int64 = 3,
    String = 4,
    Enum = 5,
    Bytes = 6,
    Map = 7,
    List = 8,
    Object = 9,
}

/// Codec failures. Encode failures are size violations; everything else is
/// a decode failure reporting why a buffer could not be interpreted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WireError {
    #[error("value size {size} exceeds the 24-bit limit")]
    Oversized { size: usize },

    #[error("buffer truncated: need {need} bytes at offset {offset}, have {have}")]
    Truncated {
        need: usize,
        have: usize,
        offset: usize,
    },

    #[error("unknown type tag {0}")]
    UnknownTag(u8),

    #[error("expected {expected:?} tag, found {actual:?}")]
    TagMismatch {
        expected: WireType,
        actual: WireType,
    },

    #[error("declared size {declared} is invalid, expected {expected}")]
    BadSize { declared: usize, expected: usize },

    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    #[error("string payload is not valid UTF-8")]
    InvalidUtf8,

    #[error("object field mismatch: expected {expected:?}, read {actual:?}")]
    FieldMismatch { expected: String, actual: String },

    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),
}

pub type WireResult<T> = std::result::Result<T, WireError>;

/// Append-only encoder. Values are written in call order; [`into_bytes`]
/// yields the finished buffer.
///
/// Fixed-size primitives cannot violate the size limit, so their writers
/// are infallible; variable-size writers return a [`WireResult`].
///
/// [`into_bytes`]: WireWriter::into_bytes
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    fn header(&mut self, tag: WireType, size: usize) {
        debug_assert!(size <= MAX_WIRE_SIZE);
        self.buf.push(tag as u8);
        let size_bytes = (size as u32).to_le_bytes();
        self.buf.extend_from_slice(&size_bytes[..3]);
    }

    fn checked_header(&mut self, tag: WireType, size: usize) -> WireResult<()> {
        if size > MAX_WIRE_SIZE {
            return Err(WireError::Oversized { size });
        }
        self.header(tag, size);
        Ok(())
    }

    pub fn put_bool(&mut self, value: bool) {
        self.header(WireType::Bool, 1);
        self.buf.push(u8::from(value));
    }

    pub fn put_i32(&mut self, value: i32) {
        self.header(WireType::Int32, 4);
        let mut bytes = [0u8; 4];
        LittleEndian::write_i32(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    pub fn put_i64(&mut self, value: i64) {
        self.header(WireType::Int64, 8);
        let mut bytes = [0u8; 8];
        LittleEndian::write_i64(&mut bytes, value);
        self.buf.extend_from_slice(&bytes);
    }

    /// Writes an enum ordinal. The mapping from ordinal to variant is the
    /// caller's concern; the wire only carries the integer.
    pub fn put_enum(&mut self, ordinal: i32) {
        self.header(WireType::Enum, 4);
        let mut bytes = [0u8; 4];
        LittleEndian::write_i32(&mut bytes, ordinal);
        self.buf.extend_from_slice(&bytes);
    }

    /// Writes a string. The size field records the UTF-8 byte length.
    pub fn put_str(&mut self, value: &str) -> WireResult<()> {
        self.checked_header(WireType::String, value.len())?;
        self.buf.extend_from_slice(value.as_bytes());
        Ok(())
    }

    pub fn put_bytes(&mut self, value: &[u8]) -> WireResult<()> {
        self.checked_header(WireType::Bytes, value.len())?;
        self.buf.extend_from_slice(value);
        Ok(())
    }

    /// Writes a `Map<String, Bytes>` whose values are raw encoded blobs
    /// carried opaquely (each blob is itself a complete encoding).
    pub fn put_bytes_map(&mut self, map: &BTreeMap<String, Vec<u8>>) -> WireResult<()> {
        self.checked_header(WireType::Map, map.len())?;
        for (key, value) in map {
            self.put_str(key)?;
            self.put_bytes(value)?;
        }
        Ok(())
    }

    /// Writes a list of `members.len()` uniform members, each encoded by
    /// `put_member`.
    pub fn put_list<T, F>(&mut self, members: &[T], mut put_member: F) -> WireResult<()>
    where
        F: FnMut(&mut Self, &T) -> WireResult<()>,
    {
        self.checked_header(WireType::List, members.len())?;
        for member in members {
            put_member(self, member)?;
        }
        Ok(())
    }

    /// Starts an object of exactly `field_count` fields. The caller then
    /// writes each field as a name ([`put_str`]) followed by its value.
    ///
    /// [`put_str`]: WireWriter::put_str
    pub fn begin_object(&mut self, field_count: usize) -> WireResult<()> {
        self.checked_header(WireType::Object, field_count)
    }
}

/// Bounds-checked cursor over an encoded buffer.
///
/// Reads consume from the front; [`finish`] asserts the buffer was consumed
/// exactly. All failures are reported as [`WireError`]s, never panics.
///
/// [`finish`]: WireReader::finish
#[derive(Debug)]
pub struct WireReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fails unless every byte of the buffer has been consumed.
    pub fn finish(self) -> WireResult<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(WireError::TrailingBytes(n)),
        }
    }

    fn take(&mut self, len: usize) -> WireResult<&'a [u8]> {
        if self.remaining() < len {
            return Err(WireError::Truncated {
                need: len,
                have: self.remaining(),
                offset: self.offset,
            });
        }
        let slice = &self.data[self.offset..self.offset + len];
        self.offset += len;
        Ok(slice)
    }

    /// Reads a header, verifies the tag matches `expected` and returns the
    /// declared size.
    pub fn read_header(&mut self, expected: WireType) -> WireResult<usize> {
        let header = self.take(HEADER_SIZE)?;
        let actual =
            WireType::try_from(header[0]).map_err(|_| WireError::UnknownTag(header[0]))?;
        if actual != expected {
            return Err(WireError::TagMismatch { expected, actual });
        }
        let mut size_bytes = [0u8; 4];
        size_bytes[..3].copy_from_slice(&header[1..4]);
        Ok(LittleEndian::read_u32(&size_bytes) as usize)
    }

    fn read_fixed(&mut self, expected: WireType, len: usize) -> WireResult<&'a [u8]> {
        let declared = self.read_header(expected)?;
        if declared != len {
            return Err(WireError::BadSize {
                declared,
                expected: len,
            });
        }
        self.take(len)
    }

    pub fn read_bool(&mut self) -> WireResult<bool> {
        match self.read_fixed(WireType::Bool, 1)?[0] {
            0 => Ok(false),
            1 => Ok(true),
            byte => Err(WireError::InvalidBool(byte)),
        }
    }

    pub fn read_i32(&mut self) -> WireResult<i32> {
        Ok(LittleEndian::read_i32(self.read_fixed(WireType::Int32, 4)?))
    }

    pub fn read_i64(&mut self) -> WireResult<i64> {
        Ok(LittleEndian::read_i64(self.read_fixed(WireType::Int64, 8)?))
    }

    /// Reads an enum ordinal. Resolving it to a variant is the caller's
    /// concern, typically through a `num_enum` mapping with an explicit
    /// fallback for out-of-range values.
    pub fn read_enum_ordinal(&mut self) -> WireResult<i32> {
        Ok(LittleEndian::read_i32(self.read_fixed(WireType::Enum, 4)?))
    }

    pub fn read_string(&mut self) -> WireResult<String> {
        let len = self.read_header(WireType::String)?;
        let payload = self.take(len)?;
        String::from_utf8(payload.to_vec()).map_err(|_| WireError::InvalidUtf8)
    }

    pub fn read_bytes(&mut self) -> WireResult<&'a [u8]> {
        let len = self.read_header(WireType::Bytes)?;
        self.take(len)
    }

    /// Reads a `Map<String, Bytes>` of raw encoded blobs.
    pub fn read_bytes_map(&mut self) -> WireResult<BTreeMap<String, Vec<u8>>> {
        let entries = self.read_header(WireType::Map)?;
        let mut map = BTreeMap::new();
        for _ in 0..entries {
            let key = self.read_string()?;
            let value = self.read_bytes()?.to_vec();
            map.insert(key, value);
        }
        Ok(map)
    }

    /// Reads a list of uniform members, each decoded by `read_member`.
    pub fn read_list<T, F>(&mut self, mut read_member: F) -> WireResult<Vec<T>>
    where
        F: FnMut(&mut Self) -> WireResult<T>,
    {
        let members = self.read_header(WireType::List)?;
        // Declared counts are untrusted; cap the preallocation.
        let mut out = Vec::with_capacity(members.min(1024));
        for _ in 0..members {
            out.push(read_member(self)?);
        }
        Ok(out)
    }

    /// Starts an object, failing unless it declares exactly
    /// `expected_fields` fields.
    pub fn begin_object(&mut self, expected_fields: usize) -> WireResult<()> {
        let declared = self.read_header(WireType::Object)?;
        if declared != expected_fields {
            return Err(WireError::BadSize {
                declared,
                expected: expected_fields,
            });
        }
        Ok(())
    }

    /// Consumes the next field name and fails unless it equals `name`.
    /// This is what makes object decoding strictly positional.
    pub fn expect_field(&mut self, name: &str) -> WireResult<()> {
        let actual = self.read_string()?;
        if actual != name {
            return Err(WireError::FieldMismatch {
                expected: name.to_owned(),
                actual,
            });
        }
        Ok(())
    }
}

// Standalone helpers for values that travel as self-contained blobs
// (request parameters, response data entries). Each blob is a complete
// header + payload encoding, decoded with an exact-length check.

pub fn encode_bool(value: bool) -> Vec<u8> {
    let mut writer = WireWriter::new();
    writer.put_bool(value);
    writer.into_bytes()
}

pub fn encode_i32(value: i32) -> Vec<u8> {
    let mut writer = WireWriter::new();
    writer.put_i32(value);
    writer.into_bytes()
}

pub fn encode_i64(value: i64) -> Vec<u8> {
    let mut writer = WireWriter::new();
    writer.put_i64(value);
    writer.into_bytes()
}

pub fn encode_str(value: &str) -> WireResult<Vec<u8>> {
    let mut writer = WireWriter::new();
    writer.put_str(value)?;
    Ok(writer.into_bytes())
}

pub fn encode_bytes(value: &[u8]) -> WireResult<Vec<u8>> {
    let mut writer = WireWriter::new();
    writer.put_bytes(value)?;
    Ok(writer.into_bytes())
}

pub fn decode_bool(bytes: &[u8]) -> WireResult<bool> {
    let mut reader = WireReader::new(bytes);
    let value = reader.read_bool()?;
    reader.finish()?;
    Ok(value)
}

pub fn decode_i32(bytes: &[u8]) -> WireResult<i32> {
    let mut reader = WireReader::new(bytes);
    let value = reader.read_i32()?;
    reader.finish()?;
    Ok(value)
}

pub fn decode_i64(bytes: &[u8]) -> WireResult<i64> {
    let mut reader = WireReader::new(bytes);
    let value = reader.read_i64()?;
    reader.finish()?;
    Ok(value)
}

pub fn decode_str(bytes: &[u8]) -> WireResult<String> {
    let mut reader = WireReader::new(bytes);
    let value = reader.read_string()?;
    reader.finish()?;
    Ok(value)
}

pub fn decode_bytes(bytes: &[u8]) -> WireResult<Vec<u8>> {
    let mut reader = WireReader::new(bytes);
    let value = reader.read_bytes()?.to_vec();
    reader.finish()?;
    Ok(value)
}
