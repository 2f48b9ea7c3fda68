//! Canonical row payload encoding
//!
//! Non-collating, exact encoding of a full row used as index entry values
//! and sort payloads:
//!
//! ```text
//! u32 LE field count
//! per field: tag, then
//!   BOOL   1 byte
//!   INT    i64 LE
//!   FLOAT  f64 bits LE
//!   TEXT   u32 LE length + utf8
//!   BYTES  u32 LE length + raw
//! ```

use super::buffer::BoundedWriter;
use super::errors::{CodecError, CodecResult};
use super::key::{TAG_BOOL, TAG_BYTES, TAG_FLOAT, TAG_INT, TAG_NULL, TAG_TEXT};
use crate::types::{Row, Value};

fn put_len(w: &mut BoundedWriter<'_>, len: usize) -> CodecResult<()> {
    let len = u32::try_from(len).map_err(|_| CodecError::SizeExceeded {
        what: "row field",
        max: u32::MAX as usize,
    })?;
    w.put_u32(len)
}

/// Encode a full row
pub fn encode_row(values: &[Value], w: &mut BoundedWriter<'_>) -> CodecResult<()> {
    put_len(w, values.len())?;
    for value in values {
        match value {
            Value::Null => w.put_u8(TAG_NULL)?,
            Value::Bool(b) => w.put(&[TAG_BOOL, *b as u8])?,
            Value::Int(i) => {
                w.put_u8(TAG_INT)?;
                w.put(&i.to_le_bytes())?;
            }
            Value::Float(f) => {
                w.put_u8(TAG_FLOAT)?;
                w.put(&f.to_bits().to_le_bytes())?;
            }
            Value::Text(s) => {
                w.put_u8(TAG_TEXT)?;
                put_len(w, s.len())?;
                w.put(s.as_bytes())?;
            }
            Value::Bytes(b) => {
                w.put_u8(TAG_BYTES)?;
                put_len(w, b.len())?;
                w.put(b)?;
            }
        }
    }
    Ok(())
}

/// Encode a full row into a new vector
pub fn row_to_vec(values: &[Value]) -> CodecResult<Vec<u8>> {
    let mut out = Vec::new();
    encode_row(values, &mut BoundedWriter::unbounded(&mut out))?;
    Ok(out)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> CodecResult<&'a [u8]> {
        if self.pos + n > self.bytes.len() {
            return Err(CodecError::Truncated(self.bytes.len()));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn u32(&mut self) -> CodecResult<u32> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(raw))
    }

    fn u64(&mut self) -> CodecResult<u64> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(raw))
    }
}

/// Decode a row encoded by `encode_row`
pub fn decode_row(bytes: &[u8]) -> CodecResult<Row> {
    let mut r = Reader { bytes, pos: 0 };
    let count = r.u32()? as usize;
    let mut values = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let offset = r.pos;
        let tag = r.take(1)?[0];
        let value = match tag {
            TAG_NULL => Value::Null,
            TAG_BOOL => Value::Bool(r.take(1)?[0] != 0),
            TAG_INT => Value::Int(r.u64()? as i64),
            TAG_FLOAT => Value::Float(f64::from_bits(r.u64()?)),
            TAG_TEXT => {
                let len = r.u32()? as usize;
                let raw = r.take(len)?;
                Value::Text(
                    std::str::from_utf8(raw)
                        .map_err(|_| CodecError::InvalidUtf8(offset))?
                        .to_string(),
                )
            }
            TAG_BYTES => {
                let len = r.u32()? as usize;
                Value::Bytes(r.take(len)?.to_vec())
            }
            other => return Err(CodecError::InvalidTag { tag: other, offset }),
        };
        values.push(value);
    }
    if r.pos != bytes.len() {
        return Err(CodecError::TrailingBytes(r.pos));
    }
    Ok(Row::new(values))
}
