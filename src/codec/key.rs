//! Byte-comparable key segments
//!
//! Each value encodes to one self-delimiting segment whose unsigned
//! lexicographic byte order matches the value order. Segments concatenate
//! into composite keys; no segment is a prefix of another, so comparing two
//! composite keys compares their segments left to right.
//!
//! Layout (tag byte first):
//!
//! ```text
//! NULL   00
//! BOOL   10 <00|01>
//! INT    20 <8 bytes BE, sign bit flipped>
//! FLOAT  30 <8 bytes BE, total-order bits>
//! TEXT   40 <utf8, 00 escaped as 00 FF> 00 00
//! BYTES  50 <raw, 00 escaped as 00 FF> 00 00
//! ```
//!
//! `0xFF` is never a tag, so `prefix ++ [0xFF]` sorts after every key that
//! starts with `prefix` and before every greater key that does not.

use super::buffer::BoundedWriter;
use super::collation::Collation;
use super::errors::{CodecError, CodecResult};
use crate::types::Value;

pub const TAG_NULL: u8 = 0x00;
pub const TAG_BOOL: u8 = 0x10;
pub const TAG_INT: u8 = 0x20;
pub const TAG_FLOAT: u8 = 0x30;
pub const TAG_TEXT: u8 = 0x40;
pub const TAG_BYTES: u8 = 0x50;

/// Byte greater than every tag
pub const CEILING: u8 = 0xFF;

const ESCAPE: u8 = 0xFF;

/// Map a float to bits whose unsigned order is the float total order
fn ordered_float_bits(v: f64) -> u64 {
    let bits = v.to_bits();
    if (bits >> 63) == 1 {
        !bits
    } else {
        bits ^ (1 << 63)
    }
}

fn float_from_ordered_bits(ordered: u64) -> f64 {
    let bits = if (ordered >> 63) == 1 {
        ordered ^ (1 << 63)
    } else {
        !ordered
    };
    f64::from_bits(bits)
}

fn put_escaped(w: &mut BoundedWriter<'_>, bytes: &[u8]) -> CodecResult<()> {
    let mut start = 0;
    for (i, b) in bytes.iter().enumerate() {
        if *b == 0 {
            w.put(&bytes[start..=i])?;
            w.put_u8(ESCAPE)?;
            start = i + 1;
        }
    }
    w.put(&bytes[start..])?;
    w.put(&[0, 0])
}

/// Encode one value as a key segment
pub fn encode_segment(
    value: &Value,
    collation: Collation,
    w: &mut BoundedWriter<'_>,
) -> CodecResult<()> {
    match value {
        Value::Null => w.put_u8(TAG_NULL),
        Value::Bool(b) => w.put(&[TAG_BOOL, *b as u8]),
        Value::Int(i) => {
            w.put_u8(TAG_INT)?;
            w.put(&((*i as u64) ^ (1 << 63)).to_be_bytes())
        }
        Value::Float(f) => {
            w.put_u8(TAG_FLOAT)?;
            w.put(&ordered_float_bits(*f).to_be_bytes())
        }
        Value::Text(s) => {
            w.put_u8(TAG_TEXT)?;
            put_escaped(w, collation.sort_text(s).as_bytes())
        }
        Value::Bytes(b) => {
            w.put_u8(TAG_BYTES)?;
            put_escaped(w, b)
        }
    }
}

/// Encode one value as a freestanding segment
pub fn segment_to_vec(value: &Value, collation: Collation) -> Vec<u8> {
    let mut out = Vec::new();
    // An unbounded writer cannot overflow.
    let _ = encode_segment(value, collation, &mut BoundedWriter::unbounded(&mut out));
    out
}

/// Encode a composite key from values and per-column collations.
///
/// Columns beyond `collations.len()` use binary collation.
pub fn key_to_vec(values: &[Value], collations: &[Collation]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut w = BoundedWriter::unbounded(&mut out);
    for (i, value) in values.iter().enumerate() {
        let collation = collations.get(i).copied().unwrap_or_default();
        let _ = encode_segment(value, collation, &mut w);
    }
    out
}

/// Locate the end of an escaped run starting at `pos`. Returns the offset
/// just past the `00 00` terminator.
fn escaped_end(bytes: &[u8], mut pos: usize) -> CodecResult<usize> {
    loop {
        match bytes[pos..].iter().position(|b| *b == 0) {
            None => return Err(CodecError::Truncated(bytes.len())),
            Some(rel) => {
                let zero = pos + rel;
                match bytes.get(zero + 1) {
                    Some(0) => return Ok(zero + 2),
                    Some(&ESCAPE) => pos = zero + 2,
                    Some(other) => {
                        return Err(CodecError::InvalidTag {
                            tag: *other,
                            offset: zero + 1,
                        })
                    }
                    None => return Err(CodecError::Truncated(bytes.len())),
                }
            }
        }
    }
}

fn unescape(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        out.push(bytes[i]);
        i += if bytes[i] == 0 { 2 } else { 1 };
    }
    out
}

fn fixed_len(bytes: &[u8], offset: usize, len: usize) -> CodecResult<usize> {
    if offset + len > bytes.len() {
        Err(CodecError::Truncated(bytes.len()))
    } else {
        Ok(len)
    }
}

/// Length in bytes of the segment starting at `offset`
pub fn segment_len(bytes: &[u8], offset: usize) -> CodecResult<usize> {
    let tag = *bytes.get(offset).ok_or(CodecError::Truncated(offset))?;
    match tag {
        TAG_NULL => Ok(1),
        TAG_BOOL => fixed_len(bytes, offset, 2),
        TAG_INT | TAG_FLOAT => fixed_len(bytes, offset, 9),
        TAG_TEXT | TAG_BYTES => Ok(escaped_end(bytes, offset + 1)? - offset),
        other => Err(CodecError::InvalidTag { tag: other, offset }),
    }
}

/// Decode the segment at `offset`, returning the value and bytes consumed.
///
/// Collated text decodes to its collation key, not the original spelling.
pub fn decode_segment(bytes: &[u8], offset: usize) -> CodecResult<(Value, usize)> {
    let len = segment_len(bytes, offset)?;
    let body = &bytes[offset + 1..offset + len];
    let value = match bytes[offset] {
        TAG_NULL => Value::Null,
        TAG_BOOL => Value::Bool(body[0] != 0),
        TAG_INT => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(body);
            Value::Int((u64::from_be_bytes(raw) ^ (1 << 63)) as i64)
        }
        TAG_FLOAT => {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(body);
            Value::Float(float_from_ordered_bits(u64::from_be_bytes(raw)))
        }
        TAG_TEXT => {
            let raw = unescape(&body[..body.len() - 2]);
            Value::Text(String::from_utf8(raw).map_err(|_| CodecError::InvalidUtf8(offset))?)
        }
        _ => Value::Bytes(unescape(&body[..body.len() - 2])),
    };
    Ok((value, len))
}

/// Probe that sorts after every key beginning with `prefix`
pub fn after_prefix(prefix: &[u8]) -> Vec<u8> {
    let mut seek_key = Vec::with_capacity(prefix.len() + 1);
    seek_key.extend_from_slice(prefix);
    seek_key.push(CEILING);
    seek_key
}
