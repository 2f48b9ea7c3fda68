//! Bounded encode buffers
//!
//! Encoders write through a `BoundedWriter` which refuses to grow past its
//! limit. `GrowableBuffer` retries a failed encode after doubling the limit,
//! until the absolute maximum is reached.

use super::errors::{CodecError, CodecResult};

/// Append-only writer with a hard size limit.
#[derive(Debug)]
pub struct BoundedWriter<'a> {
    buf: &'a mut Vec<u8>,
    limit: usize,
}

impl<'a> BoundedWriter<'a> {
    /// Wrap `buf`, refusing to grow it past `limit` bytes
    pub fn new(buf: &'a mut Vec<u8>, limit: usize) -> Self {
        Self { buf, limit }
    }

    /// Writer with no effective limit
    pub fn unbounded(buf: &'a mut Vec<u8>) -> Self {
        Self::new(buf, usize::MAX)
    }

    /// Append bytes
    pub fn put(&mut self, bytes: &[u8]) -> CodecResult<()> {
        let needed = self.buf.len().saturating_add(bytes.len());
        if needed > self.limit {
            return Err(CodecError::Overflow {
                needed,
                limit: self.limit,
            });
        }
        self.buf.extend_from_slice(bytes);
        Ok(())
    }

    /// Append one byte
    pub fn put_u8(&mut self, byte: u8) -> CodecResult<()> {
        self.put(&[byte])
    }

    /// Append a little-endian u32
    pub fn put_u32(&mut self, v: u32) -> CodecResult<()> {
        self.put(&v.to_le_bytes())
    }

    /// Bytes written so far
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Returns true if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }
}

/// Reusable encode buffer that doubles its bound on overflow.
#[derive(Debug)]
pub struct GrowableBuffer {
    what: &'static str,
    buf: Vec<u8>,
    bound: usize,
    max: usize,
}

impl GrowableBuffer {
    /// Create a buffer starting at `initial` bytes, never exceeding `max`
    pub fn new(what: &'static str, initial: usize, max: usize) -> Self {
        let bound = initial.clamp(1, max.max(1));
        Self {
            what,
            buf: Vec::with_capacity(bound),
            bound,
            max: max.max(1),
        }
    }

    /// Current bound in bytes
    pub fn bound(&self) -> usize {
        self.bound
    }

    /// Run `encode` against a fresh writer, doubling the bound and retrying on
    /// overflow. Returns a copy of the encoded bytes.
    pub fn encode<F>(&mut self, mut encode: F) -> CodecResult<Vec<u8>>
    where
        F: FnMut(&mut BoundedWriter<'_>) -> CodecResult<()>,
    {
        loop {
            self.buf.clear();
            let result = {
                let mut writer = BoundedWriter::new(&mut self.buf, self.bound);
                encode(&mut writer)
            };
            match result {
                Ok(()) => return Ok(self.buf.clone()),
                Err(e) if e.is_overflow() => {
                    if self.bound >= self.max {
                        return Err(CodecError::SizeExceeded {
                            what: self.what,
                            max: self.max,
                        });
                    }
                    self.bound = self.bound.saturating_mul(2).min(self.max);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
