//! Codec errors

use thiserror::Error;

/// Result type for codec operations
pub type CodecResult<T> = Result<T, CodecError>;

/// Encoding and decoding failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Write would exceed the current buffer bound. Recoverable by growing.
    #[error("Encoded size {needed} exceeds buffer bound {limit}")]
    Overflow { needed: usize, limit: usize },

    /// Encoding does not fit in the absolute maximum buffer size
    #[error("Encoded {what} exceeds maximum of {max} bytes")]
    SizeExceeded { what: &'static str, max: usize },

    /// Input ended inside a value
    #[error("Truncated input at offset {0}")]
    Truncated(usize),

    /// Unknown type tag
    #[error("Invalid tag 0x{tag:02x} at offset {offset}")]
    InvalidTag { tag: u8, offset: usize },

    /// Text payload is not valid UTF-8
    #[error("Invalid UTF-8 in text value at offset {0}")]
    InvalidUtf8(usize),

    /// Decoded payload does not end where it should
    #[error("Trailing bytes after offset {0}")]
    TrailingBytes(usize),
}

impl CodecError {
    /// Returns true for the recoverable overflow condition
    pub fn is_overflow(&self) -> bool {
        matches!(self, CodecError::Overflow { .. })
    }
}
