//! Index error types
//!
//! Error codes:
//! - AERO_INDEX_INVALID_DEFINITION (ERROR)
//! - AERO_INDEX_ROW_MISMATCH (ERROR)
//! - AERO_INDEX_DUPLICATE_KEY (ERROR)
//! - AERO_INDEX_WRITE_FAILED (ERROR)
//! - AERO_KEY_SIZE_EXCEEDED (ERROR)

use std::fmt;

/// Index-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexErrorCode {
    /// Definition is internally inconsistent
    AeroIndexInvalidDefinition,
    /// Row does not match the index column count
    AeroIndexRowMismatch,
    /// Unique index already holds the key
    AeroIndexDuplicateKey,
    /// Underlying store rejected the write
    AeroIndexWriteFailed,
    /// Encoded entry exceeds the size limit
    AeroKeySizeExceeded,
}

impl IndexErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            IndexErrorCode::AeroIndexInvalidDefinition => "AERO_INDEX_INVALID_DEFINITION",
            IndexErrorCode::AeroIndexRowMismatch => "AERO_INDEX_ROW_MISMATCH",
            IndexErrorCode::AeroIndexDuplicateKey => "AERO_INDEX_DUPLICATE_KEY",
            IndexErrorCode::AeroIndexWriteFailed => "AERO_INDEX_WRITE_FAILED",
            IndexErrorCode::AeroKeySizeExceeded => "AERO_KEY_SIZE_EXCEEDED",
        }
    }
}

impl fmt::Display for IndexErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Index error type with context
#[derive(Debug)]
pub struct IndexError {
    code: IndexErrorCode,
    message: String,
    /// Index the failure belongs to
    index: Option<String>,
}

impl IndexError {
    fn new(code: IndexErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            index: None,
        }
    }

    /// Create an invalid definition error
    pub fn invalid_definition(reason: impl Into<String>) -> Self {
        Self::new(IndexErrorCode::AeroIndexInvalidDefinition, reason)
    }

    /// Create a row mismatch error
    pub fn row_mismatch(expected: usize, actual: usize) -> Self {
        Self::new(
            IndexErrorCode::AeroIndexRowMismatch,
            format!("expected {} fields, row has {}", expected, actual),
        )
    }

    /// Create a duplicate key error
    pub fn duplicate_key(key: impl Into<String>) -> Self {
        Self::new(
            IndexErrorCode::AeroIndexDuplicateKey,
            format!("duplicate key {}", key.into()),
        )
    }

    /// Create a write failed error
    pub fn write_failed(reason: impl Into<String>) -> Self {
        Self::new(IndexErrorCode::AeroIndexWriteFailed, reason)
    }

    /// Create a key size error
    pub fn key_size_exceeded(reason: impl Into<String>) -> Self {
        Self::new(IndexErrorCode::AeroKeySizeExceeded, reason)
    }

    /// Attach the index name
    pub fn for_index(mut self, name: impl Into<String>) -> Self {
        self.index = Some(name.into());
        self
    }

    /// Returns the error code
    pub fn code(&self) -> IndexErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the index name, if recorded
    pub fn index(&self) -> Option<&str> {
        self.index.as_deref()
    }
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code.code(), self.message)?;
        if let Some(ref index) = self.index {
            write!(f, " (index: {})", index)?;
        }
        Ok(())
    }
}

impl std::error::Error for IndexError {}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;
