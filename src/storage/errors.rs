//! Ordered-store error types
//!
//! Error codes:
//! - AERO_STORAGE_TRAVERSAL_FAILED (ERROR severity)
//! - AERO_STORAGE_WRITE_FAILED (ERROR severity)
//! - AERO_DATA_CORRUPTION (FATAL severity)

use std::fmt;
use std::io;

/// Severity levels for store errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, caller continues
    Error,
    /// Store contents can no longer be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Store-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorCode {
    /// Seek or step failed
    AeroStorageTraversalFailed,
    /// Insert failed
    AeroStorageWriteFailed,
    /// Stored entry failed validation
    AeroDataCorruption,
}

impl StoreErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StoreErrorCode::AeroStorageTraversalFailed => "AERO_STORAGE_TRAVERSAL_FAILED",
            StoreErrorCode::AeroStorageWriteFailed => "AERO_STORAGE_WRITE_FAILED",
            StoreErrorCode::AeroDataCorruption => "AERO_DATA_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StoreErrorCode::AeroDataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StoreErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Store error with context
#[derive(Debug)]
pub struct StoreError {
    code: StoreErrorCode,
    message: String,
    /// Name of the store the failure happened in
    store: Option<String>,
    source: Option<io::Error>,
}

impl StoreError {
    /// Create a traversal failure
    pub fn traversal_failed(message: impl Into<String>) -> Self {
        Self {
            code: StoreErrorCode::AeroStorageTraversalFailed,
            message: message.into(),
            store: None,
            source: None,
        }
    }

    /// Create a traversal failure caused by an I/O error
    pub fn traversal_io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StoreErrorCode::AeroStorageTraversalFailed,
            message: message.into(),
            store: None,
            source: Some(source),
        }
    }

    /// Create a write failure
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self {
            code: StoreErrorCode::AeroStorageWriteFailed,
            message: message.into(),
            store: None,
            source: None,
        }
    }

    /// Create a data corruption error (FATAL)
    pub fn data_corruption(message: impl Into<String>) -> Self {
        Self {
            code: StoreErrorCode::AeroDataCorruption,
            message: message.into(),
            store: None,
            source: None,
        }
    }

    /// Attach the store name
    pub fn in_store(mut self, name: impl Into<String>) -> Self {
        self.store = Some(name.into());
        self
    }

    /// Returns the error code
    pub fn code(&self) -> StoreErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the store name, if recorded
    pub fn store(&self) -> Option<&str> {
        self.store.as_deref()
    }

    /// Returns whether this error is fatal
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref store) = self.store {
            write!(f, " (store: {})", store)?;
        }
        Ok(())
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
