//! Execution error types
//!
//! Error codes:
//! - AERO_SCAN_INVALID_BOUNDS (ERROR)
//! - AERO_STORAGE_TRAVERSAL_FAILED (ERROR)
//! - AERO_SORT_IO_ERROR (ERROR)
//! - AERO_KEY_SIZE_EXCEEDED (ERROR)
//! - AERO_QUERY_CANCELED (ERROR)
//! - AERO_DATA_CORRUPTION (FATAL)
//! - AERO_CURSOR_STATE (ERROR)
//! - AERO_CURSOR_UNSUPPORTED (ERROR)
//! - AERO_INVALID_ARGUMENT (ERROR)

use std::fmt;
use std::io;

use crate::codec::CodecError;
use crate::config::ConfigError;
use crate::index::{IndexError, IndexErrorCode};
use crate::spatial::SpatialError;
use crate::storage::{StoreError, StoreErrorCode};

/// Severity levels for execution errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation failed but system is healthy
    Error,
    /// Data can no longer be trusted
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

/// Execution error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionErrorCode {
    /// Range bounds are self-contradictory
    AeroScanInvalidBounds,
    /// Underlying ordered store failed
    AeroStorageTraversalFailed,
    /// Spill or merge I/O failed
    AeroSortIoError,
    /// Key or value exceeds the absolute maximum size
    AeroKeySizeExceeded,
    /// Query canceled by the caller
    AeroQueryCanceled,
    /// Spilled or stored data failed validation (FATAL)
    AeroDataCorruption,
    /// Operation not valid in the cursor's current state
    AeroCursorState,
    /// Operation not supported by this cursor
    AeroCursorUnsupported,
    /// Caller-supplied argument rejected
    AeroInvalidArgument,
}

impl ExecutionErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ExecutionErrorCode::AeroScanInvalidBounds => "AERO_SCAN_INVALID_BOUNDS",
            ExecutionErrorCode::AeroStorageTraversalFailed => "AERO_STORAGE_TRAVERSAL_FAILED",
            ExecutionErrorCode::AeroSortIoError => "AERO_SORT_IO_ERROR",
            ExecutionErrorCode::AeroKeySizeExceeded => "AERO_KEY_SIZE_EXCEEDED",
            ExecutionErrorCode::AeroQueryCanceled => "AERO_QUERY_CANCELED",
            ExecutionErrorCode::AeroDataCorruption => "AERO_DATA_CORRUPTION",
            ExecutionErrorCode::AeroCursorState => "AERO_CURSOR_STATE",
            ExecutionErrorCode::AeroCursorUnsupported => "AERO_CURSOR_UNSUPPORTED",
            ExecutionErrorCode::AeroInvalidArgument => "AERO_INVALID_ARGUMENT",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            ExecutionErrorCode::AeroDataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for ExecutionErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Where in execution an error surfaced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionPhase {
    /// Reading sort input
    Load,
    /// Writing a spill run
    Spill,
    /// Merging runs
    Merge,
    /// Opening or repositioning a scan
    ScanOpen,
    /// Stepping a scan
    ScanAdvance,
    /// Producing sorted output
    Output,
}

impl ExecutionPhase {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionPhase::Load => "load",
            ExecutionPhase::Spill => "spill",
            ExecutionPhase::Merge => "merge",
            ExecutionPhase::ScanOpen => "scan-open",
            ExecutionPhase::ScanAdvance => "scan-advance",
            ExecutionPhase::Output => "output",
        }
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Execution error with full context
#[derive(Debug)]
pub struct ExecutionError {
    code: ExecutionErrorCode,
    message: String,
    phase: Option<ExecutionPhase>,
    source: Option<io::Error>,
}

impl ExecutionError {
    fn new(code: ExecutionErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            phase: None,
            source: None,
        }
    }

    /// Create an invalid bounds error
    pub fn invalid_bounds(reason: impl Into<String>) -> Self {
        Self::new(ExecutionErrorCode::AeroScanInvalidBounds, reason)
            .in_phase(ExecutionPhase::ScanOpen)
    }

    /// Create a storage traversal error
    pub fn traversal_failed(reason: impl Into<String>) -> Self {
        Self::new(ExecutionErrorCode::AeroStorageTraversalFailed, reason)
    }

    /// Create a sort I/O error
    pub fn sort_io(reason: impl Into<String>, source: io::Error) -> Self {
        let mut err = Self::new(
            ExecutionErrorCode::AeroSortIoError,
            format!("{}: {}", reason.into(), source),
        );
        err.source = Some(source);
        err
    }

    /// Create a sort I/O error with no underlying I/O source
    pub fn sort_failed(reason: impl Into<String>) -> Self {
        Self::new(ExecutionErrorCode::AeroSortIoError, reason)
    }

    /// Create a key size error
    pub fn key_size_exceeded(reason: impl Into<String>) -> Self {
        Self::new(ExecutionErrorCode::AeroKeySizeExceeded, reason)
    }

    /// Create a cancellation error
    pub fn canceled() -> Self {
        Self::new(ExecutionErrorCode::AeroQueryCanceled, "query canceled")
    }

    /// Create a data corruption error (FATAL)
    pub fn data_corruption(reason: impl Into<String>) -> Self {
        Self::new(ExecutionErrorCode::AeroDataCorruption, reason)
    }

    /// Create a cursor state error
    pub fn cursor_state(reason: impl Into<String>) -> Self {
        Self::new(ExecutionErrorCode::AeroCursorState, reason)
    }

    /// Create an unsupported operation error
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::new(ExecutionErrorCode::AeroCursorUnsupported, reason)
    }

    /// Create an invalid argument error
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::new(ExecutionErrorCode::AeroInvalidArgument, reason)
    }

    /// Record the phase, keeping an earlier one if already set
    pub fn in_phase(mut self, phase: ExecutionPhase) -> Self {
        if self.phase.is_none() {
            self.phase = Some(phase);
        }
        self
    }

    /// Returns the error code
    pub fn code(&self) -> ExecutionErrorCode {
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

    /// Returns the phase, if recorded
    pub fn phase(&self) -> Option<ExecutionPhase> {
        self.phase
    }

    /// Returns whether this error is fatal
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Returns true for caller-requested cancellation
    pub fn is_cancellation(&self) -> bool {
        self.code == ExecutionErrorCode::AeroQueryCanceled
    }
}

impl fmt::Display for ExecutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(phase) = self.phase {
            write!(f, " (phase: {})", phase)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<CodecError> for ExecutionError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::SizeExceeded { .. } | CodecError::Overflow { .. } => {
                ExecutionError::key_size_exceeded(e.to_string())
            }
            _ => ExecutionError::data_corruption(e.to_string()),
        }
    }
}

impl From<StoreError> for ExecutionError {
    fn from(e: StoreError) -> Self {
        match e.code() {
            StoreErrorCode::AeroDataCorruption => ExecutionError::data_corruption(e.to_string()),
            _ => ExecutionError::traversal_failed(e.to_string()),
        }
    }
}

impl From<IndexError> for ExecutionError {
    fn from(e: IndexError) -> Self {
        match e.code() {
            IndexErrorCode::AeroIndexWriteFailed => ExecutionError::traversal_failed(e.to_string()),
            IndexErrorCode::AeroKeySizeExceeded => ExecutionError::key_size_exceeded(e.to_string()),
            _ => ExecutionError::invalid_argument(e.to_string()),
        }
    }
}

impl From<SpatialError> for ExecutionError {
    fn from(e: SpatialError) -> Self {
        ExecutionError::invalid_argument(e.to_string())
    }
}

impl From<ConfigError> for ExecutionError {
    fn from(e: ConfigError) -> Self {
        ExecutionError::invalid_argument(e.to_string())
    }
}

/// Result type for execution operations
pub type ExecutionResult<T> = Result<T, ExecutionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            ExecutionErrorCode::AeroScanInvalidBounds.code(),
            "AERO_SCAN_INVALID_BOUNDS"
        );
        assert_eq!(ExecutionErrorCode::AeroSortIoError.code(), "AERO_SORT_IO_ERROR");
        assert_eq!(ExecutionErrorCode::AeroQueryCanceled.code(), "AERO_QUERY_CANCELED");
    }

    #[test]
    fn test_corruption_is_fatal() {
        assert!(ExecutionError::data_corruption("crc").is_fatal());
        assert!(!ExecutionError::canceled().is_fatal());
    }

    #[test]
    fn test_cancellation_is_distinct() {
        assert!(ExecutionError::canceled().is_cancellation());
        assert!(!ExecutionError::sort_failed("x").is_cancellation());
    }

    #[test]
    fn test_phase_kept_once_set() {
        let disk_full = io::Error::new(io::ErrorKind::Other, "disk full");
        let err = ExecutionError::sort_io("spill", disk_full)
            .in_phase(ExecutionPhase::Spill)
            .in_phase(ExecutionPhase::Load);
        assert_eq!(err.phase(), Some(ExecutionPhase::Spill));
        let display = format!("{}", err);
        assert!(display.contains("AERO_SORT_IO_ERROR"));
        assert!(display.contains("disk full"));
        assert!(display.contains("phase: spill"));
    }

    #[test]
    fn test_codec_conversion() {
        let size: ExecutionError = CodecError::SizeExceeded { what: "key", max: 8 }.into();
        assert_eq!(size.code(), ExecutionErrorCode::AeroKeySizeExceeded);
        let bad: ExecutionError = CodecError::Truncated(3).into();
        assert_eq!(bad.code(), ExecutionErrorCode::AeroDataCorruption);
    }

    #[test]
    fn test_store_conversion() {
        let err: ExecutionError = StoreError::traversal_failed("gone").into();
        assert_eq!(err.code(), ExecutionErrorCode::AeroStorageTraversalFailed);
    }
}
