//! Engine configuration
//!
//! Loaded from a JSON file; every field is optional and falls back to its
//! default. Values are validated before the engine accepts them.
//!
//! ```json
//! {
//!   "sort_memory_bytes": 41943040,
//!   "tmp_dir": "/var/tmp/aerodb",
//!   "merge_fan_in": 16,
//!   "log_level": "info"
//! }
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::observability::{log_event_with_fields, Event, Severity};

/// Configuration error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    /// File could not be read
    AeroConfigIoError,
    /// File is not valid configuration JSON
    AeroConfigParseError,
    /// A value is out of range
    AeroConfigInvalid,
}

impl ConfigErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ConfigErrorCode::AeroConfigIoError => "AERO_CONFIG_IO_ERROR",
            ConfigErrorCode::AeroConfigParseError => "AERO_CONFIG_PARSE_ERROR",
            ConfigErrorCode::AeroConfigInvalid => "AERO_CONFIG_INVALID",
        }
    }
}

/// Configuration error
#[derive(Debug)]
pub struct ConfigError {
    code: ConfigErrorCode,
    message: String,
}

impl ConfigError {
    fn new(code: ConfigErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorCode::AeroConfigInvalid, message)
    }

    /// Returns the error code
    pub fn code(&self) -> ConfigErrorCode {
        self.code
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ERROR] {}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Scan and sort engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Staged sort data allowed in memory before spilling (default 40 MiB)
    #[serde(default = "default_sort_memory_bytes")]
    pub sort_memory_bytes: usize,

    /// Directory for spill files (default: system temp dir)
    #[serde(default)]
    pub tmp_dir: Option<PathBuf>,

    /// Maximum runs merged at once (default 16)
    #[serde(default = "default_merge_fan_in")]
    pub merge_fan_in: usize,

    /// Starting sort key buffer size
    #[serde(default = "default_initial_key_bytes")]
    pub initial_key_bytes: usize,

    /// Absolute maximum sort key size
    #[serde(default = "default_max_key_bytes")]
    pub max_key_bytes: usize,

    /// Starting row payload buffer size
    #[serde(default = "default_initial_value_bytes")]
    pub initial_value_bytes: usize,

    /// Absolute maximum row payload size
    #[serde(default = "default_max_value_bytes")]
    pub max_value_bytes: usize,

    /// Lowest severity written to the event log (default info)
    #[serde(default)]
    pub log_level: Severity,
}

fn default_sort_memory_bytes() -> usize {
    40 * 1024 * 1024
}
fn default_merge_fan_in() -> usize {
    16
}
fn default_initial_key_bytes() -> usize {
    256
}
fn default_max_key_bytes() -> usize {
    64 * 1024
}
fn default_initial_value_bytes() -> usize {
    4096
}
fn default_max_value_bytes() -> usize {
    64 * 1024 * 1024
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sort_memory_bytes: default_sort_memory_bytes(),
            tmp_dir: None,
            merge_fan_in: default_merge_fan_in(),
            initial_key_bytes: default_initial_key_bytes(),
            max_key_bytes: default_max_key_bytes(),
            initial_value_bytes: default_initial_value_bytes(),
            max_value_bytes: default_max_value_bytes(),
            log_level: Severity::Info,
        }
    }
}

impl EngineConfig {
    /// Load and validate configuration from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new(
                ConfigErrorCode::AeroConfigIoError,
                format!("Failed to read config {}: {}", path.display(), e),
            )
        })?;
        let config = Self::from_json(&content)?;
        let (path, memory) = (path.display().to_string(), config.sort_memory_bytes.to_string());
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("path", path.as_str()), ("sort_memory_bytes", memory.as_str())],
        );
        Ok(config)
    }

    /// Parse and validate configuration JSON
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: EngineConfig = serde_json::from_str(content).map_err(|e| {
            ConfigError::new(
                ConfigErrorCode::AeroConfigParseError,
                format!("Invalid config JSON: {}", e),
            )
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    pub fn validate(&self) -> ConfigResult<()> {
        if self.sort_memory_bytes == 0 {
            return Err(ConfigError::invalid("sort_memory_bytes must be > 0"));
        }
        if self.merge_fan_in < 2 {
            return Err(ConfigError::invalid(format!(
                "merge_fan_in must be >= 2, got {}",
                self.merge_fan_in
            )));
        }
        if self.initial_key_bytes == 0 || self.initial_key_bytes > self.max_key_bytes {
            return Err(ConfigError::invalid(
                "initial_key_bytes must be in 1..=max_key_bytes",
            ));
        }
        if self.initial_value_bytes == 0 || self.initial_value_bytes > self.max_value_bytes {
            return Err(ConfigError::invalid(
                "initial_value_bytes must be in 1..=max_value_bytes",
            ));
        }
        if let Some(ref dir) = self.tmp_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::invalid("tmp_dir must not be empty"));
            }
        }
        Ok(())
    }

    /// Directory spill files are created in
    pub fn spill_dir(&self) -> PathBuf {
        self.tmp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Copy with a different memory ceiling
    pub fn with_sort_memory(mut self, bytes: usize) -> Self {
        self.sort_memory_bytes = bytes;
        self
    }

    /// Copy with a different spill directory
    pub fn with_tmp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tmp_dir = Some(dir.into());
        self
    }

    /// Copy with a different merge fan-in
    pub fn with_merge_fan_in(mut self, fan_in: usize) -> Self {
        self.merge_fan_in = fan_in;
        self
    }
}
