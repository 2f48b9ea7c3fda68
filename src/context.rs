//! Per-query execution context

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use uuid::Uuid;

use crate::config::EngineConfig;
use crate::executor::{ExecutionError, ExecutionResult};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};
use crate::types::Value;

/// Positional query parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    values: Vec<Value>,
}

impl Bindings {
    /// Bindings from positional values
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// No parameters
    pub fn empty() -> Self {
        Self::default()
    }

    /// Value at `position`, if bound
    pub fn get(&self, position: usize) -> Option<&Value> {
        self.values.get(position)
    }
}

/// Cooperative cancellation flag shared between the caller and a query
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create an unset token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Returns true once cancellation was requested
    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Everything a scan or sort needs from the surrounding query
#[derive(Debug, Clone)]
pub struct QueryContext {
    session_id: Uuid,
    config: Arc<EngineConfig>,
    bindings: Bindings,
    cancellation: CancellationToken,
    metrics: Arc<MetricsRegistry>,
}

impl QueryContext {
    /// Create a context with a fresh session id
    pub fn new(config: Arc<EngineConfig>, metrics: Arc<MetricsRegistry>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            config,
            bindings: Bindings::empty(),
            cancellation: CancellationToken::new(),
            metrics,
        }
    }

    /// Replace the bindings
    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.bindings = bindings;
        self
    }

    /// Replace the cancellation token
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Session id, used to name temp files
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Query parameters
    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Cancellation token
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Shared counters
    pub fn metrics(&self) -> &MetricsRegistry {
        &self.metrics
    }

    /// Fail with `AERO_QUERY_CANCELED` if cancellation was requested
    pub fn check_canceled(&self) -> ExecutionResult<()> {
        if self.cancellation.is_canceled() {
            self.metrics.increment_cancellations();
            let session = self.session_id.to_string();
            log_event_with_fields(Event::QueryCanceled, &[("session", session.as_str())]);
            return Err(ExecutionError::canceled());
        }
        Ok(())
    }
}

impl Default for QueryContext {
    fn default() -> Self {
        Self::new(Arc::new(EngineConfig::default()), Arc::new(MetricsRegistry::new()))
    }
}
