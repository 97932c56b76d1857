// resultsdb-core/src/runtime/telemetry.rs
// ============================================================================
// Module: ResultsDB Service Events
// Description: Structured JSON-line events emitted by the service.
// Purpose: Record service activity without a hard logging dependency.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The service reports page fetches, mutations, and tolerated failures as
//! [`ServiceEvent`] values. A [`ServiceEventSink`] decides where they go:
//! stderr, an append-only file, memory (tests), or nowhere. A
//! [`LevelFilterSink`] drops events below a configured [`EventLevel`].
//!
//! [`sink_from_env`] mirrors the usual deployment knobs: `RESULTSDB_LOG_LEVEL`
//! selects the level and `RESULTSDB_LOG_FILE` redirects output from stderr to
//! a file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable selecting the minimum event level.
pub const LOG_LEVEL_ENV: &str = "RESULTSDB_LOG_LEVEL";
/// Environment variable naming a log file.
pub const LOG_FILE_ENV: &str = "RESULTSDB_LOG_FILE";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Severity of a service event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventLevel {
    /// Diagnostic detail.
    Debug,
    /// Normal activity.
    Info,
    /// Tolerated problem.
    Warning,
    /// Failed operation.
    Error,
    /// Unrecoverable failure.
    Critical,
}

impl EventLevel {
    /// Parses a case-insensitive level name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warning" | "warn" => Some(Self::Warning),
            "error" => Some(Self::Error),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// Service event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceEvent {
    /// Event identifier (for example `page_fetched`).
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Event severity.
    pub level: EventLevel,
    /// Service operation that produced the event.
    pub operation: &'static str,
    /// Human-readable message.
    pub message: String,
    /// Identifier of the affected entry, when there is one.
    pub entity_id: Option<String>,
}

impl ServiceEvent {
    /// Builds an event stamped with the current time.
    #[must_use]
    pub fn new(
        event: &'static str,
        level: EventLevel,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            event,
            timestamp_ms: now_ms(),
            level,
            operation,
            message: message.into(),
            entity_id: None,
        }
    }

    /// Attaches the affected entry identifier.
    #[must_use]
    pub fn with_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }
}

// ============================================================================
// SECTION: Sinks
// ============================================================================

/// Destination for service events.
pub trait ServiceEventSink: Send + Sync {
    /// Records one event.
    fn record(&self, event: &ServiceEvent);
}

/// Sink that writes JSON lines to stderr.
pub struct StderrEventSink;

impl ServiceEventSink for StderrEventSink {
    fn record(&self, event: &ServiceEvent) {
        if let Ok(payload) = serde_json::to_string(event) {
            let _ = writeln!(io::stderr(), "{payload}");
        }
    }
}

/// Sink that appends JSON lines to a file.
pub struct FileEventSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileEventSink {
    /// Opens the log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl ServiceEventSink for FileEventSink {
    fn record(&self, event: &ServiceEvent) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

/// Sink that discards every event.
pub struct NoopEventSink;

impl ServiceEventSink for NoopEventSink {
    fn record(&self, _event: &ServiceEvent) {}
}

/// Sink that keeps events in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryEventSink {
    /// Captured events in emission order.
    events: Arc<Mutex<Vec<ServiceEvent>>>,
}

impl MemoryEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the captured events.
    #[must_use]
    pub fn events(&self) -> Vec<ServiceEvent> {
        self.events.lock().map(|events| events.clone()).unwrap_or_default()
    }

    /// Returns the captured event identifiers.
    #[must_use]
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events().iter().map(|event| event.event).collect()
    }
}

impl ServiceEventSink for MemoryEventSink {
    fn record(&self, event: &ServiceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Sink wrapper that drops events below a minimum level.
pub struct LevelFilterSink {
    /// Minimum level that is forwarded.
    min_level: EventLevel,
    /// Wrapped sink.
    inner: Arc<dyn ServiceEventSink>,
}

impl LevelFilterSink {
    /// Wraps `inner`, forwarding events at or above `min_level`.
    #[must_use]
    pub fn new(min_level: EventLevel, inner: Arc<dyn ServiceEventSink>) -> Self {
        Self {
            min_level,
            inner,
        }
    }

    /// Wraps `inner` using a level name, falling back to `warning`.
    ///
    /// An unknown name is reported through the wrapped sink.
    #[must_use]
    pub fn from_name(name: &str, inner: Arc<dyn ServiceEventSink>) -> Self {
        let Some(min_level) = EventLevel::parse(name) else {
            inner.record(&ServiceEvent::new(
                "invalid_log_level",
                EventLevel::Warning,
                "logging",
                format!(
                    "\"{name}\" is not a valid log level. The valid log levels are: debug, info, \
                     warning, error, and critical."
                ),
            ));
            return Self::new(EventLevel::Warning, inner);
        };
        Self::new(min_level, inner)
    }

    /// Returns the minimum forwarded level.
    #[must_use]
    pub const fn min_level(&self) -> EventLevel {
        self.min_level
    }
}

impl ServiceEventSink for LevelFilterSink {
    fn record(&self, event: &ServiceEvent) {
        if event.level >= self.min_level {
            self.inner.record(event);
        }
    }
}

// ============================================================================
// SECTION: Environment Setup
// ============================================================================

/// Builds a sink from explicit settings.
///
/// A file path sends events to that file only; otherwise they go to stderr.
///
/// # Errors
///
/// Returns an error when the log file cannot be opened.
pub fn build_sink(
    level: Option<&str>,
    file: Option<&Path>,
) -> io::Result<Arc<dyn ServiceEventSink>> {
    let base: Arc<dyn ServiceEventSink> = match file {
        Some(path) => Arc::new(FileEventSink::new(path)?),
        None => Arc::new(StderrEventSink),
    };
    let sink = match level.filter(|level| !level.trim().is_empty()) {
        Some(level) => LevelFilterSink::from_name(level, base),
        None => LevelFilterSink::new(EventLevel::Warning, base),
    };
    Ok(Arc::new(sink))
}

/// Builds a sink from `RESULTSDB_LOG_LEVEL` and `RESULTSDB_LOG_FILE`.
///
/// # Errors
///
/// Returns an error when the log file cannot be opened.
pub fn sink_from_env() -> io::Result<Arc<dyn ServiceEventSink>> {
    let level = std::env::var(LOG_LEVEL_ENV).ok();
    let file = std::env::var(LOG_FILE_ENV).ok().filter(|file| !file.is_empty());
    build_sink(level.as_deref(), file.as_deref().map(Path::new))
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the current time in milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).map_or(0, |duration| duration.as_millis())
}
