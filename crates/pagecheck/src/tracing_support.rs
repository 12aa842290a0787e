//! Step Tracing
//!
//! Records one span per page operation (navigation, locator action,
//! expectation, convergence poll) so a failed case can be replayed from its
//! JSON trace. Tracing is switched on per attempt by the fixture harness
//! according to the run's trace policy.

use crate::result::PagecheckResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use uuid::Uuid;

/// A traced span (one page operation)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracedSpan {
    /// Unique span ID
    pub id: String,
    /// Enclosing span, if nested
    pub parent_id: Option<String>,
    /// Operation name (`goto`, `click`, `expect.to_have_text`, ...)
    pub name: String,
    /// What the operation targeted (URL, locator, predicate)
    pub target: String,
    /// Start offset (ms since trace start)
    pub start_ms: u64,
    /// End offset (ms since trace start)
    pub end_ms: Option<u64>,
    /// Span duration
    pub duration_ms: Option<u64>,
    /// Span attributes
    pub attributes: HashMap<String, String>,
    /// Span status
    pub status: SpanStatus,
}

impl TracedSpan {
    /// Create a new running span
    #[must_use]
    pub fn new(name: &str, target: &str, start_ms: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            parent_id: None,
            name: name.to_string(),
            target: target.to_string(),
            start_ms,
            end_ms: None,
            duration_ms: None,
            attributes: HashMap::new(),
            status: SpanStatus::Running,
        }
    }

    /// Set parent ID
    #[must_use]
    pub fn with_parent(mut self, parent_id: Option<&str>) -> Self {
        self.parent_id = parent_id.map(str::to_string);
        self
    }

    /// Add an attribute
    pub fn add_attribute(&mut self, key: &str, value: &str) {
        self.attributes.insert(key.to_string(), value.to_string());
    }

    /// End the span
    pub fn end(&mut self, end_ms: u64) {
        self.end_ms = Some(end_ms);
        self.duration_ms = Some(end_ms.saturating_sub(self.start_ms));
        if self.status == SpanStatus::Running {
            self.status = SpanStatus::Ok;
        }
    }

    /// Mark as error
    pub fn mark_error(&mut self, message: &str) {
        self.status = SpanStatus::Error;
        self.add_attribute("error.message", message);
    }

    /// Error message, if the span failed
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.attributes.get("error.message").map(String::as_str)
    }

    /// Check if span is complete
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.end_ms.is_some()
    }
}

/// Status of a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanStatus {
    /// Span is running
    Running,
    /// Span completed successfully
    Ok,
    /// Span completed with error
    Error,
    /// Trace stopped before the span ended
    Cancelled,
}

/// Metadata for a trace archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceMetadata {
    /// Trace ID
    pub trace_id: String,
    /// Case name
    pub test_name: String,
    /// Attempt number (0 = first run)
    pub attempt: u32,
    /// Start time
    pub start_time: DateTime<Utc>,
    /// End time
    pub end_time: Option<DateTime<Utc>>,
    /// Total duration in ms
    pub duration_ms: Option<u64>,
    /// Number of spans
    pub span_count: usize,
    /// Crate version that wrote the trace
    pub pagecheck_version: String,
}

impl TraceMetadata {
    /// Create new metadata
    #[must_use]
    pub fn new(test_name: &str, attempt: u32) -> Self {
        Self {
            trace_id: Uuid::new_v4().to_string(),
            test_name: test_name.to_string(),
            attempt,
            start_time: Utc::now(),
            end_time: None,
            duration_ms: None,
            span_count: 0,
            pagecheck_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Complete trace archive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceArchive {
    /// Trace metadata
    pub metadata: TraceMetadata,
    /// All traced spans, in start order
    pub spans: Vec<TracedSpan>,
}

impl TraceArchive {
    /// Save archive to JSON file
    pub fn save_json(&self, path: &Path) -> PagecheckResult<()> {
        let json = serde_json::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, json)?;
        Ok(())
    }

    /// Load archive from JSON file
    pub fn load_json(path: &Path) -> PagecheckResult<Self> {
        let json = fs::read_to_string(path)?;
        let archive: TraceArchive = serde_json::from_str(&json)?;
        Ok(archive)
    }

    /// Get spans by name
    #[must_use]
    pub fn spans_by_name(&self, name: &str) -> Vec<&TracedSpan> {
        self.spans.iter().filter(|s| s.name == name).collect()
    }

    /// Get error spans
    #[must_use]
    pub fn error_spans(&self) -> Vec<&TracedSpan> {
        self.spans
            .iter()
            .filter(|s| s.status == SpanStatus::Error)
            .collect()
    }
}

#[derive(Debug)]
struct TracerState {
    start_time: Instant,
    metadata: TraceMetadata,
    spans: Vec<TracedSpan>,
    open: Vec<String>,
}

impl TracerState {
    fn elapsed_ms(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }
}

/// Shared step recorder for one attempt of one case.
///
/// Cloning yields another handle to the same trace; pages hand a clone to
/// every locator they create.
#[derive(Debug, Clone)]
pub struct StepTracer {
    state: Arc<Mutex<TracerState>>,
}

impl StepTracer {
    /// Start tracing `test_name`
    #[must_use]
    pub fn new(test_name: &str, attempt: u32) -> Self {
        Self {
            state: Arc::new(Mutex::new(TracerState {
                start_time: Instant::now(),
                metadata: TraceMetadata::new(test_name, attempt),
                spans: Vec::new(),
                open: Vec::new(),
            })),
        }
    }

    // A panic while holding the lock leaves the trace usable.
    fn lock(&self) -> MutexGuard<'_, TracerState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Open a span nested under the innermost open span
    pub fn start_span(&self, name: &str, target: &str) -> String {
        let mut state = self.lock();
        let span = TracedSpan::new(name, target, state.elapsed_ms())
            .with_parent(state.open.last().map(String::as_str));
        let id = span.id.clone();
        state.open.push(id.clone());
        state.spans.push(span);
        id
    }

    /// Close a span, marking it failed when `error` is set
    pub fn end_span(&self, span_id: &str, error: Option<&str>) {
        let mut state = self.lock();
        let end_ms = state.elapsed_ms();
        if let Some(span) = state.spans.iter_mut().find(|s| s.id == span_id) {
            if let Some(message) = error {
                span.mark_error(message);
            }
            span.end(end_ms);
        }
        state.open.retain(|id| id != span_id);
    }

    /// Number of recorded spans
    #[must_use]
    pub fn span_count(&self) -> usize {
        self.lock().spans.len()
    }

    /// Stop tracing and return the archive; spans still open are cancelled
    #[must_use]
    pub fn finish(&self) -> TraceArchive {
        let mut state = self.lock();
        let end_ms = state.elapsed_ms();
        for span in &mut state.spans {
            if !span.is_complete() {
                span.status = SpanStatus::Cancelled;
                span.end(end_ms);
            }
        }
        state.open.clear();
        state.metadata.end_time = Some(Utc::now());
        state.metadata.duration_ms = Some(end_ms);
        state.metadata.span_count = state.spans.len();

        TraceArchive {
            metadata: state.metadata.clone(),
            spans: state.spans.clone(),
        }
    }
}
