//! Leveled, trace-correlated application log.
//!
//! Every entry carries the trace and span of the [`Context`] it was logged
//! under, so log lines can be joined with the trace that produced them. The
//! trace field is rendered `projects/{project}/traces/{trace_id}` when a
//! project is configured.

use crate::context::Context;
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Log severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    /// Normal operation.
    Info,
    /// A failed operation; the caller carries on.
    Error,
    /// A failure the process cannot continue after.
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Info => "INFO",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        })
    }
}

/// One log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Severity.
    pub severity: Severity,
    /// Message text.
    pub message: String,
    /// Rendered trace reference, if logged under a span.
    pub trace: Option<String>,
    /// Span id in hex, if logged under a span.
    pub span_id: Option<String>,
}

/// Destination for log entries.
pub trait LogSink: Send + Sync {
    /// Records one entry.
    fn log(&self, entry: &LogEntry);
}

/// Forwards entries to `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, entry: &LogEntry) {
        let trace = entry.trace.as_deref().unwrap_or_default();
        let span_id = entry.span_id.as_deref().unwrap_or_default();
        match entry.severity {
            Severity::Info => tracing::info!(trace, span_id, "{}", entry.message),
            Severity::Error => tracing::error!(trace, span_id, "{}", entry.message),
            Severity::Critical => {
                tracing::error!(trace, span_id, critical = true, "{}", entry.message)
            }
        }
    }
}

/// Keeps entries in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every entry recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().clone()
    }

    /// Returns the entries at `severity`.
    #[must_use]
    pub fn at(&self, severity: Severity) -> Vec<LogEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| e.severity == severity)
            .cloned()
            .collect()
    }

    /// Returns true if any message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.entries.lock().iter().any(|e| e.message.contains(needle))
    }

    /// Drops every recorded entry.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().push(entry.clone());
    }
}

/// The application log: a sink plus the project traces are filed under.
#[derive(Clone)]
pub struct AppLog {
    sink: Arc<dyn LogSink>,
    project: Option<String>,
}

impl fmt::Debug for AppLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppLog")
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}

impl AppLog {
    /// Creates a log writing to `sink`.
    pub fn new(sink: Arc<dyn LogSink>, project: Option<String>) -> Self {
        let project = project.filter(|p| !p.is_empty());
        Self { sink, project }
    }

    /// Creates a log that forwards to `tracing`.
    pub fn tracing(project: Option<String>) -> Self {
        Self::new(Arc::new(TracingSink), project)
    }

    /// Returns the project traces are filed under.
    #[must_use]
    pub fn project(&self) -> Option<&str> {
        self.project.as_deref()
    }

    /// Logs at info level.
    pub fn info(&self, cx: &Context, message: impl Into<String>) {
        self.log(Severity::Info, cx, message);
    }

    /// Logs at error level.
    pub fn error(&self, cx: &Context, message: impl Into<String>) {
        self.log(Severity::Error, cx, message);
    }

    /// Logs at critical level. Terminating the process is up to the caller.
    pub fn critical(&self, cx: &Context, message: impl Into<String>) {
        self.log(Severity::Critical, cx, message);
    }

    /// Logs `message` at `severity`, tagged with the span of `cx`.
    pub fn log(&self, severity: Severity, cx: &Context, message: impl Into<String>) {
        let (trace, span_id) = match cx.span() {
            Some(span) => (
                Some(self.trace_reference(&span.trace_id.to_string())),
                Some(span.span_id.to_string()),
            ),
            None => (None, None),
        };
        self.sink.log(&LogEntry {
            severity,
            message: message.into(),
            trace,
            span_id,
        });
    }

    /// Starts a span named `name` under `cx`. Its elapsed time is logged
    /// when it ends.
    #[must_use]
    pub fn start_span(&self, cx: &Context, name: impl Into<String>) -> Span {
        Span {
            name: name.into(),
            context: cx.child(),
            started: Instant::now(),
            log: self.clone(),
            ended: false,
        }
    }

    fn trace_reference(&self, trace_id: &str) -> String {
        match &self.project {
            Some(project) => format!("projects/{project}/traces/{trace_id}"),
            None => trace_id.to_string(),
        }
    }
}

/// A timed operation. Dropping an un-ended span ends it.
#[derive(Debug)]
pub struct Span {
    name: String,
    context: Context,
    started: Instant,
    log: AppLog,
    ended: bool,
}

impl Span {
    /// Returns the span's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the context operations inside this span run under.
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Ends the span and returns its elapsed time.
    pub fn end(mut self) -> Duration {
        self.finish()
    }

    fn finish(&mut self) -> Duration {
        let elapsed = self.started.elapsed();
        if !self.ended {
            self.ended = true;
            self.log.info(
                &self.context,
                format!("span {} took {}us", self.name, elapsed.as_micros()),
            );
        }
        elapsed
    }
}

impl Drop for Span {
    fn drop(&mut self) {
        self.finish();
    }
}
