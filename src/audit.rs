//! Audit Log Module
//!
//! Append-only, ordered sequence of structured events emitted throughout a
//! parse. The log is purely observational: the parser never reads it back,
//! only callers and tests do. Every event that refers to a source line
//! carries the absolute row index so anomalies can be traced to the
//! offending spreadsheet row.

use serde::Serialize;
use std::fmt;

/// Event severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Severity {
    /// Normal progress (block captured, header located).
    Info,
    /// Recoverable anomaly; the block or field degraded but the parse went on.
    Warning,
    /// Block-local failure; the order was kept but its items were abandoned.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARN"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// One structured audit event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditEvent {
    /// Severity of the event.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Absolute grid row the event refers to, when applicable.
    pub row: Option<usize>,
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "[{}] {} (row {})", self.severity, self.message, row),
            None => write!(f, "[{}] {}", self.severity, self.message),
        }
    }
}

/// Ordered, append-only audit log.
///
/// In verbose mode, field-level coercion failures (unparseable numbers in
/// monetary cells) are recorded as well; by default only block-level events
/// are kept, since blank monetary placeholders are routine in this domain.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditLog {
    events: Vec<AuditEvent>,
    #[serde(skip)]
    verbose: bool,
}

impl AuditLog {
    pub(crate) fn new(verbose: bool) -> Self {
        Self {
            events: Vec::new(),
            verbose,
        }
    }

    pub(crate) fn info(&mut self, message: impl Into<String>) {
        self.push(Severity::Info, message.into(), None);
    }

    pub(crate) fn info_at(&mut self, message: impl Into<String>, row: usize) {
        self.push(Severity::Info, message.into(), Some(row));
    }

    pub(crate) fn warn_at(&mut self, message: impl Into<String>, row: usize) {
        self.push(Severity::Warning, message.into(), Some(row));
    }

    pub(crate) fn error_at(&mut self, message: impl Into<String>, row: usize) {
        self.push(Severity::Error, message.into(), Some(row));
    }

    /// Recorded only in verbose mode; used for field-local coercion failures.
    pub(crate) fn verbose_at(&mut self, message: impl Into<String>, row: usize) {
        if self.verbose {
            self.push(Severity::Warning, message.into(), Some(row));
        }
    }

    fn push(&mut self, severity: Severity, message: String, row: Option<usize>) {
        self.events.push(AuditEvent {
            severity,
            message,
            row,
        });
    }

    /// Iterate over the recorded events in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &AuditEvent> {
        self.events.iter()
    }

    /// Events of a given severity, in emission order.
    pub fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &AuditEvent> {
        self.events.iter().filter(move |e| e.severity == severity)
    }

    /// Render every event as a display line.
    pub fn lines(&self) -> Vec<String> {
        self.events.iter().map(|e| e.to_string()).collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True when no events were recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
