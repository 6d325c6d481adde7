// chronovault-core/src/core/diagnostics.rs
// ============================================================================
// Module: Diagnostics
// Description: Explicit diagnostic sink threaded through the archive gateway.
// Purpose: Replace process-global logging with an injected reporting seam.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! The archive never writes to a process-global logger. Every gateway takes
//! a [`SharedDiagnosticSink`] at construction and reports connection state,
//! statement registration, and storage failures through it. The provided
//! sinks discard records, capture them for test assertions, or forward them
//! to the `tracing` ecosystem.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Record Types
// ============================================================================

/// Severity of a diagnostic record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticLevel {
    /// Fine-grained operational detail.
    Trace,
    /// Lifecycle and progress messages.
    Debug,
    /// Recoverable anomalies.
    Warning,
    /// Operation failures.
    Error,
}

/// One diagnostic record emitted by the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticRecord {
    /// Record severity.
    pub level: DiagnosticLevel,
    /// Human-readable message.
    pub message: String,
    /// Statement name when the record is attributable to one.
    pub statement: Option<String>,
}

impl DiagnosticRecord {
    /// Creates a record without statement context.
    #[must_use]
    pub fn new(level: DiagnosticLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            statement: None,
        }
    }

    /// Creates a record attributed to a named statement.
    #[must_use]
    pub fn for_statement(
        level: DiagnosticLevel,
        statement: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            level,
            message: message.into(),
            statement: Some(statement.into()),
        }
    }
}

// ============================================================================
// SECTION: Sink Trait
// ============================================================================

/// Receiver for diagnostic records.
pub trait DiagnosticSink {
    /// Consumes one diagnostic record.
    fn emit(&self, record: DiagnosticRecord);
}

/// Shared diagnostic sink backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedDiagnosticSink {
    /// Inner sink implementation.
    inner: Arc<dyn DiagnosticSink + Send + Sync>,
}

impl SharedDiagnosticSink {
    /// Wraps a sink in a shared, clonable handle.
    #[must_use]
    pub fn from_sink(sink: impl DiagnosticSink + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(sink),
        }
    }

    /// Wraps an existing shared sink.
    #[must_use]
    pub const fn new(sink: Arc<dyn DiagnosticSink + Send + Sync>) -> Self {
        Self {
            inner: sink,
        }
    }

    /// Returns a sink that discards every record.
    #[must_use]
    pub fn disabled() -> Self {
        Self::from_sink(NullDiagnosticSink)
    }

    /// Emits a trace-level record.
    pub fn trace(&self, message: impl Into<String>) {
        self.inner.emit(DiagnosticRecord::new(DiagnosticLevel::Trace, message));
    }

    /// Emits a debug-level record.
    pub fn debug(&self, message: impl Into<String>) {
        self.inner.emit(DiagnosticRecord::new(DiagnosticLevel::Debug, message));
    }

    /// Emits a warning-level record.
    pub fn warning(&self, message: impl Into<String>) {
        self.inner.emit(DiagnosticRecord::new(DiagnosticLevel::Warning, message));
    }

    /// Emits an error-level record.
    pub fn error(&self, message: impl Into<String>) {
        self.inner.emit(DiagnosticRecord::new(DiagnosticLevel::Error, message));
    }

    /// Emits an error-level record attributed to a statement.
    pub fn statement_error(&self, statement: impl Into<String>, message: impl Into<String>) {
        self.inner.emit(DiagnosticRecord::for_statement(
            DiagnosticLevel::Error,
            statement,
            message,
        ));
    }

    /// Emits a trace-level record attributed to a statement.
    pub fn statement_trace(&self, statement: impl Into<String>, message: impl Into<String>) {
        self.inner.emit(DiagnosticRecord::for_statement(
            DiagnosticLevel::Trace,
            statement,
            message,
        ));
    }
}

// ============================================================================
// SECTION: Provided Sinks
// ============================================================================

/// Sink that discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDiagnosticSink;

impl DiagnosticSink for NullDiagnosticSink {
    fn emit(&self, _record: DiagnosticRecord) {}
}

/// Sink that captures records in memory for test assertions.
#[derive(Debug, Default, Clone)]
pub struct MemoryDiagnosticSink {
    /// Captured records guarded by a mutex.
    records: Arc<Mutex<Vec<DiagnosticRecord>>>,
}

impl MemoryDiagnosticSink {
    /// Creates an empty capturing sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of the captured records.
    #[must_use]
    pub fn records(&self) -> Vec<DiagnosticRecord> {
        self.records.lock().map(|guard| guard.clone()).unwrap_or_default()
    }
}

impl DiagnosticSink for MemoryDiagnosticSink {
    fn emit(&self, record: DiagnosticRecord) {
        if let Ok(mut guard) = self.records.lock() {
            guard.push(record);
        }
    }
}

/// Sink that forwards records to the `tracing` ecosystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnosticSink;

impl DiagnosticSink for TracingDiagnosticSink {
    fn emit(&self, record: DiagnosticRecord) {
        let statement = record.statement.as_deref().unwrap_or("");
        match record.level {
            DiagnosticLevel::Trace => {
                tracing::trace!(statement, "{}", record.message);
            }
            DiagnosticLevel::Debug => {
                tracing::debug!(statement, "{}", record.message);
            }
            DiagnosticLevel::Warning => {
                tracing::warn!(statement, "{}", record.message);
            }
            DiagnosticLevel::Error => {
                tracing::error!(statement, "{}", record.message);
            }
        }
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
