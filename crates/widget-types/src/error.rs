//! Host error taxonomy and the error sink consumed for logging/telemetry.
//!
//! Every fault is caught locally, reported here with a scope, and converted
//! into a fallback renderable output; no error kind is fatal to the
//! controller.

use std::fmt;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Closed enumeration of error scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorScope {
    /// Reference resolved to nothing.
    Source,
    /// The sandbox faulted during a run.
    Execution,
    /// A fault surfaced while consuming execution output.
    Boundary,
}

impl fmt::Display for ErrorScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Execution => f.write_str("execution"),
            Self::Boundary => f.write_str("boundary"),
        }
    }
}

/// A scoped, reportable host error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostError {
    pub scope: ErrorScope,
    pub message: String,
}

impl HostError {
    pub fn source(message: impl Into<String>) -> Self {
        Self {
            scope: ErrorScope::Source,
            message: message.into(),
        }
    }

    pub fn execution(message: impl Into<String>) -> Self {
        Self {
            scope: ErrorScope::Execution,
            message: message.into(),
        }
    }

    pub fn boundary(message: impl Into<String>) -> Self {
        Self {
            scope: ErrorScope::Boundary,
            message: message.into(),
        }
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.scope, self.message)
    }
}

impl std::error::Error for HostError {}

/// Sink for scoped error reports, consumed by the host for logging/telemetry.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: HostError);
}

/// Sink that forwards reports to `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

impl ErrorSink for TracingSink {
    fn report(&self, error: HostError) {
        tracing::error!(scope = %error.scope, "{}", error.message);
    }
}

/// Sink that buffers reports in memory, for hosts that surface errors
/// themselves and for tests.
#[derive(Debug, Default)]
pub struct CollectingSink {
    reports: Mutex<Vec<HostError>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all reports so far.
    pub fn reports(&self) -> Vec<HostError> {
        self.reports.lock().clone()
    }

    /// Drain all buffered reports.
    pub fn take(&self) -> Vec<HostError> {
        std::mem::take(&mut self.reports.lock())
    }
}

impl ErrorSink for CollectingSink {
    fn report(&self, error: HostError) {
        self.reports.lock().push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_scope() {
        let error = HostError::execution("alice.near/widget/Foo: boom");
        assert_eq!(error.to_string(), "[execution] alice.near/widget/Foo: boom");
    }

    #[test]
    fn test_collecting_sink_buffers_in_order() {
        let sink = CollectingSink::new();
        sink.report(HostError::source("missing"));
        sink.report(HostError::boundary("render"));
        let reports = sink.take();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].scope, ErrorScope::Source);
        assert_eq!(reports[1].scope, ErrorScope::Boundary);
        assert!(sink.reports().is_empty());
    }
}
