//! Diagnostic reporting for schema compilation
//!
//! Content model compilation does not own the user-facing error channel. It
//! hands [`Diagnostic`]s to an [`ErrorReporter`] supplied by the schema
//! layer, which decides whether to collect, log or abort.

use std::fmt;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Message id of the node limit diagnostic
pub const MAX_OCCUR_LIMIT: &str = "maxOccurLimit";

/// Message id of the Unique Particle Attribution diagnostic
pub const COS_NONAMBIG: &str = "cos-nonambig";

/// Severity of a reported diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Schema is usable, but suspicious
    Warning,
    /// Schema violates a validity rule
    Error,
    /// Compilation of the schema cannot continue
    FatalError,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
            Self::FatalError => write!(f, "fatal error"),
        }
    }
}

/// A structured schema diagnostic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Message id
    pub key: &'static str,
    /// Human readable message
    pub message: String,
    /// Severity
    pub severity: Severity,
    /// Display forms of the offending schema components
    pub components: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(key: &'static str, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            key,
            message: message.into(),
            severity,
            components: Vec::new(),
        }
    }

    /// Attach an offending component
    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.components.push(component.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.key, self.message)
    }
}

/// Sink for schema diagnostics
pub trait ErrorReporter: Send + Sync + fmt::Debug {
    /// Report one diagnostic
    fn report(&self, diagnostic: Diagnostic);
}

/// Reporter that forwards diagnostics to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Warning => log::warn!("{}", diagnostic),
            Severity::Error | Severity::FatalError => log::error!("{}", diagnostic),
        }
    }
}

/// Reporter that keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct CollectingReporter {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl CollectingReporter {
    /// Create an empty reporter
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the collected diagnostics
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    /// Whether any diagnostic of severity error or worse was reported
    pub fn has_errors(&self) -> bool {
        self.lock().iter().any(|d| d.severity >= Severity::Error)
    }

    /// Whether a fatal diagnostic was reported
    pub fn has_fatal_errors(&self) -> bool {
        self.lock().iter().any(|d| d.severity == Severity::FatalError)
    }

    /// Forget all collected diagnostics
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        // a poisoned list is still a valid list
        self.diagnostics.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl ErrorReporter for CollectingReporter {
    fn report(&self, diagnostic: Diagnostic) {
        self.lock().push(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_order() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::FatalError);
    }

    #[test]
    fn test_collecting_reporter() {
        let reporter = CollectingReporter::new();
        assert!(!reporter.has_errors());

        reporter.report(Diagnostic::new(COS_NONAMBIG, Severity::Warning, "ambiguous"));
        assert!(!reporter.has_errors());

        reporter.report(
            Diagnostic::new(MAX_OCCUR_LIMIT, Severity::FatalError, "too many nodes")
                .with_component("limit 10"),
        );
        assert!(reporter.has_errors());
        assert!(reporter.has_fatal_errors());

        let diagnostics = reporter.diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[1].components, vec!["limit 10".to_string()]);

        reporter.clear();
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::new(COS_NONAMBIG, Severity::Error, "a and a overlap");
        assert_eq!(d.to_string(), "[error] cos-nonambig: a and a overlap");
    }

    #[test]
    fn test_severity_serde() {
        let s: Severity = serde_json::from_str("\"fatal_error\"").unwrap();
        assert_eq!(s, Severity::FatalError);
    }
}
