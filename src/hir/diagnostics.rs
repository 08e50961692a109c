//! Diagnostics: checker error reporting.
//!
//! Diagnostics are the only output the checker hands to the reporting
//! collaborator besides resolved types. Rendering (source snippets,
//! line/column conversion, colors) happens elsewhere.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::base::{FileId, Location};
use super::error::CheckError;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => f.write_str("error"),
            Severity::Warning => f.write_str("warning"),
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub location: Location,
    pub severity: Severity,
    /// Error/warning code (e.g., "E0001").
    pub code: Option<Arc<str>>,
    pub message: Arc<str>,
    pub related: Vec<RelatedInfo>,
}

/// Related information for a diagnostic.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelatedInfo {
    pub location: Location,
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(location: Location, message: impl Into<Arc<str>>) -> Self {
        Self {
            location,
            severity: Severity::Error,
            code: None,
            message: message.into(),
            related: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(location: Location, message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(location, message)
        }
    }

    /// Build the diagnostic for a checker error, carrying its code and
    /// pointing back at the earlier declaration for duplicates.
    pub fn from_error(error: &CheckError, location: Location) -> Self {
        let mut diag = Self::error(location, error.to_string()).with_code(error.code());
        if let Some((previous, message)) = error.previous_location() {
            diag = diag.with_related(RelatedInfo {
                location: previous,
                message: Arc::from(message),
            });
        }
        diag
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Add related information.
    pub fn with_related(mut self, info: RelatedInfo) -> Self {
        self.related.push(info);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}[{}]: {}", self.severity, code, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
pub mod codes {
    pub const UNKNOWN_CLASS: &str = "E0001";
    pub const UNKNOWN_CONSTANT: &str = "E0002";
    pub const NO_PARENT: &str = "E0003";
    pub const NO_ENCLOSING_CLASS: &str = "E0004";
    pub const DUPLICATE_CLASS: &str = "E0005";
    pub const DUPLICATE_CONSTANT: &str = "E0006";
    pub const ABSTRACT_CONSTANT: &str = "E0007";
    pub const CYCLIC_CONSTANT: &str = "E0008";
    pub const INVALID_SHAPE_KEY: &str = "E0009";
    pub const DUPLICATE_SHAPE_KEY: &str = "E0010";
    pub const UNKNOWN_SHAPE_FIELD: &str = "E0011";
    pub const MISSING_REQUIRED_FIELD: &str = "E0012";
    pub const FIELD_TYPE_MISMATCH: &str = "E0013";
    pub const UNKNOWN_TYPE: &str = "E0014";
    pub const NOT_A_SHAPE: &str = "E0015";

    /// Direct access to an optional shape field.
    pub const OPTIONAL_FIELD_ACCESS: &str = "W0001";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during checking.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        debug!(%diagnostic, location = ?diagnostic.location, "diagnostic");
        self.diagnostics.push(diagnostic);
    }

    /// Record a checker error at `location`.
    pub fn report(&mut self, error: &CheckError, location: Location) {
        self.add(Diagnostic::from_error(error, location));
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get diagnostics for a specific compilation unit.
    pub fn diagnostics_for_file(&self, file: FileId) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.location.file == file)
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .count()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
