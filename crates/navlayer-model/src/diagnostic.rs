//! Load and render diagnostics
//!
//! Non-fatal findings are collected as values and handed back to the caller,
//! who decides whether to surface them. Construction has no side effects;
//! [`Diagnostic::emit`] logs one through `tracing` at the matching level.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational note (migrations, collapsed sub-techniques)
    Info,
    /// Something was dropped or skipped
    Warning,
}

/// A single diagnostic message tied to a document path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,
    /// Path of the element concerned (`layer.versions`, `T1110/credential-access`)
    pub path: String,
    /// Human readable message
    pub message: String,
}

impl Diagnostic {
    /// Create informational diagnostic
    pub fn info(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create warning diagnostic
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            path: path.into(),
            message: message.into(),
        }
    }

    /// Log through `tracing` at the matching level
    pub fn emit(&self) {
        match self.severity {
            Severity::Info => tracing::info!(path = %self.path, "{}", self.message),
            Severity::Warning => tracing::warn!(path = %self.path, "{}", self.message),
        }
    }

    /// Check severity
    #[inline]
    #[must_use]
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
        };
        write!(f, "[{level}] {}: {}", self.path, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_display() {
        let d = Diagnostic::warning("layer.techniques[0]", "dropped");
        assert_eq!(d.to_string(), "[warning] layer.techniques[0]: dropped");
        assert!(d.is_warning());
        assert!(!Diagnostic::info("layer", "note").is_warning());
    }

    #[test]
    fn constructors_build_plain_values() {
        let note = Diagnostic::info("layer.version", "converted");
        assert_eq!(
            note,
            Diagnostic {
                severity: Severity::Info,
                path: "layer.version".into(),
                message: "converted".into(),
            }
        );
        note.emit();
        Diagnostic::warning("layer.bogus", "dropped").emit();
    }
}
