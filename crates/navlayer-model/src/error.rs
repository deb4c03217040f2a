//! Error types for the layer model
//!
//! Provides error handling for:
//! - Field validation (unknown vs. malformed fields)
//! - Layer loading and saving
//! - Gradient and color construction
//! - Layer combination

use crate::taxonomy::Domain;
use std::path::PathBuf;

/// Validation failure for a single field of a layer structure
///
/// `structure` is the dotted path of the enclosing structure
/// (`layer`, `layer.techniques[3]`, `layer.gradient`, ...).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// Field name not recognised by the current schema
    #[error("unknown field `{field}` in {structure}")]
    UnknownField { structure: String, field: String },

    /// Recognised field holding the wrong primitive kind
    #[error("`{field}` in {structure} must be {expected}")]
    BadType {
        structure: String,
        field: String,
        expected: &'static str,
    },

    /// Recognised field whose value fails its category check
    #[error("`{field}` in {structure} is invalid: {reason}")]
    BadInput {
        structure: String,
        field: String,
        reason: String,
    },

    /// Required field absent
    #[error("{structure} is missing required field `{field}`")]
    MissingRequiredField { structure: String, field: String },
}

impl FieldError {
    /// Create unknown-field error
    pub fn unknown(structure: impl Into<String>, field: impl Into<String>) -> Self {
        Self::UnknownField {
            structure: structure.into(),
            field: field.into(),
        }
    }

    /// Create bad-type error
    pub fn bad_type(
        structure: impl Into<String>,
        field: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::BadType {
            structure: structure.into(),
            field: field.into(),
            expected,
        }
    }

    /// Create bad-input error
    pub fn bad_input(
        structure: impl Into<String>,
        field: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::BadInput {
            structure: structure.into(),
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create missing-field error
    pub fn missing(structure: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingRequiredField {
            structure: structure.into(),
            field: field.into(),
        }
    }

    /// Schema drift: the field is not part of the current schema
    #[inline]
    #[must_use]
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::UnknownField { .. })
    }

    /// A recognised field failed its type or category check
    #[inline]
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::BadType { .. } | Self::BadInput { .. })
    }

    /// Path of the offending field (`structure.field`)
    #[must_use]
    pub fn path(&self) -> String {
        let (structure, field) = match self {
            Self::UnknownField { structure, field }
            | Self::BadType {
                structure, field, ..
            }
            | Self::BadInput {
                structure, field, ..
            }
            | Self::MissingRequiredField { structure, field } => (structure, field),
        };
        format!("{structure}.{field}")
    }
}

/// Errors during layer load/save
#[derive(Debug, thiserror::Error)]
pub enum LayerError {
    /// Field validation failed
    #[error("validation failed: {0}")]
    Field(#[from] FieldError),

    /// Input was not a JSON object
    #[error("layer root must be a JSON object")]
    NotAnObject,

    /// JSON syntax or shape error
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error reading or writing a layer file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Operation requires a loaded layer
    #[error("no layer loaded")]
    Unloaded,
}

impl LayerError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from model value construction and layer operations
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    /// Color string is not `#rgb` / `#rrggbb`
    #[error("invalid color: '{0}'")]
    InvalidColor(String),

    /// Gradient stops or range rejected
    #[error("invalid gradient: {0}")]
    InvalidGradient(String),

    /// Layers from different domains cannot be combined
    #[error("domain mismatch: expected {expected}, got {actual}")]
    MismatchedDomain { expected: Domain, actual: Domain },

    /// Layer combination needs at least one input
    #[error("no layers to combine")]
    NoLayers,

    /// Layer handling failed
    #[error("layer error: {0}")]
    Layer(#[from] LayerError),
}

/// Result type alias for model operations
pub type ModelResult<T> = Result<T, ModelError>;
