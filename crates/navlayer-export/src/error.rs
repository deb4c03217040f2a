//! Error types for layer export

use navlayer_matrix::MatrixError;
use navlayer_model::{Domain, LayerError};
use std::path::PathBuf;

/// Errors that abort one export
///
/// Per-annotation problems (unresolved or hidden techniques) are
/// diagnostics on the export result, never errors.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    /// Layer domain differs from the exporter's domain
    #[error("layer domain {actual} does not match exporter domain {expected}")]
    DomainMismatch { expected: Domain, actual: Domain },

    /// Layer could not be loaded or saved
    #[error("layer error: {0}")]
    Layer(#[from] LayerError),

    /// Framework matrix could not be built
    #[error("matrix error: {0}")]
    Matrix(#[from] MatrixError),

    /// Export configuration invalid
    #[error("configuration error: {0}")]
    Config(String),

    /// YAML configuration could not be parsed
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON encoding or decoding failed
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unknown output format name
    #[error("unsupported output format '{0}'")]
    UnsupportedFormat(String),

    /// IO error
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExportError {
    /// Create configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create IO error with path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;
