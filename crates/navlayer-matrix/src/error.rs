//! Error types for matrix building

use navlayer_model::Domain;
use std::path::PathBuf;

/// Errors from framework sources and matrix construction
#[derive(Debug, thiserror::Error)]
pub enum MatrixError {
    /// Framework source could not answer a query
    #[error("framework source error: {0}")]
    Source(String),

    /// Bundle text or object shape invalid
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error reading a framework snapshot
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source holds no matrix definition for the domain
    #[error("no {domain} matrix in framework edition '{edition}'")]
    NoMatrix { domain: Domain, edition: String },

    /// Framework object missing something the builder needs
    #[error("malformed framework object {id}: {reason}")]
    MalformedObject { id: String, reason: String },
}

impl MatrixError {
    /// Create source error
    pub fn source(msg: impl Into<String>) -> Self {
        Self::Source(msg.into())
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create malformed-object error
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedObject {
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for matrix operations
pub type MatrixResult<T> = Result<T, MatrixError>;
