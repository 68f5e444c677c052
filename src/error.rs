//! Error types for the recorder.

use thiserror::Error;

/// Main error type for recording and query operations.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RecorderError {
    #[error("Series already finalized: {path}")]
    AlreadyFinalized { path: String },

    #[error("Series not finalized: {path}")]
    NotFinalized { path: String },

    #[error("Schema mismatch at '{path}' field '{field}': expected {expected}, found {found}")]
    SchemaMismatch {
        /// Leaf path in the dataset tree, empty for a standalone series.
        path: String,
        /// `/`-separated field path inside the series' record.
        field: String,
        expected: String,
        found: String,
    },

    #[error("Meta-time mismatch: series {expected}, point {found}")]
    MetaTimeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid timestamp: {0}")]
    InvalidTime(f64),

    #[error("Invalid path: {0:?}")]
    InvalidPath(String),

    #[error("Path conflict: {0}")]
    PathConflict(String),

    #[error("Path not found: {0}")]
    PathNotFound(String),

    #[error("Field not found: {0}")]
    FieldNotFound(String),

    #[error("Mask length mismatch: expected {expected}, got {found}")]
    MaskLength { expected: usize, found: usize },
}

impl RecorderError {
    /// Prefix the tree path carried by state, schema and path errors with
    /// `parent`, joined by `delim`.
    ///
    /// Used while an error travels up through the dataset tree so the final
    /// message names the full leaf path in the caller's own delimiter.
    pub(crate) fn within(self, parent: &str, delim: &str) -> Self {
        let join = |p: String| {
            if p.is_empty() {
                parent.to_string()
            } else {
                format!("{parent}{delim}{p}")
            }
        };

        match self {
            RecorderError::AlreadyFinalized { path } => {
                RecorderError::AlreadyFinalized { path: join(path) }
            }
            RecorderError::NotFinalized { path } => {
                RecorderError::NotFinalized { path: join(path) }
            }
            RecorderError::SchemaMismatch {
                path,
                field,
                expected,
                found,
            } => RecorderError::SchemaMismatch {
                path: join(path),
                field,
                expected,
                found,
            },
            RecorderError::PathConflict(path) => RecorderError::PathConflict(join(path)),
            RecorderError::PathNotFound(path) => RecorderError::PathNotFound(join(path)),
            other => other,
        }
    }

    /// Prefix the field path of a schema error with the enclosing record's
    /// field name.
    pub(crate) fn within_field(self, parent: &str) -> Self {
        match self {
            RecorderError::SchemaMismatch {
                path,
                field,
                expected,
                found,
            } => RecorderError::SchemaMismatch {
                path,
                field: format!("{parent}/{field}"),
                expected,
                found,
            },
            other => other,
        }
    }
}

/// Result type for recorder operations.
pub type Result<T> = std::result::Result<T, RecorderError>;
