//! Error types for cinedex-db.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cinedex-db operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur in cinedex-db operations.
#[derive(Debug, Error)]
pub enum DbError {
    // ========================================================================
    // Record store errors
    // ========================================================================
    /// Failed to open the record database.
    #[error("Failed to open record store at {path}: {message}")]
    RecordOpen { path: PathBuf, message: String },

    /// A statement against the record table failed.
    #[error("Record store query failed: {0}")]
    RecordQuery(#[from] rusqlite::Error),

    // ========================================================================
    // Vector index errors
    // ========================================================================
    /// Vector index I/O error.
    #[error("Vector index I/O error at {path}: {message}")]
    VectorIo { path: PathBuf, message: String },

    /// Vector index parse error.
    #[error("Vector index parse error at {path}: {message}")]
    VectorParse { path: PathBuf, message: String },

    /// Vector dimension mismatch.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector index not found.
    #[error("Vector index not found at {path}")]
    IndexNotFound { path: PathBuf },

    /// Vector index incompatible with the requested configuration.
    #[error("Vector index '{collection}' is incompatible: {reason}")]
    IndexIncompatible { collection: String, reason: String },

    /// LanceDB error. Present in every build so callers can match on it
    /// without enabling the `lancedb` feature.
    #[error("LanceDB error: {message}")]
    LanceDb { message: String },

    // ========================================================================
    // General errors
    // ========================================================================
    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// IO error wrapper.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error wrapper.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic internal error.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DbError {
    /// Create a record store open error.
    pub fn record_open(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::RecordOpen {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a vector I/O error.
    pub fn vector_io(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::VectorIo {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a vector parse error.
    pub fn vector_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::VectorParse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an index incompatible error.
    pub fn index_incompatible(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IndexIncompatible {
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

#[cfg(feature = "lancedb")]
impl From<lancedb::Error> for DbError {
    fn from(err: lancedb::Error) -> Self {
        Self::LanceDb {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lancedb_variant_without_feature_gate() {
        let err = DbError::LanceDb {
            message: "table missing".to_string(),
        };
        assert_eq!(err.to_string(), "LanceDB error: table missing");
    }
}
