//! Adapter layer for cinedex-db infrastructure.
//!
//! This module bridges cinedex-db implementations with cinedex-core's domain
//! types:
//!
//! - Error conversion from `DbError` to `CatalogError`
//! - Conversion between record rows and [`Movie`] values
//!
//! ## Architecture
//!
//! ```text
//! cinedex-core domain code (engine, indexer, search, reindex)
//!        ↓
//!   db_adapter (this module) - conversions
//!        ↓
//!     cinedex-db implementations (SQLite records, vector collections)
//!
//!   model_adapter (separate module) - embeddings
//!        ↓
//!     cinedex-model implementations (Candle ML inference)
//! ```

use cinedex_db::record::{MovieColumns, MovieRow};

use crate::errors::CatalogError;
use crate::types::{Movie, MovieFields};

// ============================================================================
// Error Conversion
// ============================================================================

/// Convert a cinedex-db error to a cinedex-core error.
pub fn from_db_error(err: cinedex_db::DbError) -> CatalogError {
    use cinedex_db::DbError;

    match err {
        DbError::RecordOpen { path, message } => CatalogError::RecordStoreOpen {
            path,
            reason: message,
        },

        DbError::RecordQuery(sql_err) => CatalogError::RecordStoreQuery {
            reason: sql_err.to_string(),
        },

        DbError::VectorIo { path, message } => CatalogError::VectorIndexIo { path, message },

        DbError::VectorParse { path, message } => CatalogError::VectorIndexParse { path, message },

        DbError::DimensionMismatch { expected, actual } => CatalogError::VectorIndexIncompatible {
            collection: "unknown".to_string(),
            reason: format!("dimension mismatch: expected {}, got {}", expected, actual),
        },

        DbError::IndexNotFound { path } => CatalogError::VectorIndexIo {
            message: format!("Index not found at {:?}", path),
            path,
        },

        DbError::IndexIncompatible { collection, reason } => {
            CatalogError::VectorIndexIncompatible { collection, reason }
        }

        DbError::LanceDb { message } => CatalogError::VectorIndexBackendUnavailable {
            backend: "lancedb".to_string(),
            reason: message,
        },

        DbError::Config { message } => CatalogError::InvalidConfiguration {
            message,
            hint: "Check the `semantic` section of config.yaml.".to_string(),
        },

        DbError::Io(io_err) => CatalogError::Io(io_err),

        DbError::Json(json_err) => CatalogError::Json(json_err),

        DbError::Internal { message } => CatalogError::Other(anyhow::anyhow!(message)),
    }
}

/// Extension trait to convert DbResult to Result<T, CatalogError>.
pub trait IntoCatalogResult<T> {
    /// Convert a DbResult to a CatalogError result.
    fn into_catalog_result(self) -> Result<T, CatalogError>;
}

impl<T> IntoCatalogResult<T> for cinedex_db::DbResult<T> {
    fn into_catalog_result(self) -> Result<T, CatalogError> {
        self.map_err(from_db_error)
    }
}

// ============================================================================
// Record Conversion
// ============================================================================

/// Convert domain fields to record columns.
pub fn to_columns(fields: &MovieFields) -> MovieColumns {
    MovieColumns {
        title: fields.title.clone(),
        year: fields.year.clone(),
        director: fields.director.clone(),
        actors: fields.actors.clone(),
        description: fields.description.clone(),
    }
}

impl From<MovieRow> for Movie {
    fn from(row: MovieRow) -> Self {
        let MovieColumns {
            title,
            year,
            director,
            actors,
            description,
        } = row.columns;

        Movie {
            id: row.id,
            fields: MovieFields {
                title,
                year,
                director,
                actors,
                description,
            },
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
