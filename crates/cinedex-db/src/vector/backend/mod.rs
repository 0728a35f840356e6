//! Vector index backend implementations.
//!
//! ## Available Backends
//!
//! - `lancedb` (default): LanceDB table with ANN search
//! - `simple`: JSONL file with linear scan, for tests and small catalogs

#[cfg(feature = "lancedb")]
mod lancedb;

#[cfg(feature = "simple")]
mod simple;

#[cfg(feature = "lancedb")]
pub use self::lancedb::LanceDbVectorIndex;

#[cfg(feature = "simple")]
pub use simple::SimpleFileVectorIndex;

use super::config::{
    check_index_compatibility, write_index_meta, VectorIndexCompatibility, VectorIndexConfig,
    VectorIndexMeta,
};
use super::traits::VectorIndexBackend;
use crate::error::{DbError, DbResult};
use std::sync::Arc;
use tracing::{debug, info};

/// Open (or create) the collection described by `config`.
///
/// An existing compatible collection is reused as-is. A missing one is
/// created when `create_if_missing` is set.
///
/// # Errors
///
/// Returns an error if:
/// - The collection exists but is incompatible (dimension, backend, metric
///   or embedding model changed, or its metadata is unreadable)
/// - The backend is not supported
/// - The collection cannot be created or opened
pub fn open_vector_index(config: &VectorIndexConfig) -> DbResult<Arc<dyn VectorIndexBackend>> {
    let dir = config.collection_path();
    debug!("Opening vector collection at {:?}", dir);

    match check_index_compatibility(config) {
        VectorIndexCompatibility::Compatible => {
            debug!("Collection is compatible, opening...");
        }
        VectorIndexCompatibility::NotFound => {
            if !config.create_if_missing {
                return Err(DbError::IndexNotFound { path: dir });
            }
            info!("Collection not found, creating new collection at {:?}", dir);
            std::fs::create_dir_all(&dir)?;
            write_index_meta(&dir, &VectorIndexMeta::from_config(config))?;
        }
        VectorIndexCompatibility::IncompatibleDimension { expected, actual } => {
            return Err(DbError::DimensionMismatch { expected, actual });
        }
        other => {
            let reason = other
                .reason()
                .unwrap_or_else(|| "unknown incompatibility".to_string());
            return Err(DbError::index_incompatible(&config.collection, reason));
        }
    }

    match config.backend.as_str() {
        #[cfg(feature = "lancedb")]
        "lancedb" => {
            let index = LanceDbVectorIndex::open(config)?;
            Ok(Arc::new(index))
        }

        #[cfg(feature = "simple")]
        "simple" => {
            let index = SimpleFileVectorIndex::open(config)?;
            Ok(Arc::new(index))
        }

        backend => Err(DbError::Config {
            message: format!(
                "Unknown or disabled backend: '{}'. Available backends: {}",
                backend,
                available_backends().join(", ")
            ),
        }),
    }
}

/// Delete the collection directory described by `config`.
///
/// Returns `true` if something was removed.
pub fn drop_vector_index(config: &VectorIndexConfig) -> DbResult<bool> {
    let dir = config.collection_path();
    if !dir.exists() {
        return Ok(false);
    }

    info!("Dropping vector collection at {:?}", dir);
    std::fs::remove_dir_all(&dir).map_err(|e| {
        DbError::vector_io(&dir, format!("Failed to remove collection: {}", e))
    })?;
    Ok(true)
}

/// Get a list of available backend names.
#[allow(clippy::vec_init_then_push)]
pub fn available_backends() -> Vec<&'static str> {
    let mut backends = Vec::new();

    #[cfg(feature = "lancedb")]
    backends.push("lancedb");

    #[cfg(feature = "simple")]
    backends.push("simple");

    backends
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::{load_index_meta, VectorInsert};
    use tempfile::TempDir;

    #[test]
    fn test_available_backends() {
        let backends = available_backends();
        assert!(!backends.is_empty() || cfg!(not(any(feature = "lancedb", feature = "simple"))));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let temp = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(4, temp.path()).with_backend("faiss");
        let err = open_vector_index(&config).err().unwrap();
        assert!(err.to_string().contains("faiss"));
    }

    #[cfg(feature = "simple")]
    #[test]
    fn test_open_creates_meta_and_reuses() {
        let temp = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(2, temp.path())
            .with_backend("simple")
            .with_model_id("test-model");

        let index = open_vector_index(&config).unwrap();
        index
            .upsert(&[VectorInsert::new(1i64, vec![1.0, 0.0])])
            .unwrap();
        drop(index);

        let meta = load_index_meta(&config.collection_path()).unwrap();
        assert_eq!(meta.collection, "movies");
        assert_eq!(meta.model_id.as_deref(), Some("test-model"));

        let reopened = open_vector_index(&config).unwrap();
        assert_eq!(reopened.len().unwrap(), 1);
    }

    #[cfg(feature = "simple")]
    #[test]
    fn test_model_mismatch_is_incompatible() {
        let temp = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(2, temp.path())
            .with_backend("simple")
            .with_model_id("model-a");
        open_vector_index(&config).unwrap();

        let err = open_vector_index(&config.clone().with_model_id("model-b"))
            .err()
            .unwrap();
        assert!(matches!(err, DbError::IndexIncompatible { .. }));
    }

    #[cfg(feature = "simple")]
    #[test]
    fn test_missing_without_create() {
        let temp = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(2, temp.path())
            .with_backend("simple")
            .with_create_if_missing(false);
        assert!(matches!(
            open_vector_index(&config).err().unwrap(),
            DbError::IndexNotFound { .. }
        ));
    }

    #[cfg(feature = "simple")]
    #[test]
    fn test_drop_vector_index() {
        let temp = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(2, temp.path()).with_backend("simple");
        open_vector_index(&config).unwrap();

        assert!(drop_vector_index(&config).unwrap());
        assert!(!config.collection_path().exists());
        assert!(!drop_vector_index(&config).unwrap());
    }
}
