//! The movie collection in the vector index, and its lazily opened handle.
//!
//! ## Key Types
//!
//! - [`MovieCollection`] - an open vector collection bound to one embedding model
//! - [`IndexHandle`] - either a ready collection or the reason it is unavailable
//! - [`LazyCollection`] - process-wide handle, opened on first use and kept once open
//!
//! A collection that cannot be opened (semantic search switched off, model
//! missing, index built with another model, backend failure) resolves to
//! [`IndexHandle::Unavailable`]. Callers degrade gracefully instead of failing,
//! and the next use tries to open it again.

use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use cinedex_db::vector::{
    open_vector_index, write_index_meta, VectorEntry, VectorId, VectorIndexBackend,
    VectorIndexConfig, VectorIndexMeta, VectorInsert, VectorMetric, VectorSearchResult,
};
use cinedex_model::EmbeddingModel;

use crate::canonical::{canonical_text, entry_metadata};
use crate::config::CatalogConfig;
use crate::db_adapter::IntoCatalogResult;
use crate::errors::{CatalogError, CatalogResult};
use crate::model_adapter::IntoCatalogModelResult;
use crate::types::{Movie, MovieFields};

// ============================================================================
// MovieCollection
// ============================================================================

/// An open vector collection plus the model that embeds its documents.
///
/// The same model embeds stored documents and queries.
pub struct MovieCollection {
    config: VectorIndexConfig,
    index: Arc<dyn VectorIndexBackend>,
    model: Arc<dyn EmbeddingModel>,
}

impl fmt::Debug for MovieCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MovieCollection")
            .field("collection", &self.config.collection)
            .field("backend", &self.config.backend)
            .field("model_id", &self.model.model_id())
            .field("dimension", &self.config.dimension)
            .finish()
    }
}

impl MovieCollection {
    /// Open (or create) the configured collection for `model`.
    ///
    /// An existing collection is reused when it was built with the same
    /// model, dimension, metric and backend.
    pub fn open(config: &CatalogConfig, model: Arc<dyn EmbeddingModel>) -> CatalogResult<Self> {
        let index_config = index_config_for(config, model.as_ref());
        let index = open_vector_index(&index_config).map_err(|e| match e {
            cinedex_db::DbError::DimensionMismatch { expected, actual } => {
                CatalogError::VectorIndexIncompatible {
                    collection: index_config.collection.clone(),
                    reason: format!(
                        "index holds {}-dimensional vectors, model produces {}",
                        actual, expected
                    ),
                }
            }
            other => crate::db_adapter::from_db_error(other),
        })?;

        tracing::info!(
            "Opened collection '{}' ({} backend, model '{}')",
            index_config.collection,
            index_config.backend,
            model.model_id()
        );

        Ok(Self {
            config: index_config,
            index,
            model,
        })
    }

    /// Collection name.
    pub fn name(&self) -> &str {
        &self.config.collection
    }

    /// Backend name.
    pub fn backend(&self) -> &str {
        &self.config.backend
    }

    /// Model bound to this collection.
    pub fn model_id(&self) -> &str {
        self.model.model_id()
    }

    /// Distance metric of the index.
    pub fn metric(&self) -> VectorMetric {
        self.index.metric()
    }

    /// The vector index configuration this collection was opened with.
    pub fn index_config(&self) -> &VectorIndexConfig {
        &self.config
    }

    /// Embed and write the entry for one movie, replacing any existing entry.
    pub fn upsert(&self, id: i64, fields: &MovieFields) -> CatalogResult<()> {
        let document = canonical_text(fields);
        let vector = self.model.embed_one(&document).into_catalog_result()?;
        let insert = VectorInsert::new(id, vector)
            .with_document(document)
            .with_metadata(entry_metadata(id, fields));
        self.index.upsert(&[insert]).into_catalog_result()?;
        self.index.flush().into_catalog_result()
    }

    /// Embed and write entries for many movies with one model call.
    pub fn upsert_batch(&self, movies: &[Movie]) -> CatalogResult<()> {
        if movies.is_empty() {
            return Ok(());
        }

        let documents: Vec<String> = movies.iter().map(|m| canonical_text(&m.fields)).collect();
        let vectors = self.model.embed_batch(&documents).into_catalog_result()?;
        if vectors.len() != movies.len() {
            return Err(CatalogError::EmbeddingProviderUnavailable {
                provider: self.model_id().to_string(),
                reason: format!(
                    "returned {} vectors for {} documents",
                    vectors.len(),
                    movies.len()
                ),
            });
        }

        let inserts: Vec<VectorInsert> = movies
            .iter()
            .zip(documents)
            .zip(vectors)
            .map(|((movie, document), vector)| {
                VectorInsert::new(movie.id, vector)
                    .with_document(document)
                    .with_metadata(entry_metadata(movie.id, &movie.fields))
            })
            .collect();
        self.index.upsert(&inserts).into_catalog_result()
    }

    /// Delete the entry for `id`. Absent entries are ignored.
    pub fn remove(&self, id: i64) -> CatalogResult<()> {
        self.index.delete(&[VectorId::from(id)]).into_catalog_result()?;
        self.index.flush().into_catalog_result()
    }

    /// Delete every entry, keeping the collection.
    pub fn clear(&self) -> CatalogResult<()> {
        self.index.clear().into_catalog_result()?;
        self.index.flush().into_catalog_result()
    }

    /// Nearest entries to `text`, nearest first.
    pub fn query(&self, text: &str, limit: usize) -> CatalogResult<Vec<VectorSearchResult>> {
        let vector = self.model.embed_one(text).into_catalog_result()?;
        self.index.query(&vector, limit).into_catalog_result()
    }

    /// Run a dummy embedding so model start-up cost is paid once.
    pub fn warm_up(&self) -> CatalogResult<()> {
        self.model.warm_up().into_catalog_result()
    }

    /// Convert an index distance into a similarity score.
    pub fn similarity(&self, distance: f32) -> f32 {
        self.metric().similarity_from_distance(distance)
    }

    /// Fetch the stored entry for `id`.
    pub fn entry(&self, id: i64) -> CatalogResult<Option<VectorEntry>> {
        self.index.get(&VectorId::from(id)).into_catalog_result()
    }

    /// Number of entries.
    pub fn len(&self) -> CatalogResult<usize> {
        self.index.len().into_catalog_result()
    }

    /// Whether the collection has no entries.
    pub fn is_empty(&self) -> CatalogResult<bool> {
        self.index.is_empty().into_catalog_result()
    }

    /// Flush and record the current entry count in `index.meta.json`.
    pub fn write_meta(&self) -> CatalogResult<()> {
        self.index.flush().into_catalog_result()?;
        let mut meta = VectorIndexMeta::from_config(&self.config);
        meta.update_count(self.len()?);
        write_index_meta(&self.config.collection_path(), &meta).into_catalog_result()
    }
}

/// Build the vector index config for `model` from the catalog config.
pub fn index_config_for(config: &CatalogConfig, model: &dyn EmbeddingModel) -> VectorIndexConfig {
    VectorIndexConfig::new(model.dimension(), config.resolved_index_path())
        .with_collection(config.semantic.collection.clone())
        .with_backend(config.semantic.backend.clone())
        .with_metric(config.semantic.metric)
        .with_model_id(model.model_id())
}

// ============================================================================
// IndexHandle
// ============================================================================

/// The resolved state of the shared collection handle.
#[derive(Debug, Clone)]
pub enum IndexHandle {
    /// The collection is open.
    Ready(Arc<MovieCollection>),
    /// The collection could not be opened; semantic features degrade.
    Unavailable { reason: String },
}

impl IndexHandle {
    /// The collection, if ready.
    pub fn ready(&self) -> Option<&Arc<MovieCollection>> {
        match self {
            IndexHandle::Ready(collection) => Some(collection),
            IndexHandle::Unavailable { .. } => None,
        }
    }

    /// Why the collection is unavailable, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match self {
            IndexHandle::Ready(_) => None,
            IndexHandle::Unavailable { reason } => Some(reason),
        }
    }
}

// ============================================================================
// LazyCollection
// ============================================================================

/// Constructor run until the collection opens.
pub type CollectionInit = Box<dyn Fn() -> CatalogResult<MovieCollection> + Send + Sync>;

/// A lazily opened, shareable handle to the movie collection.
///
/// [`get`](Self::get) runs the constructor until it succeeds. Concurrent
/// callers are serialized while it runs, and once a collection is open every
/// caller shares it. A failed construction is logged and reported as
/// [`IndexHandle::Unavailable`], and the next call tries again. A handle
/// built with [`unavailable`](Self::unavailable) never constructs anything.
pub struct LazyCollection {
    source: Source,
    ready: OnceLock<Arc<MovieCollection>>,
    init_lock: Mutex<()>,
}

enum Source {
    Open(CollectionInit),
    Disabled(String),
}

impl fmt::Debug for LazyCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCollection")
            .field("ready", &self.ready.get().is_some())
            .field("disabled", &self.disabled_reason())
            .finish()
    }
}

impl LazyCollection {
    /// Handle that runs `init` on first use, and again after each failure.
    pub fn new<F>(init: F) -> Self
    where
        F: Fn() -> CatalogResult<MovieCollection> + Send + Sync + 'static,
    {
        Self {
            source: Source::Open(Box::new(init)),
            ready: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Handle that is permanently unavailable, e.g. when semantic search is off.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            source: Source::Disabled(reason.into()),
            ready: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    /// Resolve the handle, opening the collection if it is not open yet.
    pub fn get(&self) -> IndexHandle {
        let init = match &self.source {
            Source::Open(init) => init,
            Source::Disabled(reason) => {
                return IndexHandle::Unavailable {
                    reason: reason.clone(),
                }
            }
        };
        if let Some(collection) = self.ready.get() {
            return IndexHandle::Ready(Arc::clone(collection));
        }

        let _guard = self.init_lock.lock().unwrap_or_else(|e| e.into_inner());
        // Another caller may have opened it while we waited.
        if let Some(collection) = self.ready.get() {
            return IndexHandle::Ready(Arc::clone(collection));
        }

        match init() {
            Ok(collection) => {
                let collection = Arc::clone(self.ready.get_or_init(|| Arc::new(collection)));
                IndexHandle::Ready(collection)
            }
            Err(e) => {
                tracing::warn!("Semantic index unavailable: {}", e);
                IndexHandle::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Serve `collection` from now on, unless one is already open.
    ///
    /// Returns the collection the handle ends up holding. Has no effect on a
    /// permanently unavailable handle.
    pub fn install(&self, collection: MovieCollection) -> IndexHandle {
        if let Source::Disabled(reason) = &self.source {
            return IndexHandle::Unavailable {
                reason: reason.clone(),
            };
        }
        let _guard = self.init_lock.lock().unwrap_or_else(|e| e.into_inner());
        IndexHandle::Ready(Arc::clone(self.ready.get_or_init(|| Arc::new(collection))))
    }

    /// Whether the collection is open.
    pub fn is_ready(&self) -> bool {
        self.ready.get().is_some()
    }

    /// Why the handle is permanently unavailable, if it is.
    pub fn disabled_reason(&self) -> Option<&str> {
        match &self.source {
            Source::Open(_) => None,
            Source::Disabled(reason) => Some(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_config, BagOfWordsEmbedder, TEST_DIMENSION};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn open(temp: &TempDir) -> MovieCollection {
        MovieCollection::open(
            &test_config(temp.path()),
            Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION)),
        )
        .unwrap()
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let collection = open(&temp);
        let fields = MovieFields::new("Heat", "1995").with_director("Michael Mann");

        collection.upsert(1, &fields).unwrap();
        let first = collection.entry(1).unwrap().unwrap();
        collection.upsert(1, &fields).unwrap();
        let second = collection.entry(1).unwrap().unwrap();

        assert_eq!(collection.len().unwrap(), 1);
        assert_eq!(first.document, second.document);
        assert_eq!(first.vector, second.vector);
        assert_eq!(first.document, canonical_text(&fields));
        assert_eq!(second.metadata["director"], "Michael Mann");
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let temp = TempDir::new().unwrap();
        let collection = open(&temp);
        collection.remove(99).unwrap();
        assert!(collection.is_empty().unwrap());
    }

    #[test]
    fn test_query_nearest_first() {
        let temp = TempDir::new().unwrap();
        let collection = open(&temp);
        collection
            .upsert(1, &MovieFields::new("Alien", "1979").with_description("space horror"))
            .unwrap();
        collection
            .upsert(2, &MovieFields::new("Heat", "1995").with_description("bank heist crime"))
            .unwrap();

        let hits = collection.query("heist crime", 10).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id.as_record_id(), Some(2));
        assert!(hits[0].distance <= hits[1].distance);
    }

    #[test]
    fn test_reopen_with_other_model_is_incompatible() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        drop(open(&temp));

        let other = Arc::new(BagOfWordsEmbedder::with_model_id(
            "test/other-model",
            TEST_DIMENSION,
        ));
        let err = MovieCollection::open(&config, other).unwrap_err();
        assert!(matches!(err, CatalogError::VectorIndexIncompatible { .. }));
        assert!(err.to_string().contains("cinedex reindex"));
    }

    #[test]
    fn test_reopen_with_other_dimension_is_incompatible() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        drop(open(&temp));

        let err = MovieCollection::open(&config, Arc::new(BagOfWordsEmbedder::new(8))).unwrap_err();
        assert!(matches!(err, CatalogError::VectorIndexIncompatible { .. }));
    }

    #[test]
    fn test_lazy_collection_initializes_once() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let lazy = LazyCollection::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            MovieCollection::open(&config, Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION)))
        });

        assert!(!lazy.is_ready());
        assert!(lazy.get().ready().is_some());
        assert!(lazy.get().ready().is_some());
        assert!(lazy.is_ready());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lazy_collection_retries_after_failure() {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let lazy = LazyCollection::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(CatalogError::VectorIndexBackendUnavailable {
                    backend: "simple".to_string(),
                    reason: "backend temporarily down".to_string(),
                });
            }
            MovieCollection::open(&config, Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION)))
        });

        let reason = lazy.get().unavailable_reason().unwrap().to_string();
        assert!(reason.contains("backend temporarily down"));
        assert!(!lazy.is_ready());

        assert!(lazy.get().ready().is_some());
        assert!(lazy.get().ready().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_lazy_collection_keeps_failing_while_init_fails() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let lazy = LazyCollection::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(CatalogError::VectorIndexBackendUnavailable {
                backend: "lancedb".to_string(),
                reason: "connection refused".to_string(),
            })
        });

        for _ in 0..3 {
            let reason = lazy.get().unavailable_reason().unwrap().to_string();
            assert!(reason.contains("connection refused"));
        }
        assert!(!lazy.is_ready());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_unavailable_handle() {
        let lazy = LazyCollection::unavailable("Semantic search is disabled");
        assert_eq!(lazy.disabled_reason(), Some("Semantic search is disabled"));
        assert_eq!(
            lazy.get().unavailable_reason(),
            Some("Semantic search is disabled")
        );

        let temp = TempDir::new().unwrap();
        assert!(lazy.install(open(&temp)).ready().is_none());
        assert!(!lazy.is_ready());
    }

    #[test]
    fn test_install_serves_collection() {
        let temp = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let lazy = LazyCollection::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(CatalogError::VectorIndexBackendUnavailable {
                backend: "simple".to_string(),
                reason: "not yet".to_string(),
            })
        });

        assert!(lazy.get().ready().is_none());
        let installed = lazy.install(open(&temp));
        assert_eq!(installed.ready().unwrap().model_id(), "test/bag-of-words");
        assert!(lazy.get().ready().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_write_meta_records_count() {
        let temp = TempDir::new().unwrap();
        let collection = open(&temp);
        collection.upsert(1, &MovieFields::new("Heat", "1995")).unwrap();
        collection.write_meta().unwrap();

        let meta =
            cinedex_db::vector::load_index_meta(&collection.index_config().collection_path())
                .unwrap();
        assert_eq!(meta.count, 1);
        assert_eq!(meta.model_id.as_deref(), Some("test/bag-of-words"));
    }
}
