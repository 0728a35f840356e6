//! Catalog engine – the orchestrator for all catalog operations.
//!
//! The [`CatalogEngine`] owns the configuration, the process-wide collection
//! handle and the indexer. Every operation opens its own record store
//! connection and closes it before returning.
//!
//! Writes go to the record store first; on success the indexer mirrors the
//! change into the vector collection. The two stores are not updated
//! atomically: an index failure is logged and the record change stands.
//! [`CatalogEngine::reindex`] is the repair path.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cinedex_db::record::SqliteRecordStore;
use cinedex_db::vector::drop_vector_index;
use cinedex_model::EmbeddingModel;

use crate::collection::{index_config_for, IndexHandle, LazyCollection, MovieCollection};
use crate::config::CatalogConfig;
use crate::db_adapter::{to_columns, IntoCatalogResult};
use crate::errors::{CatalogError, CatalogResult};
use crate::indexer::Indexer;
use crate::model_adapter::load_embedding_model;
use crate::reindex::{rebuild_collection, ReindexReport};
use crate::search::{semantic_search, text_search};
use crate::status::{health_for_counts, IndexHealth, IndexStatus, StatusReport};
use crate::types::{DeleteAllResult, Movie, MovieFields, MutationOutcome, SemanticSearchOutcome};

/// Reason reported while semantic search is switched off.
pub const SEMANTIC_DISABLED_REASON: &str = "Semantic search is disabled";

/// Produces the embedding model the collection is bound to.
pub type ModelLoader = Arc<dyn Fn() -> CatalogResult<Arc<dyn EmbeddingModel>> + Send + Sync>;

// ============================================================================
// CatalogEngine
// ============================================================================

/// The main engine for catalog operations.
///
/// # Construction
///
/// Use [`CatalogEngine::with_defaults`] or [`CatalogEngine::from_config`]
/// for typical usage, or [`CatalogEngine::with_model_loader`] to supply the
/// embedding model (tests, custom models).
///
/// # Example
///
/// ```ignore
/// use cinedex_core::{CatalogEngine, MovieFields};
///
/// let engine = CatalogEngine::with_defaults()?;
/// let id = engine.create(&MovieFields::new("Inception", "2010"))?;
/// let hits = engine.search_semantic("dream heist");
/// ```
pub struct CatalogEngine {
    config: CatalogConfig,
    database_path: PathBuf,
    model_loader: ModelLoader,
    collection: Arc<LazyCollection>,
    indexer: Indexer,
}

impl fmt::Debug for CatalogEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogEngine")
            .field("database_path", &self.database_path)
            .field("semantic_enabled", &self.config.semantic.enabled)
            .field("collection", &self.collection)
            .finish()
    }
}

impl CatalogEngine {
    // -------------------------------------------------------------------------
    // Construction
    // -------------------------------------------------------------------------

    /// Create an engine that loads the configured embedding model on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn from_config(config: CatalogConfig) -> anyhow::Result<Self> {
        let embedding = config.embedding.clone();
        let loader: ModelLoader = Arc::new(move || load_embedding_model(&embedding));
        Self::with_model_loader(config, loader)
    }

    /// Create an engine with configuration from `~/.cinedex/config.yaml`
    /// and environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading fails.
    pub fn with_defaults() -> anyhow::Result<Self> {
        let mut config = CatalogConfig::load_default()?;
        config.apply_env_overrides();
        Self::from_config(config)
    }

    /// Create an engine whose collection embeds with the model from `loader`.
    ///
    /// The loader runs lazily, when the collection is first needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_model_loader(config: CatalogConfig, loader: ModelLoader) -> anyhow::Result<Self> {
        for warning in config.validate()? {
            tracing::warn!("Config warning: {}", warning);
        }

        let database_path = config.resolved_database_path();
        let collection = if config.semantic.enabled {
            let collection_config = config.clone();
            let collection_loader = Arc::clone(&loader);
            LazyCollection::new(move || {
                let model = collection_loader()?;
                MovieCollection::open(&collection_config, model)
            })
        } else {
            tracing::debug!("Semantic search disabled by configuration");
            LazyCollection::unavailable(SEMANTIC_DISABLED_REASON)
        };
        let collection = Arc::new(collection);

        Ok(Self {
            indexer: Indexer::new(Arc::clone(&collection)),
            config,
            database_path,
            model_loader: loader,
            collection,
        })
    }

    /// The configuration this engine was built from.
    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Path of the SQLite database.
    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    /// Resolve the shared collection handle, opening it if it is not open yet.
    pub fn collection(&self) -> IndexHandle {
        self.collection.get()
    }

    /// Whether the collection has been opened.
    pub fn collection_ready(&self) -> bool {
        self.collection.is_ready()
    }

    fn open_store(&self) -> CatalogResult<SqliteRecordStore> {
        SqliteRecordStore::open(&self.database_path).into_catalog_result()
    }

    // -------------------------------------------------------------------------
    // Records
    // -------------------------------------------------------------------------

    /// All movies, in id order.
    pub fn list_all(&self) -> CatalogResult<Vec<Movie>> {
        let store = self.open_store()?;
        let rows = store.list_all().into_catalog_result()?;
        Ok(rows.into_iter().map(Movie::from).collect())
    }

    /// The movie with `id`, or `None` if there is no such row.
    pub fn get(&self, id: i64) -> CatalogResult<Option<Movie>> {
        let store = self.open_store()?;
        Ok(store.get(id).into_catalog_result()?.map(Movie::from))
    }

    /// Insert a movie and index it. Returns the store-assigned id.
    pub fn create(&self, fields: &MovieFields) -> CatalogResult<i64> {
        let id = {
            let store = self.open_store()?;
            store.insert(&to_columns(fields)).into_catalog_result()?
        };
        tracing::info!("Created movie {} ({:?})", id, fields.title);

        self.indexer.upsert(id, fields);
        Ok(id)
    }

    /// Replace every field of movie `id` and re-index it.
    pub fn replace(&self, id: i64, fields: &MovieFields) -> CatalogResult<MutationOutcome> {
        let outcome = {
            let store = self.open_store()?;
            MutationOutcome::from_affected(store.replace(id, &to_columns(fields)).into_catalog_result()?)
        };

        if outcome.is_applied() {
            tracing::info!("Updated movie {}", id);
            self.indexer.upsert(id, fields);
        }
        Ok(outcome)
    }

    /// Delete movie `id` and its index entry.
    pub fn delete(&self, id: i64) -> CatalogResult<MutationOutcome> {
        let outcome = {
            let store = self.open_store()?;
            MutationOutcome::from_affected(store.delete(id).into_catalog_result()?)
        };

        if outcome.is_applied() {
            tracing::info!("Deleted movie {}", id);
            self.indexer.remove(id);
        }
        Ok(outcome)
    }

    /// Delete every movie, then clear the collection.
    pub fn delete_all(&self) -> CatalogResult<DeleteAllResult> {
        let deleted = {
            let store = self.open_store()?;
            store.delete_all().into_catalog_result()?
        };
        tracing::info!("Deleted {} movies", deleted);

        Ok(DeleteAllResult {
            deleted,
            index: self.indexer.clear(),
        })
    }

    // -------------------------------------------------------------------------
    // Search
    // -------------------------------------------------------------------------

    /// Nearest movies to `query`, at most ten, nearest first.
    pub fn search_semantic(&self, query: &str) -> SemanticSearchOutcome {
        semantic_search(&self.collection.get(), || self.open_store(), query)
    }

    /// Movies whose title, director, actors or description contain `query`.
    pub fn search_text(&self, query: &str) -> CatalogResult<Vec<Movie>> {
        let store = self.open_store()?;
        text_search(&store, query)
    }

    // -------------------------------------------------------------------------
    // Maintenance
    // -------------------------------------------------------------------------

    /// Rebuild the collection from the record store.
    ///
    /// A ready collection is emptied and refilled in place. An unavailable
    /// one (for example, built with another model) is dropped and created
    /// anew, and this engine serves the new collection from then on.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::ReindexDisabled`] when semantic search is off,
    /// and an error when the records, the model or the collection cannot be
    /// reached.
    pub fn reindex(&self) -> CatalogResult<ReindexReport> {
        if !self.config.semantic.enabled {
            return Err(CatalogError::ReindexDisabled);
        }

        let movies = self.list_all()?;
        let batch_size = self.config.embedding.batch_size;

        match self.collection.get() {
            IndexHandle::Ready(collection) => rebuild_collection(&collection, &movies, batch_size),
            IndexHandle::Unavailable { reason } => {
                tracing::info!("Collection unavailable ({}); recreating it", reason);

                let model = (self.model_loader)()?;
                let index_config = index_config_for(&self.config, model.as_ref());
                if drop_vector_index(&index_config).into_catalog_result()? {
                    tracing::info!("Dropped collection '{}'", index_config.collection);
                }

                let collection = MovieCollection::open(&self.config, model)?;
                let mut report = rebuild_collection(&collection, &movies, batch_size)?;
                report.recreated = true;
                self.collection.install(collection);
                Ok(report)
            }
        }
    }

    /// Record count, index entry count and index availability.
    pub fn status(&self) -> CatalogResult<StatusReport> {
        let record_count = self.open_store()?.count().into_catalog_result()?;

        let mut index = IndexStatus {
            health: IndexHealth::Disabled,
            backend: self.config.semantic.backend.clone(),
            collection: self.config.semantic.collection.clone(),
            index_path: self.config.resolved_index_path(),
            model_id: self.config.embedding.model_id.clone(),
            metric: None,
            entry_count: None,
            reason: None,
        };

        if self.config.semantic.enabled {
            match self.collection.get() {
                IndexHandle::Ready(collection) => {
                    index.model_id = collection.model_id().to_string();
                    index.metric = Some(collection.metric().to_string());
                    match collection.len() {
                        Ok(entries) => {
                            index.health = health_for_counts(record_count, entries);
                            index.entry_count = Some(entries);
                        }
                        Err(e) => {
                            index.health = IndexHealth::Unavailable;
                            index.reason = Some(e.to_string());
                        }
                    }
                }
                IndexHandle::Unavailable { reason } => {
                    index.health = IndexHealth::Unavailable;
                    index.reason = Some(reason);
                }
            }
        } else {
            index.reason = Some(SEMANTIC_DISABLED_REASON.to_string());
        }

        Ok(StatusReport {
            database_path: self.database_path.clone(),
            record_count,
            index,
        })
    }
}

// ============================================================================
// Tests
// ============================================================================
