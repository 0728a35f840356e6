//! # cinedex-core
//!
//! Movie catalog engine: a SQLite record store kept in step with a vector
//! collection, with semantic and text search on top.
//!
//! The record store is authoritative. Every write lands there first and is
//! then mirrored into the collection by the [`Indexer`]; index failures are
//! logged, never surfaced. Semantic search joins index hits back against the
//! record store so stale entries never reach callers.
//!
//! ## Main Types
//!
//! - [`CatalogEngine`] – the entry point for all catalog operations
//! - [`CatalogConfig`] – data directory, semantic and embedding settings
//! - [`CatalogError`] – domain-specific error type
//!
//! ## Modules
//!
//! - [`collection`] – the movie collection and its lazily opened handle
//! - [`indexer`] – mirrors record changes into the collection
//! - [`search`] – semantic and text search
//! - [`reindex`] – rebuilds the collection from the record store
//! - [`status`] – record and index counts
//!
//! ## Example
//!
//! ```ignore
//! use cinedex_core::{CatalogEngine, MovieFields};
//!
//! let engine = CatalogEngine::with_defaults()?;
//! let id = engine.create(&MovieFields::new("Inception", "2010").with_director("Christopher Nolan"))?;
//!
//! for hit in engine.search_semantic("dream heist").results() {
//!     println!("{} ({:.2})", hit.movie.fields.title, hit.similarity);
//! }
//! ```

pub mod canonical;
pub mod collection;
pub mod config;
pub mod db_adapter;
pub mod engine;
pub mod errors;
pub mod indexer;
pub mod model_adapter;
pub mod reindex;
pub mod search;
pub mod status;
pub mod types;

#[cfg(test)]
mod testing;

pub use collection::{IndexHandle, LazyCollection, MovieCollection};
pub use config::{CatalogConfig, SemanticConfig, CINEDEX_DATA_DIR_ENV, CINEDEX_SEMANTIC_ENABLED_ENV};
pub use engine::{CatalogEngine, ModelLoader, SEMANTIC_DISABLED_REASON};
pub use errors::{CatalogError, CatalogResult};
pub use indexer::Indexer;
pub use reindex::ReindexReport;
pub use status::{IndexHealth, IndexStatus, StatusReport};
pub use types::{
    DeleteAllResult, IndexWrite, Movie, MovieFields, MutationOutcome, ScoredMovie,
    SemanticSearchOutcome, SEMANTIC_RESULT_CAP, TEXT_RESULT_CAP,
};

pub use cinedex_db::vector::VectorMetric;
pub use cinedex_model::EmbeddingConfig;
