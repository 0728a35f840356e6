//! Mirrors record store mutations into the vector collection.
//!
//! Every call is best-effort: failures are logged and swallowed, and the
//! record store change that triggered the call stands. A full
//! [`reindex`](crate::engine::CatalogEngine::reindex) repairs any drift.

use std::sync::Arc;

use tracing::{debug, error};

use crate::collection::{IndexHandle, LazyCollection};
use crate::types::{IndexWrite, MovieFields};

/// Writes index entries in lockstep with record mutations.
#[derive(Debug, Clone)]
pub struct Indexer {
    collection: Arc<LazyCollection>,
}

impl Indexer {
    /// Create an indexer over the shared collection handle.
    pub fn new(collection: Arc<LazyCollection>) -> Self {
        Self { collection }
    }

    /// Write (or replace) the entry for a created or updated movie.
    pub fn upsert(&self, id: i64, fields: &MovieFields) -> IndexWrite {
        match self.collection.get() {
            IndexHandle::Ready(collection) => match collection.upsert(id, fields) {
                Ok(()) => {
                    debug!("Indexed movie {}", id);
                    IndexWrite::Applied
                }
                Err(e) => {
                    error!("Error indexing movie {}: {}", id, e);
                    IndexWrite::Failed
                }
            },
            IndexHandle::Unavailable { .. } => IndexWrite::Skipped,
        }
    }

    /// Remove the entry for a deleted movie.
    pub fn remove(&self, id: i64) -> IndexWrite {
        match self.collection.get() {
            IndexHandle::Ready(collection) => match collection.remove(id) {
                Ok(()) => {
                    debug!("Removed movie {} from index", id);
                    IndexWrite::Applied
                }
                Err(e) => {
                    error!("Error deleting movie {} from index: {}", id, e);
                    IndexWrite::Failed
                }
            },
            IndexHandle::Unavailable { .. } => IndexWrite::Skipped,
        }
    }

    /// Remove every entry after the record table was emptied.
    pub fn clear(&self) -> IndexWrite {
        match self.collection.get() {
            IndexHandle::Ready(collection) => match collection.clear() {
                Ok(()) => {
                    debug!("Cleared collection '{}'", collection.name());
                    IndexWrite::Applied
                }
                Err(e) => {
                    error!("Error clearing collection '{}': {}", collection.name(), e);
                    IndexWrite::Failed
                }
            },
            IndexHandle::Unavailable { .. } => IndexWrite::Skipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::MovieCollection;
    use crate::testing::{test_config, BagOfWordsEmbedder, FailingEmbedder, TEST_DIMENSION};
    use tempfile::TempDir;

    fn indexer_with(temp: &TempDir, model: Arc<dyn cinedex_model::EmbeddingModel>) -> Indexer {
        let config = test_config(temp.path());
        Indexer::new(Arc::new(LazyCollection::new(move || {
            MovieCollection::open(&config, Arc::clone(&model))
        })))
    }

    #[test]
    fn test_upsert_then_remove() {
        let temp = TempDir::new().unwrap();
        let indexer = indexer_with(&temp, Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION)));

        assert_eq!(
            indexer.upsert(5, &MovieFields::new("Heat", "1995")),
            IndexWrite::Applied
        );
        let collection = indexer.collection.get().ready().unwrap().clone();
        assert!(collection.entry(5).unwrap().is_some());

        assert_eq!(indexer.remove(5), IndexWrite::Applied);
        assert!(collection.entry(5).unwrap().is_none());
        assert_eq!(indexer.remove(5), IndexWrite::Applied);
    }

    #[test]
    fn test_failures_are_swallowed() {
        let temp = TempDir::new().unwrap();
        let indexer = indexer_with(&temp, Arc::new(FailingEmbedder::new(TEST_DIMENSION)));

        assert_eq!(
            indexer.upsert(1, &MovieFields::new("Heat", "1995")),
            IndexWrite::Failed
        );
    }

    #[test]
    fn test_unavailable_collection_is_skipped() {
        let indexer = Indexer::new(Arc::new(LazyCollection::unavailable("off")));

        assert_eq!(
            indexer.upsert(1, &MovieFields::new("Heat", "1995")),
            IndexWrite::Skipped
        );
        assert_eq!(indexer.remove(1), IndexWrite::Skipped);
        assert_eq!(indexer.clear(), IndexWrite::Skipped);
    }

    #[test]
    fn test_clear() {
        let temp = TempDir::new().unwrap();
        let indexer = indexer_with(&temp, Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION)));
        indexer.upsert(1, &MovieFields::new("Heat", "1995"));
        indexer.upsert(2, &MovieFields::new("Alien", "1979"));

        assert_eq!(indexer.clear(), IndexWrite::Applied);
        let collection = indexer.collection.get().ready().unwrap().clone();
        assert!(collection.is_empty().unwrap());
    }
}
