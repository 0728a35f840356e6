//! Rebuild job for the movie collection.
//!
//! Rebuilding empties the collection and re-embeds every movie in the record
//! store. It is the repair path for drift between the two stores (failed
//! index writes, rows changed outside the catalog) and for a collection built
//! with another embedding model. Running it twice leaves the same entries.
//!
//! ## Performance
//!
//! - **Batched embeddings**: movies are embedded `batch_size` at a time.
//! - **Warm-up**: a dummy embedding runs before the first batch.
//!
//! ## Error Handling
//!
//! When a batch fails, its movies are retried one by one. Movies that still
//! fail are skipped and reported in [`ReindexReport::errors`] rather than
//! aborting the rebuild.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::collection::MovieCollection;
use crate::errors::CatalogError;
use crate::types::Movie;

/// Summary of a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReindexReport {
    /// Collection that was rebuilt.
    pub collection: String,

    /// Vector backend.
    pub backend: String,

    /// Embedding model the entries were built with.
    pub model_id: String,

    /// Movies read from the record store.
    pub records_total: usize,

    /// Movies written to the collection.
    pub records_indexed: usize,

    /// Number of embedding batches.
    pub batches: usize,

    /// True when an incompatible collection was dropped and created anew.
    pub recreated: bool,

    /// When the rebuild started.
    pub started_at: DateTime<Utc>,

    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,

    /// Movies that could not be embedded or written.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ReindexReport {
    /// Whether every movie made it into the collection.
    pub fn is_complete(&self) -> bool {
        self.records_indexed == self.records_total
    }
}

/// Empty `collection` and re-embed `movies` into it.
///
/// # Errors
///
/// Returns [`CatalogError::ReindexIndexError`] when the collection cannot be
/// cleared or its metadata cannot be written. Per-movie failures are
/// reported in the result instead.
pub fn rebuild_collection(
    collection: &MovieCollection,
    movies: &[Movie],
    batch_size: usize,
) -> Result<ReindexReport, CatalogError> {
    let started_at = Utc::now();
    let timer = Instant::now();
    let index_error = |e: CatalogError| CatalogError::ReindexIndexError {
        collection: collection.name().to_string(),
        reason: e.to_string(),
    };

    tracing::info!(
        "Rebuilding collection '{}' from {} movies",
        collection.name(),
        movies.len()
    );

    collection.clear().map_err(index_error)?;

    if !movies.is_empty() {
        if let Err(e) = collection.warm_up() {
            tracing::warn!("Embedding warm-up failed (non-fatal): {}", e);
        }
    }

    let mut errors = Vec::new();
    let mut records_indexed = 0;
    let mut batches = 0;

    for chunk in movies.chunks(batch_size.max(1)) {
        batches += 1;
        match collection.upsert_batch(chunk) {
            Ok(()) => records_indexed += chunk.len(),
            Err(batch_err) => {
                tracing::debug!("Batch {} failed, retrying one by one: {}", batches, batch_err);
                for movie in chunk {
                    match collection.upsert(movie.id, &movie.fields) {
                        Ok(()) => records_indexed += 1,
                        Err(e) => errors.push(format!("Movie {}: {}", movie.id, e)),
                    }
                }
            }
        }
    }

    collection.write_meta().map_err(index_error)?;

    let report = ReindexReport {
        collection: collection.name().to_string(),
        backend: collection.backend().to_string(),
        model_id: collection.model_id().to_string(),
        records_total: movies.len(),
        records_indexed,
        batches,
        recreated: false,
        started_at,
        duration_ms: timer.elapsed().as_millis() as u64,
        errors,
    };

    tracing::info!(
        "Rebuilt collection '{}': {}/{} movies in {} ms",
        report.collection,
        report.records_indexed,
        report.records_total,
        report.duration_ms
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canonical::canonical_text;
    use crate::testing::{test_config, BagOfWordsEmbedder, FailingEmbedder, TEST_DIMENSION};
    use crate::types::MovieFields;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn movies(n: i64) -> Vec<Movie> {
        (1..=n)
            .map(|id| Movie {
                id,
                fields: MovieFields::new(format!("Movie {}", id), "2001"),
            })
            .collect()
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let temp = TempDir::new().unwrap();
        let collection = MovieCollection::open(
            &test_config(temp.path()),
            Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION)),
        )
        .unwrap();
        collection.upsert(99, &MovieFields::new("Orphan", "1900")).unwrap();

        let all = movies(5);
        let report = rebuild_collection(&collection, &all, 2).unwrap();

        assert_eq!(report.records_total, 5);
        assert_eq!(report.records_indexed, 5);
        assert_eq!(report.batches, 3);
        assert!(report.is_complete());
        assert_eq!(collection.len().unwrap(), 5);
        assert!(collection.entry(99).unwrap().is_none());
        assert_eq!(
            collection.entry(3).unwrap().unwrap().document,
            canonical_text(&all[2].fields)
        );
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let collection = MovieCollection::open(
            &test_config(temp.path()),
            Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION)),
        )
        .unwrap();

        let all = movies(3);
        rebuild_collection(&collection, &all, 32).unwrap();
        let first = collection.entry(2).unwrap().unwrap();
        rebuild_collection(&collection, &all, 32).unwrap();
        let second = collection.entry(2).unwrap().unwrap();

        assert_eq!(collection.len().unwrap(), 3);
        assert_eq!(first.vector, second.vector);
        assert_eq!(first.document, second.document);
    }

    #[test]
    fn test_rebuild_empty_catalog() {
        let temp = TempDir::new().unwrap();
        let collection = MovieCollection::open(
            &test_config(temp.path()),
            Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION)),
        )
        .unwrap();

        let report = rebuild_collection(&collection, &[], 32).unwrap();
        assert_eq!(report.records_total, 0);
        assert_eq!(report.batches, 0);
        assert!(collection.is_empty().unwrap());
    }

    #[test]
    fn test_rebuild_collects_embedding_errors() {
        let temp = TempDir::new().unwrap();
        let collection = MovieCollection::open(
            &test_config(temp.path()),
            Arc::new(FailingEmbedder::new(TEST_DIMENSION)),
        )
        .unwrap();

        let report = rebuild_collection(&collection, &movies(2), 32).unwrap();
        assert_eq!(report.records_indexed, 0);
        assert_eq!(report.errors.len(), 2);
        assert!(report.errors[0].starts_with("Movie 1:"));
        assert!(!report.is_complete());
    }
}
