//! Query fan-out: semantic search against the vector collection with
//! hydration from the record store, and literal text search against the
//! record store alone.

use cinedex_db::record::SqliteRecordStore;
use tracing::{debug, warn};

use crate::collection::{IndexHandle, MovieCollection};
use crate::db_adapter::IntoCatalogResult;
use crate::errors::CatalogResult;
use crate::types::{Movie, ScoredMovie, SemanticSearchOutcome, SEMANTIC_RESULT_CAP, TEXT_RESULT_CAP};

/// Run a semantic search.
///
/// An unavailable collection yields [`SemanticSearchOutcome::Disabled`]; any
/// failure while embedding, querying or hydrating yields
/// [`SemanticSearchOutcome::Failed`]. Neither is an error.
///
/// `open_store` is only called once the collection is known to be ready.
pub fn semantic_search<F>(handle: &IndexHandle, open_store: F, query: &str) -> SemanticSearchOutcome
where
    F: FnOnce() -> CatalogResult<SqliteRecordStore>,
{
    let collection = match handle {
        IndexHandle::Ready(collection) => collection,
        IndexHandle::Unavailable { reason } => {
            return SemanticSearchOutcome::Disabled {
                reason: reason.clone(),
            }
        }
    };

    match open_store().and_then(|store| nearest_movies(collection, &store, query)) {
        Ok(results) => SemanticSearchOutcome::Results(results),
        Err(e) => {
            warn!("Semantic search for {:?} failed: {}", query, e);
            SemanticSearchOutcome::Failed {
                error: e.to_string(),
            }
        }
    }
}

/// Query the collection and join each hit against the record store.
///
/// Hits whose id has no row (or is not a record id) are skipped; the order
/// of the remaining hits is the index order, nearest first.
pub fn nearest_movies(
    collection: &MovieCollection,
    store: &SqliteRecordStore,
    query: &str,
) -> CatalogResult<Vec<ScoredMovie>> {
    let hits = collection.query(query, SEMANTIC_RESULT_CAP)?;
    let mut results = Vec::with_capacity(hits.len());

    for hit in hits {
        let Some(id) = hit.id.as_record_id() else {
            debug!("Skipping index entry with non-numeric id {:?}", hit.id.as_str());
            continue;
        };

        match store.get(id).into_catalog_result()? {
            Some(row) => results.push(ScoredMovie {
                movie: Movie::from(row),
                similarity: collection.similarity(hit.distance),
            }),
            None => debug!("Skipping stale index entry for movie {}", id),
        }
    }

    Ok(results)
}

/// Substring search over title, director, actors and description.
///
/// Never touches the vector collection.
pub fn text_search(store: &SqliteRecordStore, query: &str) -> CatalogResult<Vec<Movie>> {
    let rows = store.search_text(query, TEXT_RESULT_CAP).into_catalog_result()?;
    Ok(rows.into_iter().map(Movie::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::LazyCollection;
    use crate::db_adapter::to_columns;
    use crate::errors::CatalogError;
    use crate::testing::{test_config, BagOfWordsEmbedder, FailingEmbedder, TEST_DIMENSION};
    use crate::types::MovieFields;
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Fixture {
        _temp: TempDir,
        store: SqliteRecordStore,
        collection: Arc<MovieCollection>,
    }

    fn fixture(model: Arc<dyn cinedex_model::EmbeddingModel>) -> Fixture {
        let temp = TempDir::new().unwrap();
        let config = test_config(temp.path());
        let store = SqliteRecordStore::open(config.resolved_database_path()).unwrap();
        let collection = Arc::new(MovieCollection::open(&config, model).unwrap());
        Fixture {
            _temp: temp,
            store,
            collection,
        }
    }

    fn add(fx: &Fixture, fields: MovieFields) -> i64 {
        let id = fx.store.insert(&to_columns(&fields)).unwrap();
        fx.collection.upsert(id, &fields).unwrap();
        id
    }

    #[test]
    fn test_hits_are_hydrated_nearest_first() {
        let fx = fixture(Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION)));
        let alien = add(&fx, MovieFields::new("Alien", "1979").with_description("space horror creature"));
        let heat = add(&fx, MovieFields::new("Heat", "1995").with_description("bank heist crime"));

        let results = nearest_movies(&fx.collection, &fx.store, "crime heist").unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].movie.id, heat);
        assert_eq!(results[1].movie.id, alien);
        assert!(results[0].similarity >= results[1].similarity);
        assert_eq!(results[0].movie.fields.year, "1995");
    }

    #[test]
    fn test_similarity_is_one_minus_distance() {
        let fx = fixture(Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION)));
        let fields = MovieFields::new("Heat", "1995");
        add(&fx, fields.clone());

        let hits = fx.collection.query("Heat", 10).unwrap();
        let results = nearest_movies(&fx.collection, &fx.store, "Heat").unwrap();
        assert!((results[0].similarity - (1.0 - hits[0].distance)).abs() < 1e-6);
        assert!(results[0].similarity > 0.0 && results[0].similarity <= 1.0 + 1e-6);
    }

    #[test]
    fn test_stale_entries_never_surface() {
        let fx = fixture(Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION)));
        let kept = add(&fx, MovieFields::new("Heat", "1995"));
        let gone = add(&fx, MovieFields::new("Heat 2", "2026"));

        // Row removed without going through the indexer.
        fx.store.delete(gone).unwrap();

        let results = nearest_movies(&fx.collection, &fx.store, "Heat").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].movie.id, kept);
    }

    #[test]
    fn test_result_cap() {
        let fx = fixture(Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION)));
        for i in 0..15 {
            add(&fx, MovieFields::new(format!("Movie {}", i), "2000"));
        }

        let results = nearest_movies(&fx.collection, &fx.store, "Movie").unwrap();
        assert_eq!(results.len(), SEMANTIC_RESULT_CAP);
    }

    #[test]
    fn test_unavailable_handle_is_disabled() {
        let lazy = LazyCollection::unavailable("Semantic search is disabled");
        let outcome = semantic_search(
            &lazy.get(),
            || panic!("store must not be opened"),
            "anything",
        );
        assert_eq!(
            outcome,
            SemanticSearchOutcome::Disabled {
                reason: "Semantic search is disabled".to_string()
            }
        );
    }

    #[test]
    fn test_embedding_failure_is_reported() {
        let fx = fixture(Arc::new(FailingEmbedder::new(TEST_DIMENSION)));
        let handle = IndexHandle::Ready(Arc::clone(&fx.collection));
        let path = fx.store.path().to_path_buf();

        let outcome = semantic_search(
            &handle,
            || SqliteRecordStore::open(&path).into_catalog_result(),
            "anything",
        );
        assert!(outcome.is_failed());
        assert!(outcome.results().is_empty());
    }

    #[test]
    fn test_store_failure_is_reported() {
        let fx = fixture(Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION)));
        let handle = IndexHandle::Ready(Arc::clone(&fx.collection));

        let outcome = semantic_search(
            &handle,
            || Err(CatalogError::RecordStoreQuery {
                reason: "disk I/O error".to_string(),
            }),
            "anything",
        );
        match outcome {
            SemanticSearchOutcome::Failed { error } => assert!(error.contains("disk I/O error")),
            other => panic!("Expected Failed, got {:?}", other),
        }
    }

    #[test]
    fn test_text_search() {
        let fx = fixture(Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION)));
        add(&fx, MovieFields::new("Inception", "2010").with_director("Christopher Nolan"));
        add(&fx, MovieFields::new("Alien", "1979").with_director("Ridley Scott"));

        let results = text_search(&fx.store, "Nolan").unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].fields.title, "Inception");

        // Year is not searched.
        assert!(text_search(&fx.store, "1979").unwrap().is_empty());
    }
}
