//! Simple file-based vector index backend.
//!
//! This backend stores entries in a JSONL file and uses linear scan for search.
//! It is intended for testing and small catalogs where the overhead of a full
//! vector database is not justified.

use super::super::config::VectorIndexConfig;
use super::super::metadata::EntryMetadata;
use super::super::traits::{
    VectorEntry, VectorId, VectorIndexBackend, VectorInsert, VectorMetric, VectorSearchResult,
};
use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use tracing::{debug, trace};

/// Filename for the JSONL data file.
const DATA_FILENAME: &str = "vectors.jsonl";

/// A stored entry, one per JSONL line.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredVector {
    id: String,
    vector: Vec<f32>,
    #[serde(default)]
    document: String,
    #[serde(default)]
    metadata: EntryMetadata,
}

impl From<&VectorInsert> for StoredVector {
    fn from(insert: &VectorInsert) -> Self {
        Self {
            id: insert.id.as_str().to_string(),
            vector: insert.vector.clone(),
            document: insert.document.clone(),
            metadata: insert.metadata.clone(),
        }
    }
}

impl From<&StoredVector> for VectorEntry {
    fn from(stored: &StoredVector) -> Self {
        Self {
            id: VectorId::new(stored.id.clone()),
            vector: stored.vector.clone(),
            document: stored.document.clone(),
            metadata: stored.metadata.clone(),
        }
    }
}

/// Simple file-based vector index.
///
/// Uses JSONL storage and linear scan for search. Every mutation rewrites the
/// data file while holding the write lock.
pub struct SimpleFileVectorIndex {
    /// Path to the collection directory.
    path: PathBuf,

    /// Dimension of vectors.
    dimension: usize,

    /// Distance metric.
    metric: VectorMetric,

    /// In-memory entry store, keyed by id.
    vectors: RwLock<BTreeMap<String, StoredVector>>,
}

impl SimpleFileVectorIndex {
    /// Open or create a simple file vector index.
    pub fn open(config: &VectorIndexConfig) -> DbResult<Self> {
        let path = config.collection_path();
        debug!("Opening SimpleFileVectorIndex at {:?}", path);

        std::fs::create_dir_all(&path)?;

        let index = Self {
            path: path.clone(),
            dimension: config.dimension,
            metric: config.metric,
            vectors: RwLock::new(BTreeMap::new()),
        };

        let data_path = path.join(DATA_FILENAME);
        if data_path.exists() {
            index.load_from_file(&data_path)?;
        }

        Ok(index)
    }

    /// Load entries from a JSONL file.
    fn load_from_file(&self, path: &Path) -> DbResult<()> {
        debug!("Loading vectors from {:?}", path);

        let file = File::open(path)?;
        let reader = BufReader::new(file);

        let mut vectors = self
            .vectors
            .write()
            .map_err(|e| DbError::internal(format!("Failed to acquire write lock: {}", e)))?;

        for (line_num, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<StoredVector>(&line) {
                Ok(stored) => {
                    vectors.insert(stored.id.clone(), stored);
                }
                Err(e) => {
                    debug!("Skipping invalid line {}: {}", line_num + 1, e);
                }
            }
        }

        debug!("Loaded {} vectors", vectors.len());
        Ok(())
    }

    /// Write all entries to the JSONL file.
    fn save_to_file(&self, vectors: &BTreeMap<String, StoredVector>) -> DbResult<()> {
        let data_path = self.path.join(DATA_FILENAME);
        debug!("Saving vectors to {:?}", data_path);

        let mut file = File::create(&data_path)
            .map_err(|e| DbError::vector_io(&data_path, e.to_string()))?;
        for stored in vectors.values() {
            let line = serde_json::to_string(stored)?;
            writeln!(file, "{}", line)?;
        }

        debug!("Saved {} vectors", vectors.len());
        Ok(())
    }

    /// Distance between two vectors under this index's metric.
    fn compute_distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self.metric {
            VectorMetric::Cosine => 1.0 - cosine_similarity(a, b),
            VectorMetric::Dot => 1.0 - dot_product(a, b),
            VectorMetric::L2 => squared_euclidean_distance(a, b),
        }
    }

    fn check_dimension(&self, len: usize) -> DbResult<()> {
        if len != self.dimension {
            return Err(DbError::DimensionMismatch {
                expected: self.dimension,
                actual: len,
            });
        }
        Ok(())
    }
}

impl VectorIndexBackend for SimpleFileVectorIndex {
    fn query(&self, embedding: &[f32], limit: usize) -> DbResult<Vec<VectorSearchResult>> {
        trace!("Querying SimpleFileVectorIndex, limit={}", limit);
        self.check_dimension(embedding.len())?;

        let vectors = self
            .vectors
            .read()
            .map_err(|e| DbError::internal(format!("Failed to acquire read lock: {}", e)))?;

        // BTreeMap iteration is id-ordered, so the stable sort breaks ties by id.
        let mut scored: Vec<(f32, &StoredVector)> = vectors
            .values()
            .map(|v| (self.compute_distance(embedding, &v.vector), v))
            .collect();

        scored.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let results: Vec<VectorSearchResult> = scored
            .into_iter()
            .take(limit)
            .map(|(distance, stored)| {
                VectorSearchResult::new(VectorId::new(stored.id.clone()), distance)
                    .with_document(stored.document.clone())
                    .with_metadata(stored.metadata.clone())
            })
            .collect();

        trace!("Found {} results", results.len());
        Ok(results)
    }

    fn upsert(&self, vectors: &[VectorInsert]) -> DbResult<()> {
        debug!("Upserting {} vectors", vectors.len());

        for insert in vectors {
            self.check_dimension(insert.vector.len())?;
        }

        let mut stored = self
            .vectors
            .write()
            .map_err(|e| DbError::internal(format!("Failed to acquire write lock: {}", e)))?;

        for insert in vectors {
            let entry = StoredVector::from(insert);
            stored.insert(entry.id.clone(), entry);
        }

        self.save_to_file(&stored)
    }

    fn delete(&self, ids: &[VectorId]) -> DbResult<()> {
        debug!("Deleting {} vectors", ids.len());

        let mut stored = self
            .vectors
            .write()
            .map_err(|e| DbError::internal(format!("Failed to acquire write lock: {}", e)))?;

        let before = stored.len();
        for id in ids {
            stored.remove(id.as_str());
        }

        if stored.len() == before {
            return Ok(());
        }
        self.save_to_file(&stored)
    }

    fn get(&self, id: &VectorId) -> DbResult<Option<VectorEntry>> {
        let stored = self
            .vectors
            .read()
            .map_err(|e| DbError::internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(stored.get(id.as_str()).map(VectorEntry::from))
    }

    fn clear(&self) -> DbResult<()> {
        let mut stored = self
            .vectors
            .write()
            .map_err(|e| DbError::internal(format!("Failed to acquire write lock: {}", e)))?;

        debug!("Clearing {} vectors", stored.len());
        stored.clear();
        self.save_to_file(&stored)
    }

    fn flush(&self) -> DbResult<()> {
        let stored = self
            .vectors
            .read()
            .map_err(|e| DbError::internal(format!("Failed to acquire read lock: {}", e)))?;
        self.save_to_file(&stored)
    }

    fn len(&self) -> DbResult<usize> {
        let stored = self
            .vectors
            .read()
            .map_err(|e| DbError::internal(format!("Failed to acquire read lock: {}", e)))?;
        Ok(stored.len())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn metric(&self) -> VectorMetric {
        self.metric
    }
}

// ============================================================================
// Similarity Functions
// ============================================================================

/// Compute cosine similarity between two vectors.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Compute dot product between two vectors.
fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Compute squared Euclidean (L2) distance between two vectors.
fn squared_euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_temp(metric: VectorMetric) -> (TempDir, SimpleFileVectorIndex) {
        let temp = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(3, temp.path())
            .with_backend("simple")
            .with_metric(metric);
        let index = SimpleFileVectorIndex::open(&config).unwrap();
        (temp, index)
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 1e-6);
    }

    #[test]
    fn test_dot_product() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 5.0, 6.0];
        assert!((dot_product(&a, &b) - 32.0).abs() < 1e-6);
    }

    #[test]
    fn test_squared_euclidean_distance() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![3.0, 4.0, 0.0];
        assert!((squared_euclidean_distance(&a, &b) - 25.0).abs() < 1e-6);
    }

    #[test]
    fn test_query_nearest_first() {
        let (_temp, index) = open_temp(VectorMetric::Cosine);
        index
            .upsert(&[
                VectorInsert::new(1i64, vec![0.0, 1.0, 0.0]),
                VectorInsert::new(2i64, vec![1.0, 0.0, 0.0]),
                VectorInsert::new(3i64, vec![0.7, 0.7, 0.0]),
            ])
            .unwrap();

        let results = index.query(&[1.0, 0.0, 0.0], 10).unwrap();
        let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "3", "1"]);
        assert!(results[0].distance.abs() < 1e-6);
        assert!(results.windows(2).all(|w| w[0].distance <= w[1].distance));

        let top = index.query(&[1.0, 0.0, 0.0], 1).unwrap();
        assert_eq!(top.len(), 1);
    }

    #[test]
    fn test_upsert_replaces_entry() {
        let (_temp, index) = open_temp(VectorMetric::Cosine);
        index
            .upsert(&[VectorInsert::new(5i64, vec![1.0, 0.0, 0.0]).with_document("old")])
            .unwrap();
        index
            .upsert(&[VectorInsert::new(5i64, vec![0.0, 1.0, 0.0]).with_document("new")])
            .unwrap();

        assert_eq!(index.len().unwrap(), 1);
        let entry = index.get(&VectorId::from(5i64)).unwrap().unwrap();
        assert_eq!(entry.document, "new");
        assert_eq!(entry.vector, vec![0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_dimension_checked() {
        let (_temp, index) = open_temp(VectorMetric::Cosine);
        let err = index
            .upsert(&[VectorInsert::new(1i64, vec![1.0, 0.0])])
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_delete_and_clear() {
        let (_temp, index) = open_temp(VectorMetric::L2);
        index
            .upsert(&[
                VectorInsert::new(1i64, vec![1.0, 0.0, 0.0]),
                VectorInsert::new(2i64, vec![0.0, 1.0, 0.0]),
            ])
            .unwrap();

        index.delete(&[VectorId::from(1i64), VectorId::from(99i64)]).unwrap();
        assert!(index.get(&VectorId::from(1i64)).unwrap().is_none());
        assert_eq!(index.len().unwrap(), 1);

        index.clear().unwrap();
        assert!(index.is_empty().unwrap());
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp = TempDir::new().unwrap();
        let config = VectorIndexConfig::new(3, temp.path()).with_backend("simple");
        {
            let index = SimpleFileVectorIndex::open(&config).unwrap();
            index
                .upsert(&[VectorInsert::new(9i64, vec![0.0, 0.0, 1.0]).with_document("doc")])
                .unwrap();
        }

        let reopened = SimpleFileVectorIndex::open(&config).unwrap();
        let entry = reopened.get(&VectorId::from(9i64)).unwrap().unwrap();
        assert_eq!(entry.document, "doc");
    }
}
