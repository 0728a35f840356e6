//! Vector index traits and core types.
//!
//! This module defines the core abstraction for vector storage backends.

use crate::error::DbResult;
use serde::{Deserialize, Serialize};

use super::metadata::EntryMetadata;

// ============================================================================
// VectorId
// ============================================================================

/// Unique identifier for an entry in the index.
///
/// Entries are keyed by the decimal string form of the record id, which is
/// the join key back into the record store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorId(pub String);

impl VectorId {
    /// Create a new vector ID.
    pub fn new(id: impl Into<String>) -> Self {
        VectorId(id.into())
    }

    /// Get the underlying ID value.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Parse the ID back into a record id, if it is one.
    pub fn as_record_id(&self) -> Option<i64> {
        self.0.parse().ok()
    }
}

impl From<i64> for VectorId {
    fn from(id: i64) -> Self {
        VectorId(id.to_string())
    }
}

impl From<&str> for VectorId {
    fn from(id: &str) -> Self {
        VectorId(id.to_string())
    }
}

impl From<String> for VectorId {
    fn from(id: String) -> Self {
        VectorId(id)
    }
}

impl std::fmt::Display for VectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// VectorMetric
// ============================================================================

/// Distance metric for vector similarity search.
///
/// Backends report a *distance* (lower is nearer). For L2-normalized
/// embeddings every metric maps back to cosine similarity through
/// [`VectorMetric::similarity_from_distance`]:
///
/// | Metric | Distance | Similarity |
/// |--------|----------|------------|
/// | cosine | `1 - cos(a, b)` | `1 - d` |
/// | dot | `1 - a·b` | `1 - d` |
/// | l2 | `‖a - b‖²` | `1 - d / 2` |
///
/// Similarity therefore lies in `[-1, 1]`, and in `[0, 1]` whenever the
/// embeddings have no negative components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorMetric {
    /// Cosine distance (default).
    #[default]
    Cosine,
    /// Dot product.
    Dot,
    /// Squared Euclidean (L2) distance.
    L2,
}

impl VectorMetric {
    /// Get the metric name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            VectorMetric::Cosine => "cosine",
            VectorMetric::Dot => "dot",
            VectorMetric::L2 => "l2",
        }
    }

    /// Convert a backend distance into a similarity score.
    ///
    /// Cosine and dot use `1 - d`. Backends report squared L2 distance, so
    /// for unit vectors `1 - d/2` equals the cosine similarity, in `[-1, 1]`.
    pub fn similarity_from_distance(&self, distance: f32) -> f32 {
        match self {
            VectorMetric::Cosine | VectorMetric::Dot => 1.0 - distance,
            VectorMetric::L2 => 1.0 - distance / 2.0,
        }
    }
}

impl std::fmt::Display for VectorMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for VectorMetric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(VectorMetric::Cosine),
            "dot" => Ok(VectorMetric::Dot),
            "l2" => Ok(VectorMetric::L2),
            other => Err(format!(
                "unknown metric '{}' (expected cosine, dot or l2)",
                other
            )),
        }
    }
}

// ============================================================================
// VectorInsert
// ============================================================================

/// An entry to insert or replace in the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorInsert {
    /// Unique identifier for this entry.
    pub id: VectorId,

    /// The embedding vector.
    pub vector: Vec<f32>,

    /// The source text the vector was computed from.
    #[serde(default)]
    pub document: String,

    /// Flat string metadata, for display and debugging.
    #[serde(default)]
    pub metadata: EntryMetadata,
}

impl VectorInsert {
    /// Create a new insert with required fields.
    pub fn new(id: impl Into<VectorId>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
            document: String::new(),
            metadata: EntryMetadata::new(),
        }
    }

    /// Set the source document.
    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = document.into();
        self
    }

    /// Set the metadata.
    pub fn with_metadata(mut self, metadata: EntryMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

// ============================================================================
// VectorEntry
// ============================================================================

/// A stored entry, as returned by [`VectorIndexBackend::get`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    pub id: VectorId,
    pub vector: Vec<f32>,
    pub document: String,
    pub metadata: EntryMetadata,
}

// ============================================================================
// VectorSearchResult
// ============================================================================

/// A single result from a vector similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchResult {
    /// Identifier of the matched entry.
    pub id: VectorId,

    /// Distance to the query vector (lower is nearer).
    pub distance: f32,

    /// Source document of the matched entry.
    #[serde(default)]
    pub document: String,

    /// Metadata of the matched entry.
    #[serde(default)]
    pub metadata: EntryMetadata,
}

impl VectorSearchResult {
    /// Create a new search result.
    pub fn new(id: impl Into<VectorId>, distance: f32) -> Self {
        Self {
            id: id.into(),
            distance,
            document: String::new(),
            metadata: EntryMetadata::new(),
        }
    }

    /// Set the document.
    pub fn with_document(mut self, document: impl Into<String>) -> Self {
        self.document = document.into();
        self
    }

    /// Set the metadata.
    pub fn with_metadata(mut self, metadata: EntryMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}

// ============================================================================
// VectorIndexBackend Trait
// ============================================================================

/// Core trait for vector index backends.
///
/// ## Implementation Notes
///
/// - Backends must be thread-safe (`Send + Sync`); concurrent writers to the
///   same id race and the last write wins.
/// - `query` returns results nearest-first (ascending distance).
/// - Upsert semantics: an entry with the same ID is replaced.
pub trait VectorIndexBackend: Send + Sync {
    /// Query the index for the `limit` entries nearest to `embedding`.
    fn query(&self, embedding: &[f32], limit: usize) -> DbResult<Vec<VectorSearchResult>>;

    /// Insert or replace entries.
    fn upsert(&self, vectors: &[VectorInsert]) -> DbResult<()>;

    /// Delete entries by ID. Unknown IDs are ignored.
    fn delete(&self, ids: &[VectorId]) -> DbResult<()>;

    /// Fetch a single entry by ID.
    fn get(&self, id: &VectorId) -> DbResult<Option<VectorEntry>>;

    /// Remove every entry, keeping the collection itself.
    fn clear(&self) -> DbResult<()>;

    /// Flush pending writes to persistent storage.
    fn flush(&self) -> DbResult<()>;

    /// Get the number of entries in the index.
    fn len(&self) -> DbResult<usize>;

    /// Check if the index is empty.
    fn is_empty(&self) -> DbResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Get the dimension of vectors in this index.
    fn dimension(&self) -> usize;

    /// Get the distance metric used by this index.
    fn metric(&self) -> VectorMetric;
}

// ============================================================================
// Tests
// ============================================================================
