//! Vector index configuration and metadata.

use super::traits::VectorMetric;
use crate::error::{DbError, DbResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

// ============================================================================
// Constants
// ============================================================================

/// Default backend name.
pub const DEFAULT_BACKEND: &str = "lancedb";

/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "movies";

/// Filename for index metadata.
pub const INDEX_META_FILENAME: &str = "index.meta.json";

/// LanceDB table name inside a collection directory.
pub const LANCEDB_TABLE_NAME: &str = "entries";

// ============================================================================
// VectorIndexConfig
// ============================================================================

/// Configuration for creating or opening a named collection.
///
/// A collection lives in `<path>/<collection>/`, next to its
/// `index.meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorIndexConfig {
    /// Dimension of vectors in the index.
    pub dimension: usize,

    /// Root directory holding collections.
    pub path: PathBuf,

    /// Collection name.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Backend to use (e.g., "lancedb", "simple").
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Distance metric for similarity search.
    #[serde(default)]
    pub metric: VectorMetric,

    /// Embedding model that produces the stored vectors.
    #[serde(default)]
    pub model_id: Option<String>,

    /// Whether to create the collection if it doesn't exist.
    #[serde(default = "default_create_if_missing")]
    pub create_if_missing: bool,
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_create_if_missing() -> bool {
    true
}

impl VectorIndexConfig {
    /// Create a new config with required fields.
    pub fn new(dimension: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            dimension,
            path: path.into(),
            collection: DEFAULT_COLLECTION.to_string(),
            backend: DEFAULT_BACKEND.to_string(),
            metric: VectorMetric::Cosine,
            model_id: None,
            create_if_missing: true,
        }
    }

    /// Set the collection name.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Set the backend.
    pub fn with_backend(mut self, backend: impl Into<String>) -> Self {
        self.backend = backend.into();
        self
    }

    /// Set the distance metric.
    pub fn with_metric(mut self, metric: VectorMetric) -> Self {
        self.metric = metric;
        self
    }

    /// Set the embedding model id.
    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    /// Set whether to create the collection if missing.
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Directory of this collection.
    pub fn collection_path(&self) -> PathBuf {
        self.path.join(&self.collection)
    }
}

// ============================================================================
// VectorIndexMeta
// ============================================================================

/// Metadata for a persisted collection, stored in `index.meta.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorIndexMeta {
    /// Backend used for this index.
    pub backend: String,

    /// Collection name.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Dimension of vectors.
    pub dimension: usize,

    /// Distance metric.
    pub metric: VectorMetric,

    /// Embedding model that produced the vectors.
    #[serde(default)]
    pub model_id: Option<String>,

    /// Number of entries (approximate, may be stale).
    #[serde(default)]
    pub count: usize,

    /// Schema version for future migrations.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Creation timestamp (ISO 8601).
    #[serde(default)]
    pub created_at: Option<String>,

    /// Last update timestamp (ISO 8601).
    #[serde(default)]
    pub updated_at: Option<String>,
}

fn default_schema_version() -> u32 {
    1
}

impl VectorIndexMeta {
    /// Create metadata describing `config`.
    pub fn from_config(config: &VectorIndexConfig) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            backend: config.backend.clone(),
            collection: config.collection.clone(),
            dimension: config.dimension,
            metric: config.metric,
            model_id: config.model_id.clone(),
            count: 0,
            schema_version: 1,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        }
    }

    /// Update the count and timestamp.
    pub fn update_count(&mut self, count: usize) {
        self.count = count;
        self.updated_at = Some(chrono::Utc::now().to_rfc3339());
    }
}

// ============================================================================
// VectorIndexCompatibility
// ============================================================================

/// Result of checking index compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VectorIndexCompatibility {
    /// Index is compatible and can be opened.
    Compatible,

    /// Index doesn't exist and should be created.
    NotFound,

    /// Index exists but has incompatible dimension.
    IncompatibleDimension { expected: usize, actual: usize },

    /// Index exists but uses a different backend.
    IncompatibleBackend { expected: String, actual: String },

    /// Index exists but uses a different metric.
    IncompatibleMetric {
        expected: VectorMetric,
        actual: VectorMetric,
    },

    /// Index exists but was built with a different embedding model.
    IncompatibleModel { expected: String, actual: String },

    /// Index metadata is corrupted or unreadable.
    Corrupted(String),
}

impl VectorIndexCompatibility {
    /// Check if the index is compatible.
    pub fn is_compatible(&self) -> bool {
        matches!(self, VectorIndexCompatibility::Compatible)
    }

    /// Check if the index doesn't exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, VectorIndexCompatibility::NotFound)
    }

    /// Human-readable reason for an incompatibility, if any.
    pub fn reason(&self) -> Option<String> {
        match self {
            VectorIndexCompatibility::Compatible | VectorIndexCompatibility::NotFound => None,
            VectorIndexCompatibility::IncompatibleDimension { expected, actual } => Some(format!(
                "dimension mismatch: expected {}, found {}",
                expected, actual
            )),
            VectorIndexCompatibility::IncompatibleBackend { expected, actual } => Some(format!(
                "backend mismatch: expected '{}', found '{}'",
                expected, actual
            )),
            VectorIndexCompatibility::IncompatibleMetric { expected, actual } => Some(format!(
                "metric mismatch: expected '{}', found '{}'",
                expected, actual
            )),
            VectorIndexCompatibility::IncompatibleModel { expected, actual } => Some(format!(
                "embedding model mismatch: expected '{}', found '{}'",
                expected, actual
            )),
            VectorIndexCompatibility::Corrupted(msg) => Some(format!("index corrupted: {}", msg)),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Check if an existing collection is compatible with the given config.
pub fn check_index_compatibility(config: &VectorIndexConfig) -> VectorIndexCompatibility {
    let dir = config.collection_path();
    let meta_path = dir.join(INDEX_META_FILENAME);

    if !meta_path.exists() {
        if dir.is_dir() {
            let entries = dir.read_dir().map(|rd| rd.count()).unwrap_or(0);
            if entries == 0 {
                return VectorIndexCompatibility::NotFound;
            }
            return VectorIndexCompatibility::Corrupted(
                "collection directory exists but has no metadata".to_string(),
            );
        }
        return VectorIndexCompatibility::NotFound;
    }

    let meta = match load_index_meta(&dir) {
        Ok(meta) => meta,
        Err(e) => return VectorIndexCompatibility::Corrupted(e.to_string()),
    };

    if meta.dimension != config.dimension {
        return VectorIndexCompatibility::IncompatibleDimension {
            expected: config.dimension,
            actual: meta.dimension,
        };
    }

    if meta.backend != config.backend {
        return VectorIndexCompatibility::IncompatibleBackend {
            expected: config.backend.clone(),
            actual: meta.backend,
        };
    }

    if meta.metric != config.metric {
        return VectorIndexCompatibility::IncompatibleMetric {
            expected: config.metric,
            actual: meta.metric,
        };
    }

    if let (Some(expected), Some(actual)) = (&config.model_id, &meta.model_id) {
        if expected != actual {
            return VectorIndexCompatibility::IncompatibleModel {
                expected: expected.clone(),
                actual: actual.clone(),
            };
        }
    }

    VectorIndexCompatibility::Compatible
}

/// Load index metadata from a collection directory.
pub fn load_index_meta(path: &Path) -> DbResult<VectorIndexMeta> {
    let meta_path = path.join(INDEX_META_FILENAME);
    debug!("Loading index metadata from {:?}", meta_path);

    let content = fs::read_to_string(&meta_path).map_err(|e| {
        DbError::vector_io(&meta_path, format!("Failed to read index metadata: {}", e))
    })?;

    let meta: VectorIndexMeta = serde_json::from_str(&content).map_err(|e| {
        DbError::vector_parse(&meta_path, format!("Failed to parse index metadata: {}", e))
    })?;

    Ok(meta)
}

/// Write index metadata to a collection directory.
pub fn write_index_meta(path: &Path, meta: &VectorIndexMeta) -> DbResult<()> {
    let meta_path = path.join(INDEX_META_FILENAME);
    debug!("Writing index metadata to {:?}", meta_path);

    if !path.exists() {
        fs::create_dir_all(path)?;
    }

    let content = serde_json::to_string_pretty(meta)?;
    fs::write(&meta_path, content)?;

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
