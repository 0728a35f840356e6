//! Configuration for cinedex.
//!
//! Configuration is loaded from `~/.cinedex/config.yaml` (or an explicit
//! path). A missing file yields defaults, so the catalog works without any
//! setup. A few environment variables override the file:
//!
//! - `CINEDEX_DATA_DIR`: directory holding the database and vector index
//! - `CINEDEX_SEMANTIC_ENABLED`: `true`/`false`, turns semantic search on or off
//!
//! # Example YAML
//!
//! ```yaml
//! data_dir: /var/lib/cinedex
//! database_path: movies.db
//!
//! semantic:
//!   enabled: true
//!   backend: lancedb
//!   collection: movies
//!   metric: cosine
//!
//! embedding:
//!   model_id: sentence-transformers/all-MiniLM-L6-v2
//!   device: auto
//!   batch_size: 32
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use cinedex_db::vector::{available_backends, VectorMetric, DEFAULT_BACKEND, DEFAULT_COLLECTION};
use cinedex_model::EmbeddingConfig;
use serde::{Deserialize, Serialize};

use crate::errors::CatalogError;

/// Environment variable overriding the data directory.
pub const CINEDEX_DATA_DIR_ENV: &str = "CINEDEX_DATA_DIR";

/// Environment variable switching semantic search on or off.
pub const CINEDEX_SEMANTIC_ENABLED_ENV: &str = "CINEDEX_SEMANTIC_ENABLED";

/// Default database filename, relative to the data directory.
pub const DEFAULT_DATABASE_FILENAME: &str = "movies.db";

/// Default vector index directory, relative to the data directory.
pub const DEFAULT_INDEX_DIRNAME: &str = "vector_index";

/// Name of the configuration file inside the config directory.
pub const CONFIG_FILENAME: &str = "config.yaml";

// ============================================================================
// CatalogConfig
// ============================================================================

/// Top-level configuration for the catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Directory holding the database and the vector index.
    /// Defaults to `~/.cinedex`.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Path to the SQLite database. Relative paths are resolved against
    /// the data directory.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Semantic search (vector index) settings.
    #[serde(default)]
    pub semantic: SemanticConfig,

    /// Embedding model settings.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

impl CatalogConfig {
    /// Load the configuration from the default location (`~/.cinedex/config.yaml`).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidConfig`] if the file exists but cannot be parsed.
    pub fn load_default() -> Result<Self, CatalogError> {
        match Self::default_path() {
            Some(path) => Self::from_path(&path),
            None => {
                tracing::debug!("Could not determine home directory, using default config");
                Ok(Self::default())
            }
        }
    }

    /// Load the configuration from a specific path.
    ///
    /// If the file does not exist, returns a default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidConfig`] if the file exists but cannot be parsed.
    /// Returns [`CatalogError::InvalidConfiguration`] if validation fails.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            tracing::debug!("Config not found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            CatalogError::InvalidConfig(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            CatalogError::InvalidConfig(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        // Errors surface here; warnings are logged when the engine is built.
        config.validate()?;

        Ok(config)
    }

    /// Get the default config directory (`~/.cinedex`).
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".cinedex"))
    }

    /// Get the default config file path (`~/.cinedex/config.yaml`).
    pub fn default_path() -> Option<PathBuf> {
        Self::default_dir().map(|d| d.join(CONFIG_FILENAME))
    }

    /// Configuration rooted at `data_dir`, otherwise default.
    pub fn for_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: Some(data_dir.into()),
            ..Self::default()
        }
    }

    /// Apply `CINEDEX_DATA_DIR` and `CINEDEX_SEMANTIC_ENABLED` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides read through `lookup`.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(CINEDEX_DATA_DIR_ENV).filter(|v| !v.trim().is_empty()) {
            tracing::debug!("{} overrides data_dir: {}", CINEDEX_DATA_DIR_ENV, dir);
            self.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(value) = lookup(CINEDEX_SEMANTIC_ENABLED_ENV) {
            match parse_flag(&value) {
                Some(enabled) => self.semantic.enabled = enabled,
                None => tracing::warn!(
                    "Ignoring {}={:?}: expected true or false",
                    CINEDEX_SEMANTIC_ENABLED_ENV,
                    value
                ),
            }
        }
    }

    /// The data directory, falling back to `~/.cinedex` and then `./.cinedex`.
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(Self::default_dir)
            .unwrap_or_else(|| PathBuf::from(".cinedex"))
    }

    /// Absolute (or data-dir relative) path of the SQLite database.
    pub fn resolved_database_path(&self) -> PathBuf {
        let path = self
            .database_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE_FILENAME));
        if path.is_absolute() {
            path
        } else {
            self.resolved_data_dir().join(path)
        }
    }

    /// Root directory of the vector collections.
    pub fn resolved_index_path(&self) -> PathBuf {
        match &self.semantic.index_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => self.resolved_data_dir().join(path),
            None => self.resolved_data_dir().join(DEFAULT_INDEX_DIRNAME),
        }
    }

    /// Validate the configuration.
    ///
    /// Returns non-fatal warnings; callers should log them.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::InvalidConfiguration`] for values the catalog
    /// cannot run with.
    pub fn validate(&self) -> Result<Vec<String>, CatalogError> {
        let mut warnings = self.semantic.validate()?;

        if self.embedding.batch_size == 0 {
            return Err(CatalogError::InvalidConfiguration {
                message: "embedding.batch_size cannot be 0".to_string(),
                hint: "Set batch_size to at least 1 (recommended: 32-128)".to_string(),
            });
        }

        if self.embedding.batch_size > 512 {
            warnings.push(format!(
                "embedding.batch_size={} is very large; may cause OOM on constrained devices (recommended: 32-128)",
                self.embedding.batch_size
            ));
        }

        if self.embedding.model_id.trim().is_empty() {
            return Err(CatalogError::InvalidConfiguration {
                message: "embedding.model_id cannot be empty".to_string(),
                hint: "Remove the key to use sentence-transformers/all-MiniLM-L6-v2".to_string(),
            });
        }

        Ok(warnings)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

// ============================================================================
// SemanticConfig
// ============================================================================

/// Settings for the vector collection behind semantic search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SemanticConfig {
    /// When false, the collection is never opened and semantic search
    /// reports itself as disabled.
    #[serde(default = "default_semantic_enabled")]
    pub enabled: bool,

    /// Vector backend (`lancedb` or `simple`).
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Root directory of collections. Relative paths are resolved against
    /// the data directory; defaults to `<data_dir>/vector_index`.
    #[serde(default)]
    pub index_path: Option<PathBuf>,

    /// Collection name.
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Distance metric; decides how distances become similarity scores.
    #[serde(default)]
    pub metric: VectorMetric,
}

fn default_semantic_enabled() -> bool {
    true
}

fn default_backend() -> String {
    DEFAULT_BACKEND.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

impl Default for SemanticConfig {
    fn default() -> Self {
        Self {
            enabled: default_semantic_enabled(),
            backend: default_backend(),
            index_path: None,
            collection: default_collection(),
            metric: VectorMetric::default(),
        }
    }
}

impl SemanticConfig {
    /// Validate the semantic section, returning warnings.
    pub fn validate(&self) -> Result<Vec<String>, CatalogError> {
        let mut warnings = Vec::new();

        let name = self.collection.trim();
        if name.is_empty() {
            return Err(CatalogError::InvalidConfiguration {
                message: "semantic.collection cannot be empty".to_string(),
                hint: format!("Remove the key to use `{}`", DEFAULT_COLLECTION),
            });
        }
        if name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(CatalogError::InvalidConfiguration {
                message: format!("semantic.collection `{}` is not a valid name", self.collection),
                hint: "Use a plain name such as `movies`".to_string(),
            });
        }

        let backends = available_backends();
        if !backends.contains(&self.backend.as_str()) {
            return Err(CatalogError::InvalidConfiguration {
                message: format!("semantic.backend `{}` is not available", self.backend),
                hint: format!("Available backends: {}", backends.join(", ")),
            });
        }

        if self.metric == VectorMetric::Dot {
            warnings.push(
                "semantic.metric=dot assumes normalized embeddings; similarity leaves [0, 1] otherwise"
                    .to_string(),
            );
        }

        Ok(warnings)
    }
}
