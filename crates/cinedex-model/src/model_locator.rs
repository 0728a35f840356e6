//! Model locator for runtime path resolution.
//!
//! Models are disk assets; the locator never downloads anything.
//!
//! # Search Order
//!
//! 1. **Environment override**: `$CINEDEX_MODELS_DIR`
//! 2. **User directory**: `~/.cinedex/models`
//! 3. **Binary-relative**: `{exe_dir}/models`
//!
//! # Model Layout
//!
//! ```text
//! {models_dir}/
//!   embeddings/
//!     all-MiniLM-L6-v2/
//!       config.json
//!       model.safetensors
//!       tokenizer.json
//! ```
//!
//! A HuggingFace-style `{models_dir}/sentence-transformers/all-MiniLM-L6-v2`
//! or a flat `{models_dir}/all-MiniLM-L6-v2` are accepted as well.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{ModelError, ModelResult};

/// Environment variable for overriding the models directory.
pub const CINEDEX_MODELS_DIR_ENV: &str = "CINEDEX_MODELS_DIR";

/// Subdirectory holding embedding models.
pub const EMBEDDINGS_SUBDIR: &str = "embeddings";

/// Default embedding model name (short form).
pub const DEFAULT_EMBEDDING_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// Required files for a valid model directory.
pub const REQUIRED_MODEL_FILES: &[&str] = &["config.json", "model.safetensors", "tokenizer.json"];

// ============================================================================
// ModelLocator
// ============================================================================

/// Locates model files at runtime using a defined search order.
#[derive(Debug, Clone, Default)]
pub struct ModelLocator {
    /// Fixed base directory; skips the search order when set.
    base_dir: Option<PathBuf>,
}

impl ModelLocator {
    /// Create a locator that uses the standard search order.
    pub fn new() -> Self {
        Self { base_dir: None }
    }

    /// Create a model locator with a fixed base directory.
    pub fn with_base_dir(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: Some(base_dir.into()),
        }
    }

    /// Candidate base directories, in search order.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        if let Some(ref base) = self.base_dir {
            return vec![base.clone()];
        }

        let mut paths = Vec::new();
        if let Ok(env_path) = env::var(CINEDEX_MODELS_DIR_ENV) {
            if !env_path.trim().is_empty() {
                paths.push(PathBuf::from(env_path));
            }
        }
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".cinedex").join("models"));
        }
        if let Some(exe_dir) = env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
        {
            paths.push(exe_dir.join("models"));
        }
        paths
    }

    /// Resolve the base models directory: the first search path that exists.
    pub fn resolve_base_dir(&self) -> ModelResult<PathBuf> {
        let searched = self.search_paths();
        if let Some(found) = searched.iter().find(|p| p.is_dir()) {
            return Ok(found.clone());
        }
        Err(ModelError::ModelsDirectoryNotFound { searched })
    }

    /// Resolve the directory of an embedding model.
    ///
    /// `model_id` may be a full HuggingFace id
    /// ("sentence-transformers/all-MiniLM-L6-v2") or a short name.
    pub fn embedding_model_path(&self, model_id: &str) -> ModelResult<PathBuf> {
        let base = self.resolve_base_dir()?;
        let model_name = extract_model_name(model_id);

        let candidates = [
            base.join(EMBEDDINGS_SUBDIR).join(model_name),
            base.join(model_id),
            base.join(model_name),
        ];

        candidates
            .iter()
            .find(|path| is_valid_model_dir(path))
            .cloned()
            .ok_or_else(|| ModelError::ModelNotFound {
                model_id: model_id.to_string(),
                path: candidates[0].clone(),
            })
    }

    /// Get the path to the default embedding model.
    pub fn default_embedding_model_path(&self) -> ModelResult<PathBuf> {
        self.embedding_model_path(DEFAULT_EMBEDDING_MODEL_NAME)
    }

    /// Check if the default embedding model is available.
    pub fn has_default_embedding_model(&self) -> bool {
        self.default_embedding_model_path().is_ok()
    }

    /// Validate that a model directory contains all required files.
    pub fn validate_model_dir(&self, path: &Path) -> ModelResult<()> {
        if !path.exists() {
            return Err(ModelError::ModelNotFound {
                model_id: path.display().to_string(),
                path: path.to_path_buf(),
            });
        }

        let missing: Vec<&'static str> = REQUIRED_MODEL_FILES
            .iter()
            .copied()
            .filter(|file| !path.join(file).exists())
            .collect();

        if !missing.is_empty() {
            return Err(ModelError::IncompleteModelFiles {
                path: path.to_path_buf(),
                missing,
            });
        }

        Ok(())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Extract the model name from a full model ID.
///
/// E.g., "sentence-transformers/all-MiniLM-L6-v2" → "all-MiniLM-L6-v2"
pub(crate) fn extract_model_name(model_id: &str) -> &str {
    model_id.rsplit('/').next().unwrap_or(model_id)
}

/// A model directory must at least carry its config.json.
fn is_valid_model_dir(path: &Path) -> bool {
    path.is_dir() && path.join("config.json").exists()
}

/// Get a locator using the standard search order.
pub fn default_locator() -> ModelLocator {
    ModelLocator::new()
}

// ============================================================================
// Tests
// ============================================================================
