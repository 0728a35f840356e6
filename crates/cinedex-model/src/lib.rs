//! # cinedex-model
//!
//! ML inference layer for cinedex - text embeddings for semantic search.
//!
//! The catalog embeds the canonical text of every movie, and every semantic
//! query, with one named model. This crate owns that model:
//!
//! - **Embedding models**: Bi-encoder models producing L2-normalized vectors
//! - **Model locator**: Runtime path resolution for disk-based models
//! - **Config**: Embedding model configuration shared with `cinedex-core`
//!
//! Test doubles for [`EmbeddingModel`] live in the consuming crates.
//!
//! ## Model Location
//!
//! Models are searched in this order:
//! 1. `$CINEDEX_MODELS_DIR` environment variable
//! 2. `~/.cinedex/models` user directory
//! 3. `{exe_dir}/models` next to the binary
//!
//! ## Features
//!
//! - `embedded` (default): Local Candle inference with disk-based models
//! - `metal` / `cuda`: GPU acceleration
//!
//! ## Usage
//!
//! ```ignore
//! use cinedex_model::{create_embedding_model, EmbeddingConfig, EmbeddingModel};
//!
//! let model = create_embedding_model(&EmbeddingConfig::default())?;
//! let embeddings = model.embed(&["Title: Heat Director: Michael Mann"])?;
//! assert_eq!(embeddings[0].len(), model.dimension());
//! ```

pub mod config;
pub mod error;
pub mod model_locator;

#[cfg(feature = "embedded")]
mod embedding;

pub use error::{ModelError, ModelResult};

pub use config::{
    DevicePreference, EmbeddingConfig, HuggingFaceModelConfig, ModelArchitecture, ModelInfo,
};

pub use model_locator::{
    default_locator, ModelLocator, CINEDEX_MODELS_DIR_ENV, DEFAULT_EMBEDDING_MODEL_NAME,
    EMBEDDINGS_SUBDIR, REQUIRED_MODEL_FILES,
};

/// Default embedding model (full HuggingFace identifier).
pub const DEFAULT_EMBEDDING_MODEL_ID: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Output dimension of the default embedding model.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 384;

// ============================================================================
// Embedding Model Trait
// ============================================================================

/// Trait for embedding models (bi-encoders).
///
/// Implementations must be deterministic: the same text always yields the
/// same vector, so re-indexing an unchanged record is a no-op in effect.
pub trait EmbeddingModel: Send + Sync + std::fmt::Debug {
    /// Generate embeddings for a batch of texts.
    ///
    /// Returns one L2-normalized vector of length `dimension()` per input.
    fn embed(&self, texts: &[&str]) -> ModelResult<Vec<Vec<f32>>>;

    /// Generate embeddings for owned strings.
    fn embed_batch(&self, texts: &[String]) -> ModelResult<Vec<Vec<f32>>> {
        let refs: Vec<&str> = texts.iter().map(|s| s.as_str()).collect();
        self.embed(&refs)
    }

    /// Embed a single text.
    fn embed_one(&self, text: &str) -> ModelResult<Vec<f32>> {
        self.embed(&[text])?
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::embedding_failed(self.model_id(), "model returned no vector"))
    }

    /// Warm up the model by running a dummy inference.
    fn warm_up(&self) -> ModelResult<()> {
        let _ = self.embed(&["warmup"])?;
        Ok(())
    }

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Get the maximum sequence length supported.
    fn max_sequence_length(&self) -> usize;

    /// Get model information (ID, dimension, architecture).
    fn model_info(&self) -> &ModelInfo;

    /// Get the model ID.
    fn model_id(&self) -> &str {
        &self.model_info().model_id
    }
}

// ============================================================================
// Factory Functions
// ============================================================================

/// Create an embedding model from configuration.
///
/// # Errors
///
/// Returns `ModelError` if the model files cannot be located or loaded.
#[cfg(feature = "embedded")]
pub fn create_embedding_model(config: &EmbeddingConfig) -> ModelResult<Box<dyn EmbeddingModel>> {
    let model = embedding::CandleEmbeddingModel::new(config)?;
    Ok(Box::new(model))
}

#[cfg(not(feature = "embedded"))]
pub fn create_embedding_model(config: &EmbeddingConfig) -> ModelResult<Box<dyn EmbeddingModel>> {
    Err(ModelError::ProviderNotAvailable {
        provider: config.model_id.clone(),
        reason: "cinedex-model was built without the 'embedded' feature".to_string(),
    })
}

#[cfg(feature = "embedded")]
pub use embedding::CandleEmbeddingModel;
