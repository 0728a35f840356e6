//! Error types for cinedex-model.
//!
//! Discovery errors explain where models were looked for and how to install
//! one, since a missing model is the usual first-run failure.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cinedex-model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur in cinedex-model operations.
#[derive(Debug, Error)]
pub enum ModelError {
    // ========================================================================
    // Model discovery errors
    // ========================================================================
    /// No models directory found in any search location.
    #[error("{}", format_models_dir_not_found(.searched))]
    ModelsDirectoryNotFound { searched: Vec<PathBuf> },

    /// Model files not found at expected location.
    #[error("{}", format_model_not_found(.model_id, .path))]
    ModelNotFound { model_id: String, path: PathBuf },

    /// Model directory exists but is missing required files.
    #[error("{}", format_incomplete_model(.path, .missing))]
    IncompleteModelFiles {
        path: PathBuf,
        missing: Vec<&'static str>,
    },

    // ========================================================================
    // Model loading errors
    // ========================================================================
    /// Failed to load model.
    #[error("Failed to load model '{model_id}': {message}")]
    ModelLoad { model_id: String, message: String },

    /// The model's architecture cannot be run.
    #[error("Unsupported model architecture for '{model_id}': {found}. Only BERT-family sentence encoders are supported.")]
    UnsupportedArchitecture { model_id: String, found: String },

    // ========================================================================
    // Inference errors
    // ========================================================================
    /// Tokenization failed.
    #[error("Tokenization failed: {message}")]
    Tokenization { message: String },

    /// Embedding generation failed.
    #[error("Embedding failed for model '{model_id}': {message}")]
    EmbeddingFailed { model_id: String, message: String },

    // ========================================================================
    // Provider errors
    // ========================================================================
    /// Provider not available.
    #[error("Embedding provider '{provider}' not available: {reason}")]
    ProviderNotAvailable { provider: String, reason: String },

    /// Device not available.
    #[error("Compute device not available: {reason}\n\nSet `embedding.device: cpu` in ~/.cinedex/config.yaml to use CPU-only inference.")]
    DeviceNotAvailable { reason: String },

    // ========================================================================
    // I/O errors
    // ========================================================================
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error message formatters
// ============================================================================

fn format_models_dir_not_found(searched: &[PathBuf]) -> String {
    let list = searched
        .iter()
        .enumerate()
        .map(|(i, p)| format!("  {}. {}", i + 1, p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Models directory not found.\n\n\
        cinedex searched these locations:\n\
        {list}\n\n\
        Semantic search needs a local copy of the embedding model. To fix:\n\
        1. Set $CINEDEX_MODELS_DIR to your models directory, OR\n\
        2. Download all-MiniLM-L6-v2 into ~/.cinedex/models/embeddings/, OR\n\
        3. Disable semantic search with CINEDEX_SEMANTIC_ENABLED=false."
    )
}

fn format_model_not_found(model_id: &str, path: &std::path::Path) -> String {
    format!(
        "Model not found: {model_id}\n\n\
        Expected at: {}\n\n\
        The model directory must contain config.json, model.safetensors, and tokenizer.json.",
        path.display()
    )
}

fn format_incomplete_model(path: &std::path::Path, missing: &[&str]) -> String {
    let missing_list = missing.join(", ");
    format!(
        "Incomplete model installation at {}\n\n\
        Missing files: {missing_list}\n\n\
        A complete model directory must contain:\n\
        - config.json (model configuration)\n\
        - model.safetensors (model weights)\n\
        - tokenizer.json (tokenizer configuration)",
        path.display()
    )
}

// ============================================================================
// Error constructors
// ============================================================================

impl ModelError {
    /// Create a model load error.
    pub fn model_load(model_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModelLoad {
            model_id: model_id.into(),
            message: message.into(),
        }
    }

    /// Create an embedding failed error.
    pub fn embedding_failed(model_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EmbeddingFailed {
            model_id: model_id.into(),
            message: message.into(),
        }
    }

    /// Create a tokenization error.
    pub fn tokenization(message: impl Into<String>) -> Self {
        Self::Tokenization {
            message: message.into(),
        }
    }
}
