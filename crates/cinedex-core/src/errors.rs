//! Error types for cinedex-core.
//!
//! Only faults are errors. A missing movie, a disabled semantic index or a
//! failed semantic query are ordinary outcomes and are reported as values
//! (see [`crate::types`]).

use std::path::PathBuf;

use thiserror::Error;

/// Domain-specific errors for catalog operations.
#[derive(Error, Debug)]
pub enum CatalogError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file is invalid.
    #[error("Config invalid: {0}")]
    InvalidConfig(String),

    /// A configuration value is invalid.
    #[error("Invalid configuration: {message}. {hint}")]
    InvalidConfiguration {
        /// Description of the invalid configuration.
        message: String,
        /// Actionable hint on how to fix it.
        hint: String,
    },

    // =========================================================================
    // Record Store Errors
    // =========================================================================
    /// The record store could not be opened.
    #[error("Failed to open record store at `{path}`: {reason}")]
    RecordStoreOpen {
        /// Path to the database file.
        path: PathBuf,
        /// Description of the failure.
        reason: String,
    },

    /// A record store query failed.
    #[error("Record store query failed: {reason}")]
    RecordStoreQuery {
        /// Description of the failure.
        reason: String,
    },

    // =========================================================================
    // Vector Index Errors
    // =========================================================================
    /// Vector index I/O error.
    #[error("Vector index I/O error at `{path}`: {message}")]
    VectorIndexIo {
        /// Path involved in the failure.
        path: PathBuf,
        /// Description of the I/O error.
        message: String,
    },

    /// Vector index parse error.
    #[error("Vector index parse error at `{path}`: {message}")]
    VectorIndexParse {
        /// Path to the file that failed to parse.
        path: PathBuf,
        /// Description of the parse error.
        message: String,
    },

    /// The collection on disk does not match the configured model, dimension or metric.
    #[error("Vector collection `{collection}` is incompatible: {reason}. Run `cinedex reindex` to rebuild it.")]
    VectorIndexIncompatible {
        /// The affected collection.
        collection: String,
        /// Description of the incompatibility.
        reason: String,
    },

    /// The vector backend could not serve the request.
    #[error("Vector index backend `{backend}` is unavailable: {reason}")]
    VectorIndexBackendUnavailable {
        /// Backend name.
        backend: String,
        /// Reason why the backend is unavailable.
        reason: String,
    },

    // =========================================================================
    // Embedding Errors
    // =========================================================================
    /// Embedding model could not be loaded or run.
    #[error("Embedding provider `{provider}` is unavailable: {reason}")]
    EmbeddingProviderUnavailable {
        /// The provider or model that failed.
        provider: String,
        /// Reason for the failure.
        reason: String,
    },

    /// Embedding configuration is invalid.
    #[error("Embedding config error: {message}")]
    EmbeddingConfigError {
        /// Description of the configuration error.
        message: String,
    },

    // =========================================================================
    // Reindex Errors
    // =========================================================================
    /// Reindex was requested while semantic search is switched off.
    #[error("Semantic search is disabled; nothing to reindex. Set `semantic.enabled: true` or CINEDEX_SEMANTIC_ENABLED=true.")]
    ReindexDisabled,

    /// Reindex failed during embedding.
    #[error("Failed to embed during reindex of collection `{collection}`: {reason}")]
    ReindexEmbeddingError {
        /// The affected collection.
        collection: String,
        /// Description of the failure.
        reason: String,
    },

    /// Reindex failed during vector index update.
    #[error("Failed to update vector index during reindex of collection `{collection}`: {reason}")]
    ReindexIndexError {
        /// The affected collection.
        collection: String,
        /// Description of the failure.
        reason: String,
    },

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A wrapped generic error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;
