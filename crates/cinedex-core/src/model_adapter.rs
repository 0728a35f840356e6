//! Adapter layer for cinedex-model infrastructure.
//!
//! Maps `ModelError` into `CatalogError` and constructs the embedding model
//! the catalog binds its collection to.

use std::sync::Arc;

use cinedex_model::{EmbeddingConfig, EmbeddingModel};

use crate::errors::CatalogError;

// ============================================================================
// Error Conversion
// ============================================================================

/// Convert a cinedex-model error to a cinedex-core error.
pub fn from_model_error(err: cinedex_model::ModelError) -> CatalogError {
    use cinedex_model::ModelError;

    match err {
        ModelError::ModelsDirectoryNotFound { searched } => {
            let paths = searched
                .iter()
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            CatalogError::EmbeddingProviderUnavailable {
                provider: "model-locator".to_string(),
                reason: format!("Models directory not found. Searched: {}", paths),
            }
        }

        ModelError::ModelNotFound { model_id, path } => {
            CatalogError::EmbeddingProviderUnavailable {
                provider: model_id,
                reason: format!("Model not found at {:?}", path),
            }
        }

        ModelError::IncompleteModelFiles { path, missing } => {
            CatalogError::EmbeddingProviderUnavailable {
                provider: path.display().to_string(),
                reason: format!("Missing model files: {}", missing.join(", ")),
            }
        }

        ModelError::ModelLoad { model_id, message } => {
            CatalogError::EmbeddingProviderUnavailable {
                provider: model_id,
                reason: message,
            }
        }

        ModelError::UnsupportedArchitecture { model_id, found } => {
            CatalogError::EmbeddingConfigError {
                message: format!("model '{}' has unsupported architecture '{}'", model_id, found),
            }
        }

        ModelError::Tokenization { message } => CatalogError::EmbeddingProviderUnavailable {
            provider: "tokenizer".to_string(),
            reason: message,
        },

        ModelError::EmbeddingFailed { model_id, message } => {
            CatalogError::EmbeddingProviderUnavailable {
                provider: model_id,
                reason: message,
            }
        }

        ModelError::ProviderNotAvailable { provider, reason } => {
            CatalogError::EmbeddingProviderUnavailable { provider, reason }
        }

        ModelError::DeviceNotAvailable { reason } => CatalogError::EmbeddingProviderUnavailable {
            provider: "device".to_string(),
            reason,
        },

        ModelError::Io(io_err) => CatalogError::Io(io_err),

        ModelError::Json(json_err) => CatalogError::EmbeddingConfigError {
            message: json_err.to_string(),
        },
    }
}

/// Extension trait to convert cinedex-model results to Result<T, CatalogError>.
pub trait IntoCatalogModelResult<T> {
    /// Convert a cinedex-model result to a CatalogError result.
    fn into_catalog_result(self) -> Result<T, CatalogError>;
}

impl<T> IntoCatalogModelResult<T> for cinedex_model::ModelResult<T> {
    fn into_catalog_result(self) -> Result<T, CatalogError> {
        self.map_err(from_model_error)
    }
}

// ============================================================================
// Model Construction
// ============================================================================

/// Load the embedding model described by `config`.
pub fn load_embedding_model(
    config: &EmbeddingConfig,
) -> Result<Arc<dyn EmbeddingModel>, CatalogError> {
    let model = cinedex_model::create_embedding_model(config).into_catalog_result()?;
    tracing::debug!(
        "Loaded embedding model '{}' (dim={})",
        model.model_id(),
        model.dimension()
    );
    Ok(Arc::from(model))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_models_dir_not_found_lists_paths() {
        let err = from_model_error(cinedex_model::ModelError::ModelsDirectoryNotFound {
            searched: vec![PathBuf::from("/a"), PathBuf::from("/b")],
        });

        match err {
            CatalogError::EmbeddingProviderUnavailable { provider, reason } => {
                assert_eq!(provider, "model-locator");
                assert!(reason.contains("/a, /b"));
            }
            other => panic!("Expected EmbeddingProviderUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_incomplete_files_conversion() {
        let err = from_model_error(cinedex_model::ModelError::IncompleteModelFiles {
            path: PathBuf::from("/models/minilm"),
            missing: vec!["tokenizer.json"],
        });
        assert!(err.to_string().contains("tokenizer.json"));
    }

    #[test]
    fn test_load_missing_model_is_error() {
        let temp = tempfile::TempDir::new().unwrap();
        let config = EmbeddingConfig::default().with_local_path(temp.path().join("absent"));

        let err = load_embedding_model(&config).unwrap_err();
        assert!(matches!(
            err,
            CatalogError::EmbeddingProviderUnavailable { .. }
        ));
    }
}
