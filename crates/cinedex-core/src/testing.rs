//! Deterministic embedding models for unit tests.

use std::sync::Arc;

use cinedex_db::vector::VectorMetric;
use cinedex_model::{EmbeddingModel, ModelError, ModelInfo, ModelResult};

use crate::config::CatalogConfig;
use crate::engine::{CatalogEngine, ModelLoader};

/// Hashed bag-of-words embedder.
///
/// Every lowercase alphanumeric token adds 1 to bucket `fnv1a(token) % dim`;
/// the result is L2-normalized. Components are never negative, so cosine
/// similarity stays in `[0, 1]`.
#[derive(Debug)]
pub struct BagOfWordsEmbedder {
    info: ModelInfo,
}

impl BagOfWordsEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self::with_model_id("test/bag-of-words", dimension)
    }

    pub fn with_model_id(model_id: &str, dimension: usize) -> Self {
        Self {
            info: ModelInfo::new(model_id, dimension, 512),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let dim = self.info.dimension;
        let mut vector = vec![0.0f32; dim];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let bucket = (fnv1a(&token.to_lowercase()) % dim as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl EmbeddingModel for BagOfWordsEmbedder {
    fn embed(&self, texts: &[&str]) -> ModelResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.info.dimension
    }

    fn max_sequence_length(&self) -> usize {
        self.info.max_seq_len
    }

    fn model_info(&self) -> &ModelInfo {
        &self.info
    }
}

/// Embedder whose every call fails.
#[derive(Debug)]
pub struct FailingEmbedder {
    info: ModelInfo,
}

impl FailingEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            info: ModelInfo::new("test/failing", dimension, 512),
        }
    }
}

impl EmbeddingModel for FailingEmbedder {
    fn embed(&self, _texts: &[&str]) -> ModelResult<Vec<Vec<f32>>> {
        Err(ModelError::embedding_failed(
            &self.info.model_id,
            "inference backend crashed",
        ))
    }

    fn dimension(&self) -> usize {
        self.info.dimension
    }

    fn max_sequence_length(&self) -> usize {
        self.info.max_seq_len
    }

    fn model_info(&self) -> &ModelInfo {
        &self.info
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf29ce484222325u64, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x100000001b3)
    })
}

pub const TEST_DIMENSION: usize = 64;

/// A config rooted at `data_dir`, using the `simple` backend.
pub fn test_config(data_dir: &std::path::Path) -> CatalogConfig {
    let mut config = CatalogConfig::for_data_dir(data_dir);
    config.semantic.backend = "simple".to_string();
    config.semantic.metric = VectorMetric::Cosine;
    config
}

/// Loader that always hands out the given model.
pub fn loader_for(model: Arc<dyn EmbeddingModel>) -> ModelLoader {
    Arc::new(move || Ok(Arc::clone(&model)))
}

/// Engine over `data_dir` with the bag-of-words embedder.
pub fn test_engine(data_dir: &std::path::Path) -> CatalogEngine {
    CatalogEngine::with_model_loader(
        test_config(data_dir),
        loader_for(Arc::new(BagOfWordsEmbedder::new(TEST_DIMENSION))),
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bag_of_words_is_normalized_and_deterministic() {
        let model = BagOfWordsEmbedder::new(16);
        let a = model.embed_one("Dream heist thriller").unwrap();
        let b = model.embed_one("dream HEIST thriller").unwrap();
        assert_eq!(a, b);

        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!(a.iter().all(|x| *x >= 0.0));
    }

    #[test]
    fn test_failing_embedder_fails() {
        assert!(FailingEmbedder::new(8).embed_one("anything").is_err());
    }
}
