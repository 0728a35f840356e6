//! Candle-based BERT sentence encoder.
//!
//! Pipeline per batch: tokenize (pad to longest, truncate to the configured
//! sequence length) → BERT forward pass → attention-masked mean pooling →
//! L2 normalization.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig, DTYPE};
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::config::{DevicePreference, EmbeddingConfig, HuggingFaceModelConfig, ModelArchitecture, ModelInfo};
use crate::error::{ModelError, ModelResult};
use crate::model_locator::REQUIRED_MODEL_FILES;
use crate::EmbeddingModel;

/// Candle-based embedding model for BERT-family sentence encoders.
pub struct CandleEmbeddingModel {
    model_info: ModelInfo,
    model: Mutex<BertModel>,
    tokenizer: Tokenizer,
    device: Device,
}

impl std::fmt::Debug for CandleEmbeddingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandleEmbeddingModel")
            .field("model_id", &self.model_info.model_id)
            .field("dimension", &self.model_info.dimension)
            .field("device", &self.device)
            .finish()
    }
}

// SAFETY: the model is only reached through the mutex, and the tokenizer is
// only used through `&self` methods that do not mutate it.
unsafe impl Send for CandleEmbeddingModel {}
unsafe impl Sync for CandleEmbeddingModel {}

impl CandleEmbeddingModel {
    /// Load the model named by `config` from disk.
    pub fn new(config: &EmbeddingConfig) -> ModelResult<Self> {
        let model_path = config.effective_model_path();
        check_model_files(&config.model_id, &model_path)?;

        let config_json = std::fs::read_to_string(model_path.join("config.json"))?;
        let hf_config: HuggingFaceModelConfig = serde_json::from_str(&config_json)?;
        if hf_config.infer_architecture() != ModelArchitecture::Bert {
            return Err(ModelError::UnsupportedArchitecture {
                model_id: config.model_id.clone(),
                found: if hf_config.model_type.is_empty() {
                    hf_config.architectures.join(", ")
                } else {
                    hf_config.model_type.clone()
                },
            });
        }

        let dimension = hf_config.hidden_size;
        let max_seq_len = config
            .max_sequence_length
            .min(hf_config.max_position_embeddings);

        info!(
            "Loading embedding model '{}' from {:?} (dim={}, max_seq_len={})",
            config.model_id, model_path, dimension, max_seq_len
        );

        let load_err = |e: &dyn std::fmt::Display| ModelError::model_load(&config.model_id, e.to_string());

        let mut tokenizer =
            Tokenizer::from_file(model_path.join("tokenizer.json")).map_err(|e| load_err(&e))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            pad_id: 0,
            pad_token: "[PAD]".to_string(),
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_seq_len,
                ..Default::default()
            }))
            .map_err(|e| load_err(&e))?;

        let device = select_device(config.device)?;

        let bert_config: BertConfig = serde_json::from_str(&config_json)?;
        // SAFETY: the weights file is memory-mapped read-only and must not be
        // modified while the model is alive.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(
                &[model_path.join("model.safetensors")],
                DTYPE,
                &device,
            )
            .map_err(|e| load_err(&e))?
        };
        let model = BertModel::load(vb, &bert_config).map_err(|e| load_err(&e))?;

        Ok(Self {
            model_info: ModelInfo::new(&config.model_id, dimension, max_seq_len)
                .with_architecture(ModelArchitecture::Bert),
            model: Mutex::new(model),
            tokenizer,
            device,
        })
    }

    fn fail(&self, e: impl std::fmt::Display) -> ModelError {
        ModelError::embedding_failed(&self.model_info.model_id, e.to_string())
    }

    /// Run the encoder and return pooled, normalized sentence vectors.
    fn encode(&self, texts: &[&str]) -> ModelResult<Tensor> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| ModelError::tokenization(e.to_string()))?;

        let batch = encodings.len();
        let seq_len = encodings.first().map(|e| e.get_ids().len()).unwrap_or(0);

        let ids: Vec<u32> = encodings.iter().flat_map(|e| e.get_ids().to_vec()).collect();
        let mask: Vec<u32> = encodings
            .iter()
            .flat_map(|e| e.get_attention_mask().to_vec())
            .collect();

        let ids = Tensor::from_vec(ids, (batch, seq_len), &self.device).map_err(|e| self.fail(e))?;
        let mask =
            Tensor::from_vec(mask, (batch, seq_len), &self.device).map_err(|e| self.fail(e))?;
        let token_types = ids.zeros_like().map_err(|e| self.fail(e))?;

        let hidden = {
            let model = self.model.lock().map_err(|e| self.fail(e))?;
            model
                .forward(&ids, &token_types, Some(&mask))
                .map_err(|e| self.fail(format!("forward pass: {}", e)))?
        };

        let pooled = mean_pool(&hidden, &mask).map_err(|e| self.fail(e))?;
        l2_normalize(&pooled).map_err(|e| self.fail(e))
    }
}

impl EmbeddingModel for CandleEmbeddingModel {
    fn embed(&self, texts: &[&str]) -> ModelResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        debug!("Embedding {} texts", texts.len());
        self.encode(texts)?
            .to_vec2::<f32>()
            .map_err(|e| self.fail(e))
    }

    fn dimension(&self) -> usize {
        self.model_info.dimension
    }

    fn max_sequence_length(&self) -> usize {
        self.model_info.max_seq_len
    }

    fn model_info(&self) -> &ModelInfo {
        &self.model_info
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn check_model_files(model_id: &str, path: &Path) -> ModelResult<()> {
    if !path.is_dir() {
        return Err(ModelError::ModelNotFound {
            model_id: model_id.to_string(),
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
            path: PathBuf::from(path),
            missing,
        });
    }
    Ok(())
}

fn select_device(pref: DevicePreference) -> ModelResult<Device> {
    match pref {
        DevicePreference::Cpu => Ok(Device::Cpu),
        DevicePreference::Auto => Ok(try_gpu().unwrap_or_else(|| {
            info!("Using CPU");
            Device::Cpu
        })),
        DevicePreference::Gpu => try_gpu().ok_or_else(|| ModelError::DeviceNotAvailable {
            reason: if cfg!(any(feature = "metal", feature = "cuda")) {
                "no usable GPU was found".to_string()
            } else {
                "cinedex-model was built without the 'metal' or 'cuda' feature".to_string()
            },
        }),
    }
}

#[allow(unreachable_code)]
fn try_gpu() -> Option<Device> {
    #[cfg(feature = "metal")]
    match Device::new_metal(0) {
        Ok(device) => {
            info!("Using Metal GPU");
            return Some(device);
        }
        Err(e) => debug!("Metal not available: {}", e),
    }

    #[cfg(feature = "cuda")]
    match Device::new_cuda(0) {
        Ok(device) => {
            info!("Using CUDA GPU");
            return Some(device);
        }
        Err(e) => debug!("CUDA not available: {}", e),
    }

    None
}

/// Average token vectors, ignoring padding positions.
fn mean_pool(hidden: &Tensor, mask: &Tensor) -> candle_core::Result<Tensor> {
    let mask = mask
        .unsqueeze(2)?
        .to_dtype(DType::F32)?
        .broadcast_as(hidden.shape())?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
    summed.broadcast_div(&counts)
}

fn l2_normalize(v: &Tensor) -> candle_core::Result<Tensor> {
    let norm = v.sqr()?.sum_keepdim(1)?.sqrt()?.clamp(1e-12, f64::MAX)?;
    v.broadcast_div(&norm)
}
