//! Local sentence embeddings with [fastembed](https://docs.rs/fastembed).
//!
//! Runs `all-MiniLM-L6-v2` (384 dimensions) on the CPU through ONNX Runtime.
//! Weights are downloaded on first use and loaded lazily through a
//! [`ModelCache`], so constructing the provider is cheap.

use std::path::PathBuf;

use async_trait::async_trait;
use ::fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use tracing::debug;

use crate::embedding::EmbeddingProvider;
use crate::error::{QaError, Result};
use crate::model_cache::ModelCache;

const MODEL_NAME: &str = "sentence-transformers/all-MiniLM-L6-v2";
const DIMENSIONS: usize = 384;

/// An [`EmbeddingProvider`] backed by a locally run fastembed model.
#[derive(Debug)]
pub struct FastEmbedProvider {
    model: ModelCache<TextEmbedding>,
}

impl FastEmbedProvider {
    /// Create a provider that caches model files under `cache_dir`, or in
    /// fastembed's default location when `None`.
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        let model = ModelCache::new(MODEL_NAME, move || {
            let mut options =
                InitOptions::new(EmbeddingModel::AllMiniLML6V2).with_show_download_progress(false);
            if let Some(dir) = &cache_dir {
                options = options.with_cache_dir(dir.clone());
            }
            TextEmbedding::try_new(options)
                .map_err(|e| QaError::model_unavailable(MODEL_NAME, e.to_string()))
        });
        Self { model }
    }

    /// Drop the loaded model; the next call reloads it.
    pub async fn reset(&self) {
        self.model.reset().await;
    }
}

impl Default for FastEmbedProvider {
    fn default() -> Self {
        Self::new(None)
    }
}

#[async_trait]
impl EmbeddingProvider for FastEmbedProvider {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let model = self.model.get().await?;
        debug!(provider = MODEL_NAME, batch_size = texts.len(), "embedding batch");

        let inputs: Vec<String> = texts.iter().map(|t| (*t).to_string()).collect();
        let vectors = model
            .embed(inputs, None)
            .map_err(|e| QaError::model_unavailable(MODEL_NAME, format!("embedding failed: {e}")))?;

        if vectors.len() != texts.len() {
            return Err(QaError::model_unavailable(
                MODEL_NAME,
                format!("expected {} vectors, got {}", texts.len(), vectors.len()),
            ));
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn name(&self) -> &str {
        MODEL_NAME
    }
}
