//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::{QaError, Result};

/// A provider that maps text to fixed-length dense vectors.
///
/// Implementations wrap a specific embedding model behind a unified async
/// interface. For a given loaded model the output is deterministic and every
/// vector has [`dimensions`](EmbeddingProvider::dimensions) components.
///
/// # Example
///
/// ```rust,ignore
/// use pdfqa_rag::{EmbeddingProvider, HashingEmbedder};
///
/// let provider = HashingEmbedder::default();
/// let vectors = provider.embed_batch(&["hello", "world"]).await?;
/// assert_eq!(vectors[0].len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding vectors for a batch of texts, one per input, same order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding vector for a single text.
    ///
    /// The default implementation embeds a one-element batch.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(&[text]).await?.into_iter().next().ok_or_else(|| {
            QaError::model_unavailable(self.name(), "embedding backend returned no vector")
        })
    }

    /// Return the dimensionality of the vectors this provider produces.
    fn dimensions(&self) -> usize;

    /// Return a short identifier for the underlying model.
    fn name(&self) -> &str;
}
