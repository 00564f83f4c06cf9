//! Top-k chunk retrieval for a query.

use tracing::{debug, error};

use crate::document::RetrievedItem;
use crate::embedding::EmbeddingProvider;
use crate::error::Result;
use crate::index::DocumentIndex;

/// Embed `query` and return the `min(k, chunk_count)` most similar chunks of
/// `index`, ordered by descending similarity score.
///
/// Each item carries its chunk's 1-based page number.
///
/// # Errors
///
/// Propagates embedding failures, and returns
/// [`QaError::DimensionMismatch`](crate::QaError::DimensionMismatch) if the
/// embedder is not the one the index was built with.
pub async fn retrieve(
    query: &str,
    embedder: &dyn EmbeddingProvider,
    index: &DocumentIndex,
    k: usize,
) -> Result<Vec<RetrievedItem>> {
    let query_embedding = embedder.embed(query).await.map_err(|e| {
        error!(provider = embedder.name(), error = %e, "query embedding failed");
        e
    })?;

    let items: Vec<RetrievedItem> = index
        .nearest(&query_embedding, k)?
        .into_iter()
        .map(|(neighbor, chunk)| RetrievedItem {
            text: chunk.text.clone(),
            page: chunk.source_page + 1,
            score: neighbor.similarity(),
        })
        .collect();

    debug!(
        k,
        result_count = items.len(),
        top_score = items.first().map(|item| item.score),
        "retrieved chunks"
    );
    Ok(items)
}
