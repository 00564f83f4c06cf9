//! Exact cosine nearest-neighbour index and the per-document index arena.
//!
//! [`SimilarityIndex`] is a brute-force cosine index over a fixed set of
//! vectors. [`DocumentIndex`] owns the chunks of one document together with
//! the index built from their embeddings, so a chunk's ordinal and its
//! vector's ordinal always agree.

use serde::Serialize;
use uuid::Uuid;

use crate::document::Chunk;
use crate::error::{QaError, Result};

/// One nearest-neighbour hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Neighbor {
    /// Cosine distance, `1 - cosine_similarity`.
    pub distance: f32,
    /// Ordinal of the indexed vector.
    pub ordinal: usize,
}

impl Neighbor {
    /// Cosine similarity, `1 - distance`.
    pub fn similarity(&self) -> f32 {
        1.0 - self.distance
    }
}

/// A fitted cosine index over vectors of one dimensionality.
#[derive(Debug, Clone)]
pub struct SimilarityIndex {
    /// L2-normalized copies of the indexed vectors; zero vectors stay zero.
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

/// L2-normalize, leaving zero-magnitude vectors unchanged.
fn normalized(vector: &[f32]) -> Vec<f32> {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 {
        return vector.to_vec();
    }
    vector.iter().map(|x| x / norm).collect()
}

impl SimilarityIndex {
    /// Fit an index over `vectors`.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::EmptyIndex`] if `vectors` is empty, and
    /// [`QaError::DimensionMismatch`] if the vectors differ in length.
    pub fn build(vectors: &[Vec<f32>]) -> Result<Self> {
        let first = vectors.first().ok_or(QaError::EmptyIndex)?;
        let dimensions = first.len();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dimensions) {
            return Err(QaError::DimensionMismatch { expected: dimensions, actual: bad.len() });
        }

        Ok(Self { vectors: vectors.iter().map(|v| normalized(v)).collect(), dimensions })
    }

    /// Number of indexed vectors, always at least one.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Always `false`; an index cannot be built empty.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimensionality of the indexed vectors.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The `min(k, len)` nearest vectors to `query`, ascending by cosine
    /// distance, ties broken by ascending ordinal.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::DimensionMismatch`] if `query` has the wrong length.
    pub fn query(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>> {
        if query.len() != self.dimensions {
            return Err(QaError::DimensionMismatch {
                expected: self.dimensions,
                actual: query.len(),
            });
        }

        let query = normalized(query);
        let mut neighbors: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(ordinal, vector)| {
                let similarity: f32 = vector.iter().zip(&query).map(|(a, b)| a * b).sum();
                Neighbor { distance: 1.0 - similarity, ordinal }
            })
            .collect();

        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.ordinal.cmp(&b.ordinal)));
        neighbors.truncate(k);
        Ok(neighbors)
    }
}

/// Everything searchable about one loaded document.
///
/// Built once per document and never mutated; loading a new document replaces
/// the whole value.
#[derive(Debug, Clone)]
pub struct DocumentIndex {
    document_id: String,
    page_count: usize,
    chunks: Vec<Chunk>,
    index: SimilarityIndex,
}

impl DocumentIndex {
    /// Pair `chunks` with their embedding `vectors` (same order) and fit the index.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::IndexMismatch`] if the counts differ, plus any error
    /// of [`SimilarityIndex::build`].
    pub fn build(page_count: usize, chunks: Vec<Chunk>, vectors: &[Vec<f32>]) -> Result<Self> {
        if chunks.len() != vectors.len() {
            return Err(QaError::IndexMismatch { chunks: chunks.len(), vectors: vectors.len() });
        }
        let index = SimilarityIndex::build(vectors)?;
        Ok(Self { document_id: Uuid::new_v4().to_string(), page_count, chunks, index })
    }

    /// Identifier assigned when the index was built.
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    /// Number of pages in the source document.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// The indexed chunks, in ordinal order.
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Always `false`; a document index cannot be built empty.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Dimensionality of the embedding vectors.
    pub fn dimensions(&self) -> usize {
        self.index.dimensions()
    }

    /// Nearest chunks to `query`, with their neighbour records.
    ///
    /// # Errors
    ///
    /// Returns [`QaError::DimensionMismatch`] if `query` has the wrong length.
    pub fn nearest(&self, query: &[f32], k: usize) -> Result<Vec<(Neighbor, &Chunk)>> {
        Ok(self
            .index
            .query(query, k)?
            .into_iter()
            .map(|neighbor| (neighbor, &self.chunks[neighbor.ordinal]))
            .collect())
    }
}
