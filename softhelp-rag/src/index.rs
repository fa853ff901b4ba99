//! In-memory vector index with copy-on-rebuild sharing.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};

/// An immutable cosine-similarity index over embedded chunks.
///
/// Built in one piece from the embedded corpus and queried read-only; a
/// corpus change produces a whole new index (see [`SharedIndex`]).
#[derive(Debug, Default)]
pub struct VectorIndex {
    chunks: Vec<Chunk>,
    dimensions: usize,
}

impl VectorIndex {
    /// Build an index over chunks that already carry embeddings.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a chunk is missing its embedding or
    /// the embedding dimensions are inconsistent.
    pub fn build(chunks: Vec<Chunk>) -> Result<Self> {
        let mut dimensions = 0usize;
        for chunk in &chunks {
            if chunk.embedding.is_empty() {
                return Err(RagError::Config(format!("chunk '{}' has no embedding", chunk.id)));
            }
            if dimensions == 0 {
                dimensions = chunk.embedding.len();
            } else if chunk.embedding.len() != dimensions {
                return Err(RagError::Config(format!(
                    "chunk '{}' embedding dimension {} does not match index dimension {dimensions}",
                    chunk.id,
                    chunk.embedding.len(),
                )));
            }
        }
        Ok(Self { chunks, dimensions })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Dimensionality of the indexed embeddings (0 when empty).
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Return the `top_k` most similar chunks to the query embedding.
    ///
    /// Results are ordered by descending cosine similarity; equal scores
    /// keep corpus order (stable sort). Fewer than `top_k` indexed chunks
    /// returns all of them.
    pub fn search(&self, query_embedding: &[f32], top_k: usize) -> Vec<SearchResult> {
        let mut scored: Vec<SearchResult> = self
            .chunks
            .iter()
            .map(|chunk| SearchResult {
                chunk: chunk.clone(),
                score: cosine_similarity(&chunk.embedding, query_embedding),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        scored
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// A shareable handle to the current [`VectorIndex`].
///
/// Readers take a cheap snapshot and keep it for the whole request; a
/// rebuild swaps the replacement in without invalidating snapshots already
/// handed out.
#[derive(Clone, Default)]
pub struct SharedIndex {
    inner: Arc<RwLock<Arc<VectorIndex>>>,
}

impl SharedIndex {
    /// Create a handle holding an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// The current index snapshot.
    pub async fn snapshot(&self) -> Arc<VectorIndex> {
        self.inner.read().await.clone()
    }

    /// Replace the current index.
    pub async fn swap(&self, index: VectorIndex) {
        let mut guard = self.inner.write().await;
        *guard = Arc::new(index);
    }
}
