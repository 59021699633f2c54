//! Core trait for embedding models.

use anyhow::Result;

/// A loaded embedding model that turns text into fixed-size vectors.
///
/// Implementations are read-only after construction and shared across
/// callers, hence the `Send + Sync` bound.
pub trait EmbeddingModel: Send + Sync {
    /// Encode a batch of texts in a single call.
    ///
    /// Must return exactly one vector per input, in input order, each of
    /// length [`dimension`](Self::dimension).
    fn encode(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Get the embedding dimension.
    fn dimension(&self) -> usize;

    /// Get the model name.
    fn model_name(&self) -> &str;
}
