//! Embedding provider abstraction.
//!
//! The knowledge base never talks to a provider directly; it goes through
//! [`Embedder`] so the offline build, the serving path and tests can each
//! plug in their own implementation.

use async_trait::async_trait;

use crate::error::EmbeddingResult;

/// Turns text into fixed-dimension vectors.
///
/// The same provider (and model) must be used to build an index and to embed
/// queries against it; vectors are compared by cosine similarity.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier recorded in the index at build time.
    fn model(&self) -> &str;

    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>>;

    /// Generate embeddings for multiple texts, preserving input order.
    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        // Default implementation calls embed sequentially
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}
