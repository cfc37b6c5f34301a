//! Testing utilities including mock implementations.
//!
//! Useful for exercising the build and search paths without calling a real
//! embedding provider.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::{EmbeddingError, EmbeddingResult};
use crate::traits::Embedder;

/// Default dimension of mock vectors.
pub const MOCK_EMBEDDING_DIM: usize = 256;

/// A deterministic embedder for tests.
///
/// Texts are embedded as hashed bag-of-words vectors, so texts that share
/// words are more similar than texts that don't. Predefined vectors take
/// precedence over the hashed ones.
pub struct MockEmbedder {
    model: String,
    dimension: usize,
    predefined: HashMap<String, Vec<f32>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            model: "mock-embedding".to_string(),
            dimension: MOCK_EMBEDDING_DIM,
            predefined: HashMap::new(),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// Set the embedding dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Set the reported model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Add a predefined embedding for an exact text.
    pub fn with_embedding(mut self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.predefined.insert(text.into(), embedding);
        self
    }

    /// Start in failing mode (every call returns a network error).
    pub fn failing(self) -> Self {
        self.set_failing(true);
        self
    }

    /// Toggle failing mode after construction.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `embed` calls made so far.
    pub fn embed_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn hashed(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for word in text
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.failing.load(Ordering::SeqCst) {
            return Err(EmbeddingError::Network("mock embedder is offline".into()));
        }

        Ok(self
            .predefined
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.hashed(text)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::cosine_similarity;

    #[tokio::test]
    async fn test_shared_words_are_more_similar() {
        let embedder = MockEmbedder::new();
        let bleeding = embedder.embed("apply pressure to stop bleeding").await.unwrap();
        let query = embedder.embed("how to stop bleeding").await.unwrap();
        let burns = embedder.embed("cool burns under water").await.unwrap();

        assert!(cosine_similarity(&query, &bleeding) > cosine_similarity(&query, &burns));
    }

    #[tokio::test]
    async fn test_predefined_and_failing() {
        let embedder = MockEmbedder::new().with_embedding("fixed", vec![1.0, 2.0]);
        assert_eq!(embedder.embed("fixed").await.unwrap(), vec![1.0, 2.0]);

        embedder.set_failing(true);
        assert!(embedder.embed("fixed").await.is_err());
        assert_eq!(embedder.embed_calls(), 2);
    }
}
