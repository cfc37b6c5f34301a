//! OpenAI implementation of the [`Embedder`] trait.
//!
//! # Example
//!
//! ```rust,ignore
//! use knowledge::embedders::OpenAIEmbedder;
//!
//! let embedder = OpenAIEmbedder::from_env()?.with_model("text-embedding-3-small");
//! let vector = embedder.embed("how to perform CPR on an adult").await?;
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EmbeddingError, EmbeddingResult};
use crate::traits::Embedder;

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// Inputs sent per request when embedding a batch.
const MAX_BATCH_INPUTS: usize = 64;

/// OpenAI-backed embedder.
#[derive(Clone)]
pub struct OpenAIEmbedder {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAIEmbedder {
    /// Create a new embedder with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_EMBEDDING_MODEL.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> EmbeddingResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| EmbeddingError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set the embedding model (default: text-embedding-3-small).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request(&self, inputs: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&EmbeddingRequest {
                model: &self.model,
                input: inputs,
            })
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Embedding request failed");
                EmbeddingError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "OpenAI embedding error");
            return Err(EmbeddingError::Api(format!(
                "OpenAI embedding error ({}): {}",
                status, error_text
            )));
        }

        let mut body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Parse(e.to_string()))?;

        if body.data.len() != inputs.len() {
            return Err(EmbeddingError::Parse(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                body.data.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);

        debug!(
            model = %self.model,
            inputs = inputs.len(),
            duration_ms = start.elapsed().as_millis(),
            "OpenAI embeddings"
        );

        Ok(body.data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Vec<f32>> {
        self.request(&[text])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::Api("No embedding from OpenAI".into()))
    }

    async fn embed_batch(&self, texts: &[&str]) -> EmbeddingResult<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(MAX_BATCH_INPUTS) {
            results.extend(self.request(batch).await?);
        }
        Ok(results)
    }
}
