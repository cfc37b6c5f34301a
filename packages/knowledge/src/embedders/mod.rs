//! Embedding provider implementations.
//!
//! Available providers:
//! - `OpenAIEmbedder` - OpenAI `/embeddings` endpoint (requires `openai` feature)

#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "openai")]
pub use openai::OpenAIEmbedder;
