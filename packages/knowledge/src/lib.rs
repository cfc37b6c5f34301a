//! Emergency guideline knowledge base
//!
//! Offline, a corpus of guideline documents is split into overlapping
//! windows, embedded, and written to disk as a [`KnowledgeIndex`]. At serving
//! time the index is loaded read-only into a [`KnowledgeBase`] and queried by
//! cosine similarity.
//!
//! # Usage
//!
//! ```rust,ignore
//! use knowledge::{build_from_dir, ChunkConfig, KnowledgeBase};
//! use knowledge::embedders::OpenAIEmbedder;
//!
//! // Offline
//! let embedder = OpenAIEmbedder::from_env()?;
//! build_from_dir("knowledge".as_ref(), "local_knowledge_index".as_ref(), &embedder, ChunkConfig::default()).await?;
//!
//! // Serving
//! let kb = KnowledgeBase::load("local_knowledge_index".as_ref(), Some(Arc::new(embedder)));
//! let guidance = kb.search("how to stop bleeding", 2).await;
//! ```
//!
//! # Modules
//!
//! - [`chunking`] - Overlapping text windows
//! - [`index`] - Embedded chunk index and artifact persistence
//! - [`builder`] - Offline corpus loading and index construction
//! - [`base`] - Serving-side search with graceful degradation
//! - [`embedders`] - Embedding provider implementations
//! - [`testing`] - Mock implementations for testing

pub mod base;
pub mod builder;
pub mod chunking;
pub mod embedders;
pub mod error;
pub mod index;
pub mod testing;
pub mod traits;

pub use base::{KnowledgeBase, DEFAULT_TOP_K, UNAVAILABLE_SENTINEL};
pub use builder::{build_from_dir, build_index, corpus_hash, load_corpus, Document};
pub use chunking::{split_text, ChunkConfig, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use error::{EmbeddingError, EmbeddingResult, KnowledgeError, Result};
pub use index::{cosine_similarity, KnowledgeChunk, KnowledgeIndex, SearchHit, INDEX_FILE};
pub use traits::Embedder;

#[cfg(feature = "openai")]
pub use embedders::OpenAIEmbedder;

pub use testing::MockEmbedder;
