//! Serving-side knowledge base.
//!
//! Wraps a loaded [`KnowledgeIndex`] and the embedder used to query it.
//! Search never fails outward: a missing index or a provider outage yields
//! [`UNAVAILABLE_SENTINEL`] so the conversation can carry on.

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{KnowledgeError, Result};
use crate::index::{KnowledgeIndex, SearchHit};
use crate::traits::Embedder;

/// Returned by [`KnowledgeBase::search`] whenever the index cannot be queried.
pub const UNAVAILABLE_SENTINEL: &str = "Error: the knowledge base is not available.";

/// Default number of chunks returned per query.
pub const DEFAULT_TOP_K: usize = 2;

const RESULT_SEPARATOR: &str = "\n\n";

#[derive(Clone)]
enum IndexState {
    Ready {
        index: Arc<KnowledgeIndex>,
        embedder: Arc<dyn Embedder>,
    },
    Unavailable {
        reason: String,
    },
}

/// Read-only semantic search over guideline chunks.
///
/// Cheap to clone; the index is shared and never mutated after load.
#[derive(Clone)]
pub struct KnowledgeBase {
    state: IndexState,
}

impl KnowledgeBase {
    /// Serve an already built index.
    pub fn new(index: KnowledgeIndex, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            state: IndexState::Ready {
                index: Arc::new(index),
                embedder,
            },
        }
    }

    /// A knowledge base that answers every query with the sentinel.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            state: IndexState::Unavailable {
                reason: reason.into(),
            },
        }
    }

    /// Load the index artifact at `dir`.
    ///
    /// Never fails: a missing or invalid artifact, a missing embedder, or an
    /// embedder for a different model all produce an unavailable knowledge base.
    pub fn load(dir: &Path, embedder: Option<Arc<dyn Embedder>>) -> Self {
        let Some(embedder) = embedder else {
            warn!("No embedding provider configured, knowledge base disabled");
            return Self::unavailable("no embedding provider configured");
        };

        match KnowledgeIndex::load(dir) {
            Ok(index) if index.embedding_model() != embedder.model() => {
                warn!(
                    index_model = index.embedding_model(),
                    embedder_model = embedder.model(),
                    "Knowledge index was built with a different embedding model"
                );
                Self::unavailable(format!(
                    "index built with {}, serving with {}",
                    index.embedding_model(),
                    embedder.model()
                ))
            }
            Ok(index) => {
                info!(
                    path = %dir.display(),
                    chunks = index.len(),
                    built_at = %index.built_at(),
                    "Knowledge base loaded and ready"
                );
                Self::new(index, embedder)
            }
            Err(KnowledgeError::IndexNotFound { path }) => {
                warn!(
                    path = %path.display(),
                    "Knowledge index not found, run build_knowledge first"
                );
                Self::unavailable("index has not been built")
            }
            Err(e) => {
                warn!(path = %dir.display(), error = %e, "Failed to load knowledge index");
                Self::unavailable(e.to_string())
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.state, IndexState::Ready { .. })
    }

    /// Why the knowledge base is unavailable, if it is.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            IndexState::Ready { .. } => None,
            IndexState::Unavailable { reason } => Some(reason),
        }
    }

    /// Number of indexed chunks (zero when unavailable).
    pub fn chunk_count(&self) -> usize {
        match &self.state {
            IndexState::Ready { index, .. } => index.len(),
            IndexState::Unavailable { .. } => 0,
        }
    }

    /// Typed search: the `k` closest chunks, most similar first.
    pub async fn search_hits(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        let (index, embedder) = match &self.state {
            IndexState::Ready { index, embedder } => (index, embedder),
            IndexState::Unavailable { reason } => {
                return Err(KnowledgeError::Unavailable {
                    reason: reason.clone(),
                })
            }
        };

        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = embedder.embed(query).await?;
        if query_embedding.len() != index.dimension() {
            return Err(KnowledgeError::InvalidIndex {
                reason: format!(
                    "query embedding has dimension {} (index has {})",
                    query_embedding.len(),
                    index.dimension()
                ),
            });
        }

        Ok(index.nearest(&query_embedding, k))
    }

    /// Search and join the matching chunk texts with a blank line.
    ///
    /// Returns [`UNAVAILABLE_SENTINEL`] instead of an error.
    pub async fn search(&self, query: &str, k: usize) -> String {
        match self.search_hits(query, k).await {
            Ok(hits) => hits
                .into_iter()
                .map(|hit| hit.text)
                .collect::<Vec<_>>()
                .join(RESULT_SEPARATOR),
            Err(e) => {
                warn!(error = %e, "Guideline search unavailable");
                UNAVAILABLE_SENTINEL.to_string()
            }
        }
    }
}

impl std::fmt::Debug for KnowledgeBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeBase")
            .field("available", &self.is_available())
            .field("chunks", &self.chunk_count())
            .field("unavailable_reason", &self.unavailable_reason())
            .finish()
    }
}
