//! The embedded chunk index and its on-disk artifact.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::chunking::ChunkConfig;
use crate::error::{KnowledgeError, Result};

/// File name of the serialized index inside the index directory.
pub const INDEX_FILE: &str = "index.json";

/// Artifact format version.
pub const INDEX_VERSION: u32 = 1;

/// A window of guideline text with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    /// Relative path of the source document
    pub source: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

/// A chunk returned by a nearest-neighbour query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub source: String,
    pub text: String,
    /// Cosine similarity to the query (higher is closer)
    pub score: f32,
}

/// Immutable set of embedded chunks, built offline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeIndex {
    version: u32,
    embedding_model: String,
    dimension: usize,
    #[serde(flatten)]
    chunk_config: ChunkConfig,
    corpus_hash: String,
    built_at: DateTime<Utc>,
    chunks: Vec<KnowledgeChunk>,
}

impl KnowledgeIndex {
    /// Assemble an index, checking that every vector has the same dimension.
    pub fn new(
        embedding_model: impl Into<String>,
        chunk_config: ChunkConfig,
        corpus_hash: impl Into<String>,
        chunks: Vec<KnowledgeChunk>,
    ) -> Result<Self> {
        let dimension = chunks
            .first()
            .map(|c| c.embedding.len())
            .ok_or(KnowledgeError::NoChunks)?;

        let index = Self {
            version: INDEX_VERSION,
            embedding_model: embedding_model.into(),
            dimension,
            chunk_config,
            corpus_hash: corpus_hash.into(),
            built_at: Utc::now(),
            chunks,
        };
        index.validate()?;
        Ok(index)
    }

    fn validate(&self) -> Result<()> {
        if self.version != INDEX_VERSION {
            return Err(KnowledgeError::InvalidIndex {
                reason: format!(
                    "unsupported index version {} (expected {})",
                    self.version, INDEX_VERSION
                ),
            });
        }
        if self.dimension == 0 {
            return Err(KnowledgeError::InvalidIndex {
                reason: "embedding dimension is zero".into(),
            });
        }
        if let Some((i, chunk)) = self
            .chunks
            .iter()
            .enumerate()
            .find(|(_, c)| c.embedding.len() != self.dimension)
        {
            return Err(KnowledgeError::InvalidIndex {
                reason: format!(
                    "chunk {} from {} has dimension {} (expected {})",
                    i,
                    chunk.source,
                    chunk.embedding.len(),
                    self.dimension
                ),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunks(&self) -> &[KnowledgeChunk] {
        &self.chunks
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn chunk_config(&self) -> ChunkConfig {
        self.chunk_config
    }

    pub fn corpus_hash(&self) -> &str {
        &self.corpus_hash
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Return up to `k` chunks ordered by descending cosine similarity.
    ///
    /// Equal scores keep index order.
    pub fn nearest(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| {
                let score = cosine_similarity(query, &chunk.embedding);
                // Non-finite vectors score NaN; rank them last.
                (i, if score.is_nan() { f32::NEG_INFINITY } else { score })
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, score)| {
                let chunk = &self.chunks[i];
                SearchHit {
                    source: chunk.source.clone(),
                    text: chunk.text.clone(),
                    score,
                }
            })
            .collect()
    }

    /// Write the index into `dir`, replacing any previous artifact.
    ///
    /// The file is written to a temporary name and renamed into place so a
    /// reader never observes a partial index.
    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| KnowledgeError::io(dir, e))?;

        let final_path = dir.join(INDEX_FILE);
        let tmp_path = dir.join(format!("{}.tmp", INDEX_FILE));

        let json = serde_json::to_vec(self)?;
        fs::write(&tmp_path, json).map_err(|e| KnowledgeError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &final_path).map_err(|e| KnowledgeError::io(&final_path, e))?;

        info!(
            path = %final_path.display(),
            chunks = self.len(),
            dimension = self.dimension,
            "Knowledge index saved"
        );
        Ok(())
    }

    /// Load and validate an index previously written by [`save`](Self::save).
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(INDEX_FILE);
        if !path.exists() {
            return Err(KnowledgeError::IndexNotFound { path });
        }

        let bytes = fs::read(&path).map_err(|e| KnowledgeError::io(&path, e))?;
        let index: Self = serde_json::from_slice(&bytes)?;
        index.validate()?;

        debug!(
            path = %path.display(),
            chunks = index.len(),
            model = %index.embedding_model,
            corpus_hash = %index.corpus_hash,
            "Knowledge index loaded"
        );
        Ok(index)
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 for empty or mismatched vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str, embedding: Vec<f32>) -> KnowledgeChunk {
        KnowledgeChunk {
            source: "test.txt".into(),
            text: text.into(),
            embedding,
        }
    }

    fn sample_index() -> KnowledgeIndex {
        KnowledgeIndex::new(
            "mock",
            ChunkConfig::default(),
            "hash",
            vec![
                chunk("x", vec![1.0, 0.0, 0.0]),
                chunk("y", vec![0.0, 1.0, 0.0]),
                chunk("xy", vec![0.7, 0.7, 0.0]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 0.001);

        let c = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &c).abs() < 0.001);

        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0, 0.0], &a), 0.0);
    }

    #[test]
    fn test_nearest_orders_by_descending_similarity() {
        let index = sample_index();
        let hits = index.nearest(&[0.9, 0.1, 0.0], 3);

        let texts: Vec<_> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["x", "xy", "y"]);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_nearest_truncates_to_k() {
        let index = sample_index();
        assert_eq!(index.nearest(&[1.0, 0.0, 0.0], 2).len(), 2);
        assert!(index.nearest(&[1.0, 0.0, 0.0], 0).is_empty());
        assert_eq!(index.nearest(&[1.0, 0.0, 0.0], 10).len(), 3);
    }

    #[test]
    fn test_non_finite_embeddings_rank_last() {
        let index = KnowledgeIndex::new(
            "mock",
            ChunkConfig::default(),
            "hash",
            vec![
                chunk("broken", vec![f32::INFINITY, 0.0, 0.0]),
                chunk("y", vec![0.0, 1.0, 0.0]),
                chunk("nan", vec![f32::NAN, 1.0, 0.0]),
                chunk("x", vec![1.0, 0.0, 0.0]),
            ],
        )
        .unwrap();

        let hits = index.nearest(&[0.9, 0.1, 0.0], 4);
        let texts: Vec<_> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["x", "y", "broken", "nan"]);
    }

    #[test]
    fn test_ties_keep_index_order() {
        let index = KnowledgeIndex::new(
            "mock",
            ChunkConfig::default(),
            "hash",
            vec![
                chunk("first", vec![1.0, 0.0]),
                chunk("second", vec![1.0, 0.0]),
            ],
        )
        .unwrap();

        let hits = index.nearest(&[1.0, 0.0], 2);
        assert_eq!(hits[0].text, "first");
        assert_eq!(hits[1].text, "second");
    }

    #[test]
    fn test_mismatched_dimensions_are_rejected() {
        let result = KnowledgeIndex::new(
            "mock",
            ChunkConfig::default(),
            "hash",
            vec![chunk("a", vec![1.0, 0.0]), chunk("b", vec![1.0])],
        );
        assert!(matches!(result, Err(KnowledgeError::InvalidIndex { .. })));
    }

    #[test]
    fn test_empty_index_is_rejected() {
        let result = KnowledgeIndex::new("mock", ChunkConfig::default(), "hash", vec![]);
        assert!(matches!(result, Err(KnowledgeError::NoChunks)));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let index = sample_index();
        index.save(dir.path()).unwrap();

        let loaded = KnowledgeIndex::load(dir.path()).unwrap();
        assert_eq!(loaded.chunks(), index.chunks());
        assert_eq!(loaded.embedding_model(), "mock");
        assert_eq!(loaded.chunk_config(), ChunkConfig::default());
        assert!(!dir.path().join("index.json.tmp").exists());
    }

    #[test]
    fn test_load_missing_index() {
        let dir = tempfile::tempdir().unwrap();
        let result = KnowledgeIndex::load(&dir.path().join("nothing-here"));
        assert!(matches!(result, Err(KnowledgeError::IndexNotFound { .. })));
    }

    #[test]
    fn test_load_corrupt_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_FILE), b"{not json").unwrap();
        assert!(matches!(
            KnowledgeIndex::load(dir.path()),
            Err(KnowledgeError::Json(_))
        ));
    }
}
