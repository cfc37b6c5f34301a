//! Offline index construction.
//!
//! Not on the serving path: any failure here aborts the build, because a
//! partially embedded index is never acceptable.

use std::fs;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::info;
use walkdir::WalkDir;

use crate::chunking::{split_text, ChunkConfig};
use crate::error::{KnowledgeError, Result};
use crate::index::{KnowledgeChunk, KnowledgeIndex};
use crate::traits::Embedder;

/// A guideline document loaded from the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Path relative to the corpus root
    pub source: String,
    pub text: String,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
        }
    }
}

/// Load every `*.txt` file under `dir` (recursively), in path order.
pub fn load_corpus(dir: &Path) -> Result<Vec<Document>> {
    if !dir.is_dir() {
        return Err(KnowledgeError::CorpusNotFound {
            path: dir.to_path_buf(),
        });
    }

    let mut documents = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("txt")
        {
            continue;
        }

        let text = fs::read_to_string(path).map_err(|e| KnowledgeError::io(path, e))?;
        let source = path
            .strip_prefix(dir)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        documents.push(Document::new(source, text));
    }

    if documents.is_empty() {
        return Err(KnowledgeError::EmptyCorpus {
            path: dir.to_path_buf(),
        });
    }

    info!(path = %dir.display(), documents = documents.len(), "Loaded guideline corpus");
    Ok(documents)
}

/// Stable fingerprint of the corpus contents.
pub fn corpus_hash(documents: &[Document]) -> String {
    let mut hasher = Sha256::new();
    for doc in documents {
        hasher.update(doc.source.as_bytes());
        hasher.update([0u8]);
        hasher.update(doc.text.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

/// Chunk and embed `documents` into a new index.
pub async fn build_index(
    documents: &[Document],
    embedder: &dyn Embedder,
    config: ChunkConfig,
) -> Result<KnowledgeIndex> {
    config.validate()?;

    let windows: Vec<(String, String)> = documents
        .iter()
        .flat_map(|doc| {
            split_text(&doc.text, &config)
                .into_iter()
                .map(move |text| (doc.source.clone(), text))
        })
        .collect();

    if windows.is_empty() {
        return Err(KnowledgeError::NoChunks);
    }

    info!(
        chunks = windows.len(),
        chunk_size = config.chunk_size,
        chunk_overlap = config.chunk_overlap,
        model = embedder.model(),
        "Generating embeddings"
    );

    let texts: Vec<&str> = windows.iter().map(|(_, text)| text.as_str()).collect();
    let embeddings = embedder.embed_batch(&texts).await?;

    if embeddings.len() != windows.len() {
        return Err(KnowledgeError::InvalidIndex {
            reason: format!(
                "provider returned {} embeddings for {} chunks",
                embeddings.len(),
                windows.len()
            ),
        });
    }

    let chunks = windows
        .into_iter()
        .zip(embeddings)
        .map(|((source, text), embedding)| KnowledgeChunk {
            source,
            text,
            embedding,
        })
        .collect();

    KnowledgeIndex::new(embedder.model(), config, corpus_hash(documents), chunks)
}

/// Load the corpus at `knowledge_dir`, build the index and write it to `output_dir`.
pub async fn build_from_dir(
    knowledge_dir: &Path,
    output_dir: &Path,
    embedder: &dyn Embedder,
    config: ChunkConfig,
) -> Result<KnowledgeIndex> {
    let documents = load_corpus(knowledge_dir)?;
    let index = build_index(&documents, embedder, config).await?;
    index.save(output_dir)?;
    Ok(index)
}
