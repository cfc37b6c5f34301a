//! Fixed-size overlapping text windows.
//!
//! Documents are split on blank-line paragraph boundaries and paragraphs are
//! packed greedily into windows of at most `chunk_size` characters. Each new
//! window re-uses the trailing paragraphs of the previous one that fit in
//! `chunk_overlap`. Paragraphs longer than a window are hard-split.
//!
//! Sizes are measured in characters, never bytes, so multi-byte text is
//! never cut inside a code point.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::error::{KnowledgeError, Result};

/// Default window size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 600;

/// Default overlap between consecutive windows in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

const PARAGRAPH_SEPARATOR: &str = "\n\n";

/// Window configuration used at build time (recorded in the index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl ChunkConfig {
    /// Create a validated configuration.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        let config = Self {
            chunk_size,
            chunk_overlap,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that windows are non-empty and the overlap leaves room to advance.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(KnowledgeError::Config {
                reason: "chunk_size must be greater than zero".into(),
            });
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(KnowledgeError::Config {
                reason: format!(
                    "chunk_overlap ({}) must be smaller than chunk_size ({})",
                    self.chunk_overlap, self.chunk_size
                ),
            });
        }
        Ok(())
    }

    fn step(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

/// Split a document into overlapping windows.
///
/// Returns an empty vector for blank input. Assumes `config` is valid.
pub fn split_text(text: &str, config: &ChunkConfig) -> Vec<String> {
    let normalized = text.replace("\r\n", "\n");

    let pieces: Vec<String> = normalized
        .split(PARAGRAPH_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .flat_map(|p| hard_split(p, config))
        .collect();

    merge_pieces(pieces, config)
}

/// Break a single oversized paragraph into fixed windows.
fn hard_split(paragraph: &str, config: &ChunkConfig) -> Vec<String> {
    let chars: Vec<char> = paragraph.chars().collect();
    if chars.len() <= config.chunk_size {
        return vec![paragraph.to_string()];
    }

    let mut windows = Vec::new();
    let mut start = 0;
    loop {
        let end = (start + config.chunk_size).min(chars.len());
        let window: String = chars[start..end].iter().collect();
        let window = window.trim();
        if !window.is_empty() {
            windows.push(window.to_string());
        }
        if end == chars.len() {
            break;
        }
        start += config.step();
    }
    windows
}

/// Greedily pack pieces into windows, carrying an overlap tail forward.
fn merge_pieces(pieces: Vec<String>, config: &ChunkConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: VecDeque<String> = VecDeque::new();

    for piece in pieces {
        let piece_len = char_len(&piece);

        if !current.is_empty() && joined_len(&current) + separator_len() + piece_len > config.chunk_size
        {
            chunks.push(join(&current));

            while !current.is_empty()
                && (joined_len(&current) > config.chunk_overlap
                    || joined_len(&current) + separator_len() + piece_len > config.chunk_size)
            {
                current.pop_front();
            }
        }

        current.push_back(piece);
    }

    if !current.is_empty() {
        chunks.push(join(&current));
    }

    chunks
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn separator_len() -> usize {
    PARAGRAPH_SEPARATOR.len()
}

fn joined_len(pieces: &VecDeque<String>) -> usize {
    let text: usize = pieces.iter().map(|p| char_len(p)).sum();
    text + separator_len() * pieces.len().saturating_sub(1)
}

fn join(pieces: &VecDeque<String>) -> String {
    pieces
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(PARAGRAPH_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(size: usize, overlap: usize) -> ChunkConfig {
        ChunkConfig::new(size, overlap).unwrap()
    }

    #[test]
    fn test_short_text_is_single_chunk() {
        let chunks = split_text("Call 112 and stay calm.", &ChunkConfig::default());
        assert_eq!(chunks, vec!["Call 112 and stay calm.".to_string()]);
    }

    #[test]
    fn test_blank_text_has_no_chunks() {
        assert!(split_text("  \n\n   \n\n", &ChunkConfig::default()).is_empty());
    }

    #[test]
    fn test_paragraphs_are_packed_up_to_window_size() {
        let text = "aaaa\n\nbbbb\n\ncccc";
        // "aaaa\n\nbbbb" is 10 chars, adding "cccc" would make 16
        let chunks = split_text(text, &config(12, 0));
        assert_eq!(chunks, vec!["aaaa\n\nbbbb".to_string(), "cccc".to_string()]);
    }

    #[test]
    fn test_overlap_carries_trailing_paragraph() {
        let text = "aaaa\n\nbbbb\n\ncccc";
        let chunks = split_text(text, &config(10, 4));
        assert_eq!(
            chunks,
            vec!["aaaa\n\nbbbb".to_string(), "bbbb\n\ncccc".to_string()]
        );
    }

    #[test]
    fn test_long_paragraph_is_hard_split_with_overlap() {
        let text = "abcdefghijklmnopqrstuvwxyz";
        let chunks = split_text(text, &config(10, 3));

        assert_eq!(chunks[0], "abcdefghij");
        assert_eq!(chunks[1], "hijklmnopq");
        assert!(chunks.iter().all(|c| c.chars().count() <= 10));
        assert!(chunks.last().unwrap().ends_with('z'));
    }

    #[test]
    fn test_multibyte_text_is_split_on_char_boundaries() {
        let text = "Białystok źródło żółw ".repeat(20);
        let chunks = split_text(&text, &config(25, 5));

        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 25));
    }

    #[test]
    fn test_crlf_paragraphs_are_recognised() {
        let chunks = split_text("first\r\n\r\nsecond", &config(6, 0));
        assert_eq!(chunks, vec!["first".to_string(), "second".to_string()]);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        assert!(ChunkConfig::new(0, 0).is_err());
        assert!(ChunkConfig::new(50, 50).is_err());
        assert!(ChunkConfig::new(50, 80).is_err());
        assert!(ChunkConfig::new(600, 50).is_ok());
    }
}
