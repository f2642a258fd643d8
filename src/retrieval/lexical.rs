//! Default retrieval collaborator: a lexical (term-frequency, cosine-ranked)
//! similarity index over a plain-text document, persisted to disk so repeated
//! runs over the same document reuse the index.

use super::{Retriever, ScoredChunk, SimilarityIndex};
use crate::error::RetrievalError;
use ahash::AHashMap;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

const CHUNK_SIZE: usize = 400;
const CHUNK_OVERLAP: usize = 100;

/// Retriever rooted at a data directory. Document references resolve to
/// files under the root; each distinct reference gets one persisted index
/// (`index_<sanitized>.bin`) beside it.
#[derive(Debug, Clone)]
pub struct LexicalRetriever {
    root: PathBuf,
}

impl LexicalRetriever {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn index_path(&self, reference: &str) -> PathBuf {
        self.root
            .join(format!("index_{}.bin", sanitize_reference(reference)))
    }

    /// Deletes every persisted index under the root.
    pub fn clear_indexes(&self) -> std::io::Result<()> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e),
        };
        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("index_") && name.ends_with(".bin") {
                fs::remove_file(entry.path())?;
            }
        }
        Ok(())
    }

    fn build_index(&self, reference: &str) -> Result<LexicalIndex, RetrievalError> {
        let doc_path = self.root.join(reference);
        let text =
            fs::read_to_string(&doc_path).map_err(|e| RetrievalError::DocumentLoad {
                reference: reference.to_string(),
                message: format!("{}: {}", doc_path.display(), e),
            })?;
        debug!(reference, chars = text.len(), "building new index");

        let chunks = chunk_text(&text, CHUNK_SIZE, CHUNK_OVERLAP)
            .into_iter()
            .map(|chunk| IndexedChunk {
                terms: term_frequencies(&chunk),
                text: chunk,
            })
            .collect();
        Ok(LexicalIndex {
            source: reference.to_string(),
            chunks,
        })
    }
}

impl Retriever for LexicalRetriever {
    fn open(&self, document: &str) -> Result<Box<dyn SimilarityIndex>, RetrievalError> {
        let index_path = self.index_path(document);
        if let Ok(bytes) = fs::read(&index_path) {
            if let Ok((index, _)) = decode_from_slice::<LexicalIndex, _>(&bytes, standard()) {
                debug!(reference = document, path = %index_path.display(), "reusing persisted index");
                return Ok(Box::new(index));
            }
            // Unreadable index: rebuild below and overwrite.
        }

        let index = self.build_index(document)?;
        let bytes = encode_to_vec(&index, standard()).map_err(|e| RetrievalError::Index {
            reference: document.to_string(),
            message: e.to_string(),
        })?;
        fs::write(&index_path, bytes).map_err(|e| RetrievalError::Index {
            reference: document.to_string(),
            message: e.to_string(),
        })?;
        Ok(Box::new(index))
    }
}

/// A persisted similarity index: the document's chunks with their term
/// vectors.
#[derive(Debug, Serialize, Deserialize)]
pub struct LexicalIndex {
    source: String,
    chunks: Vec<IndexedChunk>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IndexedChunk {
    text: String,
    terms: AHashMap<String, f32>,
}

impl SimilarityIndex for LexicalIndex {
    fn search(&self, query: &str, k: usize) -> Vec<ScoredChunk> {
        let query_terms = term_frequencies(query);
        let mut scored: Vec<ScoredChunk> = self
            .chunks
            .iter()
            .map(|chunk| ScoredChunk {
                text: chunk.text.clone(),
                source: self.source.clone(),
                score: cosine_similarity(&query_terms, &chunk.terms),
            })
            .collect();
        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }
}

/// Deterministic, filesystem-safe key for a document reference: extension
/// stripped, everything outside [word, '-'] replaced by '_'.
pub fn sanitize_reference(reference: &str) -> String {
    let stem = reference
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(reference);
    stem.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Splits text into fixed-size chunks with overlap, on char boundaries.
fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return Vec::new();
    }
    let step = size.saturating_sub(overlap).max(1);
    let mut chunks = Vec::new();
    let mut start = 0;
    while start < chars.len() {
        let end = (start + size).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }
    chunks
}

fn term_frequencies(text: &str) -> AHashMap<String, f32> {
    let mut terms: AHashMap<String, f32> = AHashMap::new();
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        *terms.entry(token.to_lowercase()).or_insert(0.0) += 1.0;
    }
    terms
}

fn cosine_similarity(a: &AHashMap<String, f32>, b: &AHashMap<String, f32>) -> f32 {
    let dot: f32 = a
        .iter()
        .filter_map(|(term, weight)| b.get(term).map(|other| weight * other))
        .sum();
    let norm_a: f32 = a.values().map(|w| w * w).sum::<f32>().sqrt();
    let norm_b: f32 = b.values().map(|w| w * w).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_strips_extension_and_special_chars() {
        assert_eq!(sanitize_reference("notes v2.txt"), "notes_v2");
        assert_eq!(sanitize_reference("plain"), "plain");
        assert_eq!(sanitize_reference("a/b.md"), "a_b");
    }

    #[test]
    fn chunks_overlap_by_the_configured_amount() {
        let text = "a".repeat(1000);
        let chunks = chunk_text(&text, 400, 100);
        assert_eq!(chunks[0].chars().count(), 400);
        // Step is 300, so the second chunk starts inside the first.
        assert_eq!(chunks[1].chars().count(), 400);
        assert!(chunks.len() >= 3);
    }

    #[test]
    fn cosine_ranks_matching_text_higher() {
        let query = term_frequencies("rust workflow engine");
        let close = term_frequencies("a workflow engine written in rust");
        let far = term_frequencies("recipe for banana bread");
        assert!(cosine_similarity(&query, &close) > cosine_similarity(&query, &far));
    }

    #[test]
    fn empty_query_scores_zero() {
        let empty = term_frequencies("");
        let chunk = term_frequencies("some text");
        assert_eq!(cosine_similarity(&empty, &chunk), 0.0);
    }
}
