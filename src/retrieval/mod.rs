//! The retrieval collaborator contract: turning a document reference into a
//! queryable similarity index, and fetching the most similar chunks.

pub mod lexical;

pub use lexical::LexicalRetriever;

use crate::error::RetrievalError;

/// Number of chunks a retrieval node asks for.
pub const TOP_K: usize = 4;

/// A chunk of document text returned by a similarity search, with the
/// document reference it came from and its similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub text: String,
    pub source: String,
    pub score: f32,
}

/// A queryable similarity index over one document.
pub trait SimilarityIndex {
    /// Returns up to `k` chunks in descending similarity order.
    fn search(&self, query: &str, k: usize) -> Vec<ScoredChunk>;
}

impl std::fmt::Debug for dyn SimilarityIndex + '_ {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn SimilarityIndex")
    }
}

/// Produces (or reloads) a similarity index for a document reference.
///
/// The engine treats any failure here as local to the retrieval node: the
/// node deactivates itself and the rest of the run proceeds.
pub trait Retriever {
    fn open(&self, document: &str) -> Result<Box<dyn SimilarityIndex>, RetrievalError>;
}
