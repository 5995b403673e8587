//! Scored document types for search results.

use crate::document::Document;
use std::sync::Arc;

/// A document with an associated relevance score from a vector search.
///
/// The `score` is the raw output of the store's [`SimilarityFunction`](super::SimilarityFunction):
/// higher is always more similar, but the range depends on the function.
#[derive(Debug, Clone)]
pub struct ScoredDocument {
    /// The matched document (shared with the store, never mutated through this handle).
    pub document: Arc<Document>,
    /// Raw similarity score.
    pub score: f32,
}

impl ScoredDocument {
    /// Owned copy of the document with `score` filled in.
    pub fn into_document(self) -> Document {
        let mut doc = Arc::unwrap_or_clone(self.document);
        doc.score = Some(self.score);
        doc
    }
}
