//! Storage layer: the document store interface, its embedding-search capability,
//! and the in-memory implementation.
//!
//! Documents live in-memory in named [`Collection`]s grouped by a process-wide
//! [`Database`]. An [`InMemoryDocumentStore`] is a handle onto one collection plus a
//! fixed similarity function; two stores with the same index name share documents.

/// Collection and database data structures.
pub mod collection;
/// In-memory document store with exact vector search.
pub mod in_memory;

pub use collection::{shared_database, Collection, Database};
pub use in_memory::InMemoryDocumentStore;

use crate::document::Document;
use crate::error::{ConfigurationError, DocumentStoreError};
use crate::filter_types::FilterExpr;
use crate::search::{ScoredDocument, SimilarityFunction};
use crate::serialization::Component;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How a write resolves an id that is already stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Replace the stored document, keeping its position in insertion order.
    Overwrite,
    /// Keep the stored document and move on without error.
    Skip,
    /// Abort the rest of the batch with [`DocumentStoreError::DuplicateDocument`].
    #[default]
    Fail,
}

impl FromStr for DuplicatePolicy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overwrite" => Ok(DuplicatePolicy::Overwrite),
            "skip" => Ok(DuplicatePolicy::Skip),
            "fail" => Ok(DuplicatePolicy::Fail),
            other => Err(ConfigurationError::UnknownDuplicatePolicy(other.to_string())),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DuplicatePolicy::Overwrite => "overwrite",
            DuplicatePolicy::Skip => "skip",
            DuplicatePolicy::Fail => "fail",
        })
    }
}

/// Operations every document store offers, whatever its storage medium.
///
/// Stores are components: their description is what a retriever embeds when it
/// describes itself.
pub trait DocumentStore: Component {
    /// Number of stored documents.
    fn count_documents(&self) -> usize;

    /// Documents matching `filters` (all documents when `None`), in insertion order.
    fn filter_documents(
        &self,
        filters: Option<&FilterExpr>,
    ) -> Result<Vec<Document>, DocumentStoreError>;

    /// Writes `documents` in order, resolving existing ids with `policy`.
    ///
    /// Returns the number of documents actually written. Writes are not
    /// transactional: on error, documents written earlier in the batch stay stored.
    fn write_documents(
        &self,
        documents: Vec<Document>,
        policy: DuplicatePolicy,
    ) -> Result<usize, DocumentStoreError>;

    /// Deletes the given ids, ignoring unknown ones. Returns the number deleted.
    fn delete_documents(&self, ids: &[String]) -> usize;

    /// The store's vector-search capability, if it has one.
    fn embedding_search(self: Arc<Self>) -> Option<Arc<dyn EmbeddingSearch>> {
        None
    }
}

/// Exact similarity search over stored embeddings.
pub trait EmbeddingSearch: fmt::Debug + Send + Sync {
    /// Similarity function fixed at store construction.
    fn similarity(&self) -> SimilarityFunction;

    /// Returns up to `top_k` documents ranked by descending similarity to `query`.
    ///
    /// Only documents with an embedding that match `filters` are candidates. Equal
    /// scores keep insertion order. A query whose dimension differs from the stored
    /// embeddings is an error.
    fn search_by_vector(
        &self,
        query: &[f32],
        top_k: usize,
        filters: Option<&FilterExpr>,
    ) -> Result<Vec<ScoredDocument>, DocumentStoreError>;
}
