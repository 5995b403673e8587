//! In-memory document store: a named handle onto a shared collection.

use crate::document::Document;
use crate::error::{DeserializationError, DocumentStoreError};
use crate::filter_types::FilterExpr;
use crate::search::{ScoredDocument, SimilarityFunction};
use crate::serialization::{Component, ComponentDescription};
use crate::storage::collection::{shared_database, Collection};
use crate::storage::{DocumentStore, DuplicatePolicy, EmbeddingSearch};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Document store kept entirely in process memory.
///
/// Documents live in the shared collection named by `index`, so every store
/// built with the same index sees the same documents. Without an explicit index
/// a fresh UUID is used and the store starts out private.
#[derive(Clone)]
pub struct InMemoryDocumentStore {
    index: String,
    similarity: SimilarityFunction,
    collection: Collection,
}

impl InMemoryDocumentStore {
    pub const TYPE_NAME: &'static str = "vecpipe_core::storage::InMemoryDocumentStore";

    /// Creates a store on a new, uniquely named index.
    ///
    /// The index stays registered in [`shared_database`] after the store is
    /// dropped, so its documents outlive every handle. Call
    /// [`release`](Self::release) once no other store needs the index.
    pub fn new(similarity: SimilarityFunction) -> Self {
        Self::with_index(Uuid::new_v4().to_string(), similarity)
    }

    /// Creates a store attached to the named index, creating the index if needed.
    pub fn with_index(index: impl Into<String>, similarity: SimilarityFunction) -> Self {
        let index = index.into();
        let collection = shared_database().get_or_create_collection(&index);
        tracing::debug!(
            index = %index,
            similarity = %similarity,
            "In-memory document store attached"
        );
        Self {
            index,
            similarity,
            collection,
        }
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn similarity(&self) -> SimilarityFunction {
        self.similarity
    }

    pub fn get_document(&self, id: &str) -> Option<Arc<Document>> {
        self.collection.get_document(id)
    }

    /// Detaches the index from the shared database. Returns `true` if it was registered.
    ///
    /// Existing handles keep their documents; stores created later under the same
    /// index start empty.
    pub fn release(&self) -> bool {
        let released = shared_database().delete_collection(&self.index);
        if released {
            tracing::debug!(index = %self.index, "In-memory index released");
        }
        released
    }

    /// Rebuilds a store from `{"index", "embedding_similarity_function"}`; both optional.
    pub fn from_description(
        description: &ComponentDescription,
    ) -> Result<Self, DeserializationError> {
        let similarity = match description.optional::<String>("embedding_similarity_function")? {
            Some(name) => name.parse::<SimilarityFunction>()?,
            None => SimilarityFunction::default(),
        };
        Ok(match description.optional::<String>("index")? {
            Some(index) => Self::with_index(index, similarity),
            None => Self::new(similarity),
        })
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new(SimilarityFunction::default())
    }
}

impl fmt::Debug for InMemoryDocumentStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryDocumentStore")
            .field("index", &self.index)
            .field("similarity", &self.similarity)
            .field("documents", &self.collection.document_count())
            .finish()
    }
}

impl Component for InMemoryDocumentStore {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn to_description(&self) -> ComponentDescription {
        ComponentDescription::new(Self::TYPE_NAME)
            .with_parameter("index", self.index.clone())
            .with_parameter("embedding_similarity_function", self.similarity.as_str())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl DocumentStore for InMemoryDocumentStore {
    fn count_documents(&self) -> usize {
        self.collection.document_count()
    }

    fn filter_documents(
        &self,
        filters: Option<&FilterExpr>,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        self.collection.filter_documents(filters)
    }

    fn write_documents(
        &self,
        documents: Vec<Document>,
        policy: DuplicatePolicy,
    ) -> Result<usize, DocumentStoreError> {
        self.collection.write_documents(documents, policy)
    }

    fn delete_documents(&self, ids: &[String]) -> usize {
        self.collection.delete_documents(ids)
    }

    fn embedding_search(self: Arc<Self>) -> Option<Arc<dyn EmbeddingSearch>> {
        Some(self)
    }
}

impl EmbeddingSearch for InMemoryDocumentStore {
    fn similarity(&self) -> SimilarityFunction {
        self.similarity
    }

    fn search_by_vector(
        &self,
        query: &[f32],
        top_k: usize,
        filters: Option<&FilterExpr>,
    ) -> Result<Vec<ScoredDocument>, DocumentStoreError> {
        let results = self
            .collection
            .vector_search(query, top_k, self.similarity, filters)?;
        tracing::debug!(
            index = %self.index,
            top_k,
            returned = results.len(),
            "Vector search complete"
        );
        Ok(results)
    }
}
