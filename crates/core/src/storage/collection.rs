//! Collection and database data structures.
//!
//! A [`Collection`] holds documents in insertion order and performs exact,
//! filtered vector search over them. [`Database`] manages named collections with
//! thread-safe concurrent access; [`shared_database`] is the process-wide instance
//! that in-memory stores attach to by index name.

use crate::config::MAX_DIMENSION;
use crate::document::Document;
use crate::error::DocumentStoreError;
use crate::filter_types::FilterExpr;
use crate::search::filter::matches_filter;
use crate::search::{ScoredDocument, SimilarityFunction};
use crate::storage::DuplicatePolicy;
use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

/// Internal data for a collection, protected by a `RwLock`.
///
/// Documents are keyed by a monotonically increasing sequence number, so iterating
/// `documents` yields insertion order. Overwrites reuse the original sequence number.
#[derive(Debug, Default)]
pub struct CollectionData {
    pub name: String,
    /// Dimension shared by every stored embedding; `None` while no embedding is stored.
    pub dimension: Option<usize>,
    pub documents: BTreeMap<u64, Arc<Document>>,
    /// Document id → sequence number.
    pub id_to_seq: HashMap<String, u64>,
    /// Number of stored documents that carry an embedding.
    pub embedded_count: usize,
    next_seq: u64,
}

impl CollectionData {
    /// Creates a new empty collection with the given name.
    pub fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    /// Validate internal invariants.
    ///
    /// Checks that the id map and document map agree, that every embedding has the
    /// collection dimension, and that the embedded-document count is accurate.
    pub fn validate(&self) -> Result<(), String> {
        if self.id_to_seq.len() != self.documents.len() {
            return Err(format!(
                "id_to_seq({}) != documents({})",
                self.id_to_seq.len(),
                self.documents.len()
            ));
        }
        for (id, seq) in &self.id_to_seq {
            match self.documents.get(seq) {
                Some(doc) if &doc.id == id => {}
                Some(doc) => {
                    return Err(format!(
                        "seq {} maps to document '{}', expected '{}'",
                        seq, doc.id, id
                    ))
                }
                None => return Err(format!("id '{}' points to missing seq {}", id, seq)),
            }
        }
        if let Some(&max_seq) = self.documents.keys().next_back() {
            if max_seq >= self.next_seq {
                return Err(format!("seq {} >= next_seq {}", max_seq, self.next_seq));
            }
        }

        let mut embedded = 0usize;
        for doc in self.documents.values() {
            if let Some(ref embedding) = doc.embedding {
                embedded += 1;
                if Some(embedding.len()) != self.dimension {
                    return Err(format!(
                        "document '{}' has dimension {} but collection dimension is {:?}",
                        doc.id,
                        embedding.len(),
                        self.dimension
                    ));
                }
            }
        }
        if embedded != self.embedded_count {
            return Err(format!(
                "embedded_count {} != actual {}",
                self.embedded_count, embedded
            ));
        }
        if embedded == 0 && self.dimension.is_some() {
            return Err("dimension set without any embedded document".to_string());
        }
        Ok(())
    }

    /// Allocate the next sequence number for a given id.
    fn assign_seq(&mut self, id: String) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.id_to_seq.insert(id, seq);
        seq
    }

    fn check_dimension(&self, doc: &Document) -> Result<(), DocumentStoreError> {
        let Some(ref embedding) = doc.embedding else {
            return Ok(());
        };
        let found = embedding.len();
        if found > MAX_DIMENSION {
            return Err(DocumentStoreError::DimensionTooLarge {
                max: MAX_DIMENSION,
                found,
            });
        }
        match self.dimension {
            Some(expected) if expected != found => {
                Err(DocumentStoreError::DimensionMismatch { expected, found })
            }
            _ => Ok(()),
        }
    }

    fn track_embedding(&mut self, doc: &Document) {
        if let Some(ref embedding) = doc.embedding {
            self.dimension.get_or_insert(embedding.len());
            self.embedded_count += 1;
        }
    }

    fn untrack_embedding(&mut self, doc: &Document) {
        if doc.embedding.is_some() {
            self.embedded_count -= 1;
            if self.embedded_count == 0 {
                self.dimension = None;
            }
        }
    }

    /// Removes a document by id, returning it if it existed.
    fn remove(&mut self, id: &str) -> Option<Arc<Document>> {
        let seq = self.id_to_seq.remove(id)?;
        let doc = self.documents.remove(&seq)?;
        self.untrack_embedding(&doc);
        Some(doc)
    }
}

/// A thread-safe collection of documents.
///
/// Writes acquire the write lock for the whole batch; scans and searches acquire
/// the read lock. Cloning a `Collection` produces a new handle to the same shared data.
#[derive(Debug, Clone)]
pub struct Collection {
    pub data: Arc<RwLock<CollectionData>>,
}

impl Collection {
    /// Creates a new empty collection.
    pub fn new(name: String) -> Self {
        Self {
            data: Arc::new(RwLock::new(CollectionData::new(name))),
        }
    }

    /// Writes documents in order, resolving existing ids with `policy`.
    ///
    /// Returns the number of documents written. On error the batch stops; earlier
    /// documents in the batch remain stored.
    pub fn write_documents(
        &self,
        documents: Vec<Document>,
        policy: DuplicatePolicy,
    ) -> Result<usize, DocumentStoreError> {
        let mut data = self.data.write();
        let mut written = 0usize;

        for doc in documents {
            match (data.id_to_seq.get(&doc.id).copied(), policy) {
                (Some(_), DuplicatePolicy::Skip) => {
                    tracing::debug!(
                        collection = %data.name,
                        doc_id = %doc.id,
                        "Duplicate document skipped"
                    );
                }
                (Some(_), DuplicatePolicy::Fail) => {
                    tracing::info!(
                        collection = %data.name,
                        count = written,
                        "Batch aborted on duplicate"
                    );
                    return Err(DocumentStoreError::DuplicateDocument(doc.id));
                }
                (Some(seq), DuplicatePolicy::Overwrite) => {
                    // The replaced embedding no longer counts towards the dimension
                    // lock, unless it was the only one and the new one disagrees.
                    let previous = data.documents.get(&seq).cloned();
                    if let Some(ref prev) = previous {
                        data.untrack_embedding(prev);
                    }
                    if let Err(e) = data.check_dimension(&doc) {
                        if let Some(ref prev) = previous {
                            data.track_embedding(prev);
                        }
                        return Err(e);
                    }
                    data.track_embedding(&doc);
                    data.documents.insert(seq, Arc::new(doc));
                    written += 1;
                }
                (None, _) => {
                    data.check_dimension(&doc)?;
                    data.track_embedding(&doc);
                    let seq = data.assign_seq(doc.id.clone());
                    data.documents.insert(seq, Arc::new(doc));
                    written += 1;
                }
            }
        }

        tracing::info!(collection = %data.name, count = written, "Documents written");
        Ok(written)
    }

    /// Retrieves a document by id, or `None` if not found.
    pub fn get_document(&self, id: &str) -> Option<Arc<Document>> {
        let data = self.data.read();
        let seq = data.id_to_seq.get(id)?;
        data.documents.get(seq).cloned()
    }

    /// Deletes documents by id. Returns how many existed.
    pub fn delete_documents(&self, ids: &[String]) -> usize {
        let mut data = self.data.write();
        let deleted = ids.iter().filter(|id| data.remove(id).is_some()).count();
        if deleted > 0 {
            tracing::info!(collection = %data.name, count = deleted, "Documents deleted");
        }
        deleted
    }

    /// Documents matching `filter` in insertion order, or all documents when `None`.
    pub fn filter_documents(
        &self,
        filter: Option<&FilterExpr>,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        let data = self.data.read();
        let mut out = Vec::new();
        for doc in data.documents.values() {
            if let Some(f) = filter {
                if !matches_filter(doc, f)? {
                    continue;
                }
            }
            out.push(Document::clone(doc));
        }
        Ok(out)
    }

    /// Exact nearest-neighbor search over embedded documents.
    ///
    /// Scores every filtered candidate with `similarity`, sorts by descending score
    /// (stable, so ties keep insertion order) and keeps the first `top_k`.
    pub fn vector_search(
        &self,
        query_embedding: &[f32],
        top_k: usize,
        similarity: SimilarityFunction,
        filter: Option<&FilterExpr>,
    ) -> Result<Vec<ScoredDocument>, DocumentStoreError> {
        let data = self.data.read();
        let Some(dimension) = data.dimension else {
            return Ok(Vec::new());
        };
        if query_embedding.len() != dimension {
            return Err(DocumentStoreError::DimensionMismatch {
                expected: dimension,
                found: query_embedding.len(),
            });
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let skipped = data.documents.len() - data.embedded_count;
        if skipped > 0 {
            tracing::warn!(
                collection = %data.name,
                skipped,
                "Skipping documents without an embedding"
            );
        }

        let mut results = Vec::with_capacity(data.embedded_count);
        for doc in data.documents.values() {
            let Some(ref embedding) = doc.embedding else {
                continue;
            };
            if let Some(f) = filter {
                if !matches_filter(doc, f)? {
                    continue;
                }
            }
            results.push(ScoredDocument {
                document: Arc::clone(doc),
                score: similarity.score(query_embedding, embedding),
            });
        }

        // NaN scores rank last.
        results.sort_by_key(|r| {
            let score = if r.score.is_nan() { f32::NEG_INFINITY } else { r.score };
            Reverse(OrderedFloat(score))
        });
        results.truncate(top_k);
        Ok(results)
    }

    /// Returns the number of stored documents.
    pub fn document_count(&self) -> usize {
        self.data.read().documents.len()
    }

    /// Returns the embedding dimension, if any embedded document is stored.
    pub fn dimension(&self) -> Option<usize> {
        self.data.read().dimension
    }
}

/// Database holds all collections.
#[derive(Debug, Clone, Default)]
pub struct Database {
    pub collections: Arc<RwLock<HashMap<String, Collection>>>,
}

impl Database {
    /// Creates a new empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a handle to the named collection, creating it if needed.
    pub fn get_or_create_collection(&self, name: &str) -> Collection {
        if let Some(existing) = self.get_collection(name) {
            return existing;
        }
        self.collections
            .write()
            .entry(name.to_string())
            .or_insert_with(|| {
                tracing::debug!(collection = %name, "Collection created");
                Collection::new(name.to_string())
            })
            .clone()
    }

    /// Returns a cloned handle to the named collection, or `None` if not found.
    pub fn get_collection(&self, name: &str) -> Option<Collection> {
        self.collections.read().get(name).cloned()
    }

    /// Deletes a collection by name. Returns `true` if it existed.
    ///
    /// Store handles already attached to the collection keep their data; new
    /// stores with the same name start empty.
    pub fn delete_collection(&self, name: &str) -> bool {
        self.collections.write().remove(name).is_some()
    }

    /// Returns the names of all collections.
    pub fn list_collections(&self) -> Vec<String> {
        self.collections.read().keys().cloned().collect()
    }
}

static SHARED_DATABASE: LazyLock<Database> = LazyLock::new(Database::new);

/// The process-wide database that in-memory stores attach to by index name.
pub fn shared_database() -> &'static Database {
    &SHARED_DATABASE
}
