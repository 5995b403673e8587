//! Retriever components: configuration, per-call parameters, and output.

/// Embedding retriever over an in-memory document store.
pub mod in_memory_embedding;

pub use in_memory_embedding::InMemoryEmbeddingRetriever;

use crate::config::DEFAULT_TOP_K;
use crate::document::Document;
use crate::filter_types::FilterExpr;
use crate::search::FilterPolicy;
use serde::{Deserialize, Serialize};

/// Defaults a retriever applies to every call unless overridden.
///
/// `top_k` is signed so that a negative value read from a description is
/// reported as invalid rather than rejected by the decoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverConfig {
    pub filters: Option<FilterExpr>,
    pub top_k: i64,
    pub scale_score: bool,
    pub return_embedding: bool,
    pub filter_policy: FilterPolicy,
}

impl Default for RetrieverConfig {
    fn default() -> Self {
        Self {
            filters: None,
            top_k: DEFAULT_TOP_K as i64,
            scale_score: false,
            return_embedding: false,
            filter_policy: FilterPolicy::default(),
        }
    }
}

impl RetrieverConfig {
    pub fn with_filters(mut self, filters: FilterExpr) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn with_top_k(mut self, top_k: i64) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_scale_score(mut self, scale_score: bool) -> Self {
        self.scale_score = scale_score;
        self
    }

    pub fn with_return_embedding(mut self, return_embedding: bool) -> Self {
        self.return_embedding = return_embedding;
        self
    }

    pub fn with_filter_policy(mut self, filter_policy: FilterPolicy) -> Self {
        self.filter_policy = filter_policy;
        self
    }
}

/// Per-call overrides. `None` falls back to the retriever's configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunParams {
    pub filters: Option<FilterExpr>,
    pub top_k: Option<i64>,
    pub scale_score: Option<bool>,
    pub return_embedding: Option<bool>,
}

impl RunParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(mut self, filters: FilterExpr) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn top_k(mut self, top_k: i64) -> Self {
        self.top_k = Some(top_k);
        self
    }

    pub fn scale_score(mut self, scale_score: bool) -> Self {
        self.scale_score = Some(scale_score);
        self
    }

    pub fn return_embedding(mut self, return_embedding: bool) -> Self {
        self.return_embedding = Some(return_embedding);
        self
    }
}

/// Ranked documents, best first, each carrying its score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrieverOutput {
    pub documents: Vec<Document>,
}
