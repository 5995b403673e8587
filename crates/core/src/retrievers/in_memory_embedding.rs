//! Embedding retriever: ranks stored documents by similarity to a query embedding.

use crate::config::DEFAULT_TOP_K;
use crate::document::Document;
use crate::error::{ConfigurationError, DeserializationError, RetrieverError};
use crate::filter_types::FilterExpr;
use crate::retrievers::{RetrieverConfig, RetrieverOutput, RunParams};
use crate::search::{apply_filter_policy, FilterPolicy, ScoredDocument, SimilarityFunction};
use crate::serialization::{document_store_from_description, Component, ComponentDescription};
use crate::storage::{DocumentStore, EmbeddingSearch};
use serde_json::Value;
use std::any::Any;
use std::sync::Arc;

/// Retrieves the documents whose embeddings are most similar to a query embedding.
///
/// The bound store must offer embedding search; that capability is resolved once,
/// at construction. Configuration never changes after construction: per-call
/// [`RunParams`] apply to a single call.
#[derive(Debug, Clone)]
pub struct InMemoryEmbeddingRetriever {
    document_store: Arc<dyn DocumentStore>,
    search: Arc<dyn EmbeddingSearch>,
    config: RetrieverConfig,
}

impl InMemoryEmbeddingRetriever {
    pub const TYPE_NAME: &'static str = "vecpipe_core::retrievers::InMemoryEmbeddingRetriever";

    pub fn new(
        document_store: Arc<dyn DocumentStore>,
        config: RetrieverConfig,
    ) -> Result<Self, ConfigurationError> {
        if config.top_k <= 0 {
            return Err(ConfigurationError::InvalidTopK(config.top_k));
        }
        let search = Arc::clone(&document_store).embedding_search().ok_or(
            ConfigurationError::MissingCapability {
                component: "InMemoryEmbeddingRetriever",
                capability: "search_by_vector",
            },
        )?;
        Ok(Self {
            document_store,
            search,
            config,
        })
    }

    pub fn document_store(&self) -> &Arc<dyn DocumentStore> {
        &self.document_store
    }

    pub fn config(&self) -> &RetrieverConfig {
        &self.config
    }

    pub fn filters(&self) -> Option<&FilterExpr> {
        self.config.filters.as_ref()
    }

    pub fn top_k(&self) -> i64 {
        self.config.top_k
    }

    pub fn scale_score(&self) -> bool {
        self.config.scale_score
    }

    pub fn return_embedding(&self) -> bool {
        self.config.return_embedding
    }

    pub fn filter_policy(&self) -> FilterPolicy {
        self.config.filter_policy
    }

    /// Runs one retrieval.
    ///
    /// Returned documents are copies: clearing embeddings or setting scores on
    /// them never touches the store.
    pub fn run(
        &self,
        query_embedding: &[f32],
        params: RunParams,
    ) -> Result<RetrieverOutput, RetrieverError> {
        let top_k = params.top_k.unwrap_or(self.config.top_k);
        if top_k <= 0 {
            return Err(RetrieverError::InvalidTopK(top_k));
        }
        let scale_score = params.scale_score.unwrap_or(self.config.scale_score);
        let return_embedding = params
            .return_embedding
            .unwrap_or(self.config.return_embedding);
        let filters = apply_filter_policy(
            self.config.filter_policy,
            self.config.filters.as_ref(),
            params.filters.as_ref(),
        );

        let results = self.search.search_by_vector(
            query_embedding,
            usize::try_from(top_k).unwrap_or(usize::MAX),
            filters.as_ref(),
        )?;

        let similarity = self.search.similarity();
        let documents: Vec<Document> = results
            .into_iter()
            .map(|r| finish_document(r, similarity, scale_score, return_embedding))
            .collect();

        tracing::debug!(
            top_k,
            returned = documents.len(),
            scale_score,
            filtered = filters.is_some(),
            "Embedding retrieval complete"
        );
        Ok(RetrieverOutput { documents })
    }

    /// Rebuilds a retriever, constructing its document store first.
    ///
    /// `document_store` is required; every other parameter falls back to its default.
    pub fn from_description(
        description: &ComponentDescription,
    ) -> Result<Self, DeserializationError> {
        let store_description =
            ComponentDescription::from_value(description.require("document_store")?)?;
        let document_store = document_store_from_description(&store_description)?;

        let filters = match description.init_parameters.get("filters") {
            None | Some(Value::Null) => None,
            Some(value) => Some(FilterExpr::from_value(value)?),
        };
        let filter_policy = match description.optional::<String>("filter_policy")? {
            Some(name) => name.parse::<FilterPolicy>()?,
            None => FilterPolicy::default(),
        };
        let config = RetrieverConfig {
            filters,
            top_k: description
                .optional::<i64>("top_k")?
                .unwrap_or(DEFAULT_TOP_K as i64),
            scale_score: description.optional("scale_score")?.unwrap_or(false),
            return_embedding: description.optional("return_embedding")?.unwrap_or(false),
            filter_policy,
        };
        Ok(Self::new(document_store, config)?)
    }
}

fn finish_document(
    result: ScoredDocument,
    similarity: SimilarityFunction,
    scale_score: bool,
    return_embedding: bool,
) -> Document {
    let score = if scale_score {
        similarity.scale(result.score)
    } else {
        result.score
    };
    let mut document = Document::clone(&result.document);
    document.score = Some(score);
    if !return_embedding {
        document.embedding = None;
    }
    document
}

impl Component for InMemoryEmbeddingRetriever {
    fn type_name(&self) -> &'static str {
        Self::TYPE_NAME
    }

    fn to_description(&self) -> ComponentDescription {
        let filters = self
            .config
            .filters
            .as_ref()
            .map_or(Value::Null, FilterExpr::to_value);
        ComponentDescription::new(Self::TYPE_NAME)
            .with_parameter("document_store", self.document_store.to_description().to_value())
            .with_parameter("filters", filters)
            .with_parameter("top_k", self.config.top_k)
            .with_parameter("scale_score", self.config.scale_score)
            .with_parameter("return_embedding", self.config.return_embedding)
            .with_parameter("filter_policy", self.config.filter_policy.as_str())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
