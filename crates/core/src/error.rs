//! Error types for stores, retrievers, and component (de)serialization.
//!
//! Errors are grouped by when they can occur:
//! - [`ConfigurationError`]: raised while constructing a component.
//! - [`RetrieverError`]: raised by a retriever call (invalid per-call input).
//! - [`DocumentStoreError`]: raised by store writes and searches.
//! - [`DeserializationError`]: raised while rebuilding a component from its description.
//!
//! Filter errors live with the filter types in [`crate::filter_types::FilterError`].

use crate::filter_types::FilterError;

/// Invalid component configuration, detected at construction.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("top_k must be a positive integer, got {0}")]
    InvalidTopK(i64),
    #[error("{component} requires a document store with the '{capability}' capability")]
    MissingCapability {
        component: &'static str,
        capability: &'static str,
    },
    #[error("unknown similarity function '{0}' (expected cosine, dot_product, or euclidean)")]
    UnknownSimilarity(String),
    #[error("unknown filter policy '{0}' (expected replace or merge)")]
    UnknownFilterPolicy(String),
    #[error("unknown duplicate policy '{0}' (expected overwrite, skip, or fail)")]
    UnknownDuplicatePolicy(String),
}

/// Errors raised by document store operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DocumentStoreError {
    /// A write under the `fail` policy hit an existing id.
    #[error("document with id '{0}' already exists in the document store")]
    DuplicateDocument(String),
    /// A vector's dimension differs from the store's fixed dimension.
    #[error("expected embedding dimension {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
    /// A vector exceeds [`MAX_DIMENSION`](crate::config::MAX_DIMENSION).
    #[error("embedding dimension {found} exceeds the maximum of {max}")]
    DimensionTooLarge { max: usize, found: usize },
    #[error(transparent)]
    Filter(#[from] FilterError),
}

/// Call-time validation errors from a retriever.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RetrieverError {
    #[error("top_k must be a positive integer, got {0}")]
    InvalidTopK(i64),
    #[error(transparent)]
    Store(#[from] DocumentStoreError),
}

/// Failures while turning a component description back into a component.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeserializationError {
    #[error("missing 'type' in serialization data")]
    MissingType,
    #[error("component type '{0}' is not registered")]
    UnknownType(String),
    #[error("missing '{key}' in serialization data for {type_name}")]
    MissingKey { type_name: String, key: String },
    #[error("invalid init parameter '{name}' for {type_name}: {reason}")]
    InvalidParameter {
        type_name: String,
        name: String,
        reason: String,
    },
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    Filter(#[from] FilterError),
}
