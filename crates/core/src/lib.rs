//! # vecpipe-core
//!
//! In-memory document store with exact vector search, a filterable embedding
//! retriever, and a component description protocol with a type registry.
//!
//! This is a synchronous library crate: no async runtime, no I/O.

/// Global configuration constants: limits and defaults.
pub mod config;
/// Core document types: `Document` struct and `MetadataValue` enum.
pub mod document;
/// Error types for stores, retrievers, and deserialization.
pub mod error;
/// Filter expressions, their JSON form, and filter errors.
pub mod filter_types;
/// Retriever components and their per-call parameters.
pub mod retrievers;
/// Search primitives: filter evaluation, filter policies, similarity, and scored results.
pub mod search;
/// Component descriptions and the process-wide type registry.
pub mod serialization;
/// Storage layer: document store traits, collections, and the in-memory store.
pub mod storage;

pub use document::{Document, MetadataValue};
pub use error::{ConfigurationError, DeserializationError, DocumentStoreError, RetrieverError};
pub use filter_types::{FilterError, FilterExpr};
pub use retrievers::{InMemoryEmbeddingRetriever, RetrieverConfig, RetrieverOutput, RunParams};
pub use search::{FilterPolicy, SimilarityFunction};
pub use serialization::{Component, ComponentDescription};
pub use storage::{DocumentStore, DuplicatePolicy, EmbeddingSearch, InMemoryDocumentStore};
