//! Search primitives: filter evaluation, filter policies, similarity functions,
//! and scored results.

/// Filter engine: evaluates filter expressions against documents.
pub mod filter;
/// Combination of default and per-call filters.
pub mod policy;
/// Similarity functions and score scaling.
pub mod similarity;
/// Scored document types returned by vector search.
pub mod types;

pub use filter::matches_filter;
pub use policy::{apply_filter_policy, FilterPolicy};
pub use similarity::SimilarityFunction;
pub use types::ScoredDocument;
