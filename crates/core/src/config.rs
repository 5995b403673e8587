//! Global configuration constants for vecpipe.
//!
//! Defaults, input validation limits, and score-scaling parameters are defined here.
//! These are compile-time constants; runtime configuration is the typed constructor
//! surface of each component (`RetrieverConfig`, `SimilarityFunction`, ...).

/// Default number of documents returned by a retriever when no `top_k` is given.
pub const DEFAULT_TOP_K: usize = 10;

/// Divisor applied to dot-product scores before logistic squashing: `1 / (1 + e^(-s / factor))`.
pub const DOT_PRODUCT_SCALING_FACTOR: f32 = 100.0;

/// Maximum allowed embedding dimension.
pub const MAX_DIMENSION: usize = 4096;

