//! Similarity functions for exact vector search.
//!
//! Supports three functions: cosine, dot product, and euclidean. Every function
//! returns a score where **higher is better** (more similar); euclidean similarity
//! is the negated L2 distance so the same descending sort ranks all three.
//!
//! Each function also has a rank-preserving transform into \[0, 1\] used when a
//! retriever is asked to scale scores:
//! - cosine: linear `(s + 1) / 2`
//! - dot product: logistic `1 / (1 + e^(-s / 100))`
//! - euclidean: `1 / (1 + d)` where `d = -s` is the distance

use crate::config::DOT_PRODUCT_SCALING_FACTOR;
use crate::error::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Similarity function used by a document store for every search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityFunction {
    /// `dot(a, b) / (|a| * |b|)`. Range: \[-1, 1\]. Zero-norm vectors score 0.
    Cosine,
    /// Raw inner product. Range: (-∞, ∞).
    #[default]
    DotProduct,
    /// Negative L2 distance `-|a - b|`. Range: (-∞, 0\].
    Euclidean,
}

impl SimilarityFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimilarityFunction::Cosine => "cosine",
            SimilarityFunction::DotProduct => "dot_product",
            SimilarityFunction::Euclidean => "euclidean",
        }
    }

    /// Similarity between two vectors of equal length.
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        debug_assert_eq!(a.len(), b.len());
        match self {
            SimilarityFunction::Cosine => cosine_f32(a, b),
            SimilarityFunction::DotProduct => dot_product_f32(a, b),
            SimilarityFunction::Euclidean => -euclidean_sq_f32(a, b).sqrt(),
        }
    }

    /// Maps a raw score into \[0, 1\] without changing the order of scores.
    pub fn scale(&self, score: f32) -> f32 {
        match self {
            SimilarityFunction::Cosine => ((score + 1.0) / 2.0).clamp(0.0, 1.0),
            SimilarityFunction::DotProduct => {
                1.0 / (1.0 + (-score / DOT_PRODUCT_SCALING_FACTOR).exp())
            }
            SimilarityFunction::Euclidean => 1.0 / (1.0 + (-score).max(0.0)),
        }
    }
}

impl fmt::Display for SimilarityFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityFunction {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cosine" => Ok(SimilarityFunction::Cosine),
            "dot_product" => Ok(SimilarityFunction::DotProduct),
            "euclidean" => Ok(SimilarityFunction::Euclidean),
            other => Err(ConfigurationError::UnknownSimilarity(other.to_string())),
        }
    }
}

/// Accumulates in f64 so tiny but non-zero vectors keep their direction.
fn cosine_f32(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

fn euclidean_sq_f32(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

fn dot_product_f32(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}
