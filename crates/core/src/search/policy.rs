//! Resolution of a component's default filter against a per-call filter.

use crate::error::ConfigurationError;
use crate::filter_types::{FilterExpr, LogicalOperator};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a per-call filter combines with the filter configured at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPolicy {
    /// The per-call filter fully overrides the default.
    #[default]
    Replace,
    /// The per-call filter is ANDed with the default.
    Merge,
}

impl FilterPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterPolicy::Replace => "replace",
            FilterPolicy::Merge => "merge",
        }
    }
}

impl fmt::Display for FilterPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterPolicy {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(FilterPolicy::Replace),
            "merge" => Ok(FilterPolicy::Merge),
            other => Err(ConfigurationError::UnknownFilterPolicy(other.to_string())),
        }
    }
}

/// Computes the filter to use for one call. Neither input is modified.
///
/// Without a per-call filter the default applies under both policies.
pub fn apply_filter_policy(
    policy: FilterPolicy,
    default: Option<&FilterExpr>,
    runtime: Option<&FilterExpr>,
) -> Option<FilterExpr> {
    match (policy, default, runtime) {
        (_, default, None) => default.cloned(),
        (FilterPolicy::Replace, _, Some(runtime)) => Some(runtime.clone()),
        (FilterPolicy::Merge, None, Some(runtime)) => Some(runtime.clone()),
        (FilterPolicy::Merge, Some(default), Some(runtime)) => {
            let mut conditions = and_conditions(default);
            conditions.extend(and_conditions(runtime));
            Some(FilterExpr::and(conditions))
        }
    }
}

/// Flattens a top-level AND into its conditions; anything else becomes a single condition.
fn and_conditions(filter: &FilterExpr) -> Vec<FilterExpr> {
    match filter {
        FilterExpr::Logical {
            operator: LogicalOperator::And,
            conditions,
        } => conditions.clone(),
        other => vec![other.clone()],
    }
}
