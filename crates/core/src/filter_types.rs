//! Metadata filter types for search queries.
//!
//! A [`FilterExpr`] is either a comparison leaf (`field`, `operator`, `value`) or a
//! logical node (`AND` / `OR` / `NOT`) over nested expressions. Filters travel as
//! JSON objects in component descriptions:
//!
//! ```json
//! {"operator": "AND", "conditions": [
//!     {"field": "meta.type", "operator": "==", "value": "article"},
//!     {"field": "meta.page", "operator": ">=", "value": 10}
//! ]}
//! ```

use crate::document::MetadataValue;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Errors raised while parsing or evaluating a filter.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FilterError {
    /// The filter's JSON shape is invalid (missing keys, wrong types).
    #[error("malformed filter: {0}")]
    Malformed(String),
    /// The `operator` key names no known comparison or logical operator.
    #[error("unknown filter operator '{0}'")]
    UnknownOperator(String),
    /// An ordering operator was applied to values that have no order.
    #[error("cannot apply '{operator}' to field '{field}': {reason}")]
    Incomparable {
        field: String,
        operator: ComparisonOperator,
        reason: String,
    },
    /// `in` / `not in` was given a non-list value.
    #[error("operator '{operator}' on field '{field}' expects a list value, got {found}")]
    ExpectedList {
        field: String,
        operator: ComparisonOperator,
        found: &'static str,
    },
    /// `exists` was given a non-boolean value.
    #[error("operator 'exists' on field '{field}' expects a boolean value, got {found}")]
    ExpectedBoolean { field: String, found: &'static str },
}

/// Comparison operator for filter leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOperator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Exists,
}

impl ComparisonOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "==",
            ComparisonOperator::Ne => "!=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Gte => ">=",
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Lte => "<=",
            ComparisonOperator::In => "in",
            ComparisonOperator::NotIn => "not in",
            ComparisonOperator::Exists => "exists",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "==" => ComparisonOperator::Eq,
            "!=" => ComparisonOperator::Ne,
            ">" => ComparisonOperator::Gt,
            ">=" => ComparisonOperator::Gte,
            "<" => ComparisonOperator::Lt,
            "<=" => ComparisonOperator::Lte,
            "in" => ComparisonOperator::In,
            "not in" => ComparisonOperator::NotIn,
            "exists" => ComparisonOperator::Exists,
            _ => return None,
        })
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical combinator for filter nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOperator {
    And,
    Or,
    /// Negation of the AND of all conditions.
    Not,
}

impl LogicalOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
            LogicalOperator::Not => "NOT",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "AND" => LogicalOperator::And,
            "OR" => LogicalOperator::Or,
            "NOT" => LogicalOperator::Not,
            _ => return None,
        })
    }
}

/// A single comparison on a document field.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Field path: `id`, `content`, `meta.<key>`, or a bare metadata key.
    pub field: String,
    pub operator: ComparisonOperator,
    pub value: MetadataValue,
}

/// A filter expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub enum FilterExpr {
    Comparison(Comparison),
    Logical {
        operator: LogicalOperator,
        conditions: Vec<FilterExpr>,
    },
}

impl FilterExpr {
    pub fn comparison(
        field: impl Into<String>,
        operator: ComparisonOperator,
        value: impl Into<MetadataValue>,
    ) -> Self {
        FilterExpr::Comparison(Comparison {
            field: field.into(),
            operator,
            value: value.into(),
        })
    }

    pub fn eq(field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::comparison(field, ComparisonOperator::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::comparison(field, ComparisonOperator::Ne, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::comparison(field, ComparisonOperator::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::comparison(field, ComparisonOperator::Gte, value)
    }

    pub fn lt(field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::comparison(field, ComparisonOperator::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        Self::comparison(field, ComparisonOperator::Lte, value)
    }

    pub fn is_in(field: impl Into<String>, values: impl Into<MetadataValue>) -> Self {
        Self::comparison(field, ComparisonOperator::In, values)
    }

    pub fn not_in(field: impl Into<String>, values: impl Into<MetadataValue>) -> Self {
        Self::comparison(field, ComparisonOperator::NotIn, values)
    }

    pub fn exists(field: impl Into<String>, present: bool) -> Self {
        Self::comparison(field, ComparisonOperator::Exists, present)
    }

    pub fn and(conditions: Vec<FilterExpr>) -> Self {
        FilterExpr::Logical {
            operator: LogicalOperator::And,
            conditions,
        }
    }

    pub fn or(conditions: Vec<FilterExpr>) -> Self {
        FilterExpr::Logical {
            operator: LogicalOperator::Or,
            conditions,
        }
    }

    pub fn not(conditions: Vec<FilterExpr>) -> Self {
        FilterExpr::Logical {
            operator: LogicalOperator::Not,
            conditions,
        }
    }

    /// True if the tree contains at least one comparison. Leafless trees match everything.
    pub fn has_leaves(&self) -> bool {
        match self {
            FilterExpr::Comparison(_) => true,
            FilterExpr::Logical { conditions, .. } => conditions.iter().any(FilterExpr::has_leaves),
        }
    }

    /// Parses a filter from its JSON form.
    ///
    /// An object with a `field` key is a comparison and needs `operator` and `value`;
    /// anything else is a logical node and needs `operator` and a `conditions` array.
    pub fn from_value(value: &Value) -> Result<Self, FilterError> {
        let obj = value
            .as_object()
            .ok_or_else(|| FilterError::Malformed(format!("expected an object, got {value}")))?;
        let operator = obj
            .get("operator")
            .ok_or_else(|| FilterError::Malformed("missing 'operator' key".to_string()))?
            .as_str()
            .ok_or_else(|| FilterError::Malformed("'operator' must be a string".to_string()))?;

        if let Some(field) = obj.get("field") {
            let field = field
                .as_str()
                .ok_or_else(|| FilterError::Malformed("'field' must be a string".to_string()))?;
            let op = ComparisonOperator::parse(operator)
                .ok_or_else(|| FilterError::UnknownOperator(operator.to_string()))?;
            let raw = obj.get("value").ok_or_else(|| {
                FilterError::Malformed(format!("missing 'value' key for field '{field}'"))
            })?;
            let value: MetadataValue = serde_json::from_value(raw.clone()).map_err(|_| {
                FilterError::Malformed(format!("unsupported value {raw} for field '{field}'"))
            })?;
            return Ok(FilterExpr::Comparison(Comparison {
                field: field.to_string(),
                operator: op,
                value,
            }));
        }

        let op = LogicalOperator::parse(operator)
            .ok_or_else(|| FilterError::UnknownOperator(operator.to_string()))?;
        let conditions = obj
            .get("conditions")
            .ok_or_else(|| {
                FilterError::Malformed(format!("missing 'conditions' key for '{operator}'"))
            })?
            .as_array()
            .ok_or_else(|| FilterError::Malformed("'conditions' must be an array".to_string()))?
            .iter()
            .map(FilterExpr::from_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(FilterExpr::Logical {
            operator: op,
            conditions,
        })
    }

    /// Renders the filter in the JSON form accepted by [`from_value`](Self::from_value).
    pub fn to_value(&self) -> Value {
        let mut obj = Map::new();
        match self {
            FilterExpr::Comparison(c) => {
                obj.insert("field".to_string(), Value::String(c.field.clone()));
                obj.insert(
                    "operator".to_string(),
                    Value::String(c.operator.as_str().to_string()),
                );
                obj.insert(
                    "value".to_string(),
                    serde_json::to_value(&c.value).unwrap_or(Value::Null),
                );
            }
            FilterExpr::Logical {
                operator,
                conditions,
            } => {
                obj.insert(
                    "operator".to_string(),
                    Value::String(operator.as_str().to_string()),
                );
                obj.insert(
                    "conditions".to_string(),
                    Value::Array(conditions.iter().map(FilterExpr::to_value).collect()),
                );
            }
        }
        Value::Object(obj)
    }
}

impl TryFrom<Value> for FilterExpr {
    type Error = FilterError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        FilterExpr::from_value(&value)
    }
}

impl From<FilterExpr> for Value {
    fn from(filter: FilterExpr) -> Self {
        filter.to_value()
    }
}
