//! Metadata filtering engine for search queries.
//!
//! Evaluates [`FilterExpr`] trees against documents. Comparison operators:
//! `==`, `!=`, `>`, `>=`, `<`, `<=`, `in`, `not in`, `exists`. Logical nodes
//! short-circuit: `AND` stops at the first false condition, `OR` at the first true.
//!
//! Ordering operators compare numbers numerically and strings as ISO-8601 dates.
//! Any other pairing is an error rather than a silent non-match.

use crate::document::{Document, MetadataValue};
use crate::filter_types::{
    Comparison, ComparisonOperator, FilterError, FilterExpr, LogicalOperator,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::cmp::Ordering;

/// Check if a document matches the given filter.
///
/// A filter without any comparison leaves matches every document.
pub fn matches_filter(document: &Document, filter: &FilterExpr) -> Result<bool, FilterError> {
    if !filter.has_leaves() {
        return Ok(true);
    }
    evaluate(document, filter)
}

fn evaluate(document: &Document, filter: &FilterExpr) -> Result<bool, FilterError> {
    match filter {
        FilterExpr::Comparison(cond) => evaluate_condition(document, cond),
        FilterExpr::Logical {
            operator,
            conditions,
        } => {
            // Leafless subtrees are identity filters and never veto a match.
            let mut live = conditions.iter().filter(|c| c.has_leaves());
            match operator {
                LogicalOperator::And => all(document, &mut live),
                LogicalOperator::Or => {
                    if conditions.iter().any(|c| !c.has_leaves()) {
                        return Ok(true);
                    }
                    for cond in live {
                        if evaluate(document, cond)? {
                            return Ok(true);
                        }
                    }
                    Ok(false)
                }
                LogicalOperator::Not => Ok(!all(document, &mut live)?),
            }
        }
    }
}

fn all<'a>(
    document: &Document,
    conditions: &mut impl Iterator<Item = &'a FilterExpr>,
) -> Result<bool, FilterError> {
    for cond in conditions {
        if !evaluate(document, cond)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn evaluate_condition(document: &Document, cond: &Comparison) -> Result<bool, FilterError> {
    let field_value = document.field(&cond.field);
    let field_value = field_value.as_deref();

    match cond.operator {
        ComparisonOperator::Exists => match cond.value {
            MetadataValue::Boolean(present) => Ok(field_value.is_some() == present),
            ref other => Err(FilterError::ExpectedBoolean {
                field: cond.field.clone(),
                found: other.kind(),
            }),
        },
        ComparisonOperator::In | ComparisonOperator::NotIn => {
            let MetadataValue::List(ref values) = cond.value else {
                return Err(FilterError::ExpectedList {
                    field: cond.field.clone(),
                    operator: cond.operator,
                    found: cond.value.kind(),
                });
            };
            let contained = field_value.is_some_and(|fv| values.iter().any(|v| value_eq(fv, v)));
            Ok(match cond.operator {
                ComparisonOperator::In => contained,
                _ => !contained,
            })
        }
        ComparisonOperator::Eq => Ok(field_value.is_some_and(|fv| value_eq(fv, &cond.value))),
        ComparisonOperator::Ne => Ok(field_value.is_some_and(|fv| !value_eq(fv, &cond.value))),
        ComparisonOperator::Gt => ordered(field_value, cond, |o| o == Ordering::Greater),
        ComparisonOperator::Gte => ordered(field_value, cond, |o| o != Ordering::Less),
        ComparisonOperator::Lt => ordered(field_value, cond, |o| o == Ordering::Less),
        ComparisonOperator::Lte => ordered(field_value, cond, |o| o != Ordering::Greater),
    }
}

fn ordered(
    field_value: Option<&MetadataValue>,
    cond: &Comparison,
    accept: impl Fn(Ordering) -> bool,
) -> Result<bool, FilterError> {
    let Some(field_value) = field_value else {
        return Ok(false);
    };
    if matches!(cond.value, MetadataValue::Null) {
        return Ok(false);
    }
    Ok(value_cmp(field_value, cond)?.is_some_and(accept))
}

/// Equality between a document value and a filter literal.
///
/// Integers and floats compare by exact numeric value, so equality agrees with
/// [`value_cmp`]; lists compare element-wise.
fn value_eq(meta: &MetadataValue, literal: &MetadataValue) -> bool {
    match (meta, literal) {
        (MetadataValue::List(a), MetadataValue::List(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| value_eq(x, y))
        }
        (MetadataValue::Integer(a), MetadataValue::Integer(b)) => a == b,
        (a, b) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
    }
}

/// Ordering between a document value and a filter literal.
///
/// Returns `Ok(None)` for incomparable floats (NaN); errors for kinds with no order.
fn value_cmp(meta: &MetadataValue, cond: &Comparison) -> Result<Option<Ordering>, FilterError> {
    let literal = &cond.value;
    let incomparable = |reason: String| FilterError::Incomparable {
        field: cond.field.clone(),
        operator: cond.operator,
        reason,
    };

    match (meta, literal) {
        (MetadataValue::Integer(a), MetadataValue::Integer(b)) => Ok(Some(a.cmp(b))),
        (
            MetadataValue::Integer(_) | MetadataValue::Float(_),
            MetadataValue::Integer(_) | MetadataValue::Float(_),
        ) => Ok(meta
            .as_f64()
            .zip(literal.as_f64())
            .and_then(|(a, b)| a.partial_cmp(&b))),
        (MetadataValue::String(a), MetadataValue::String(b)) => {
            let lhs = parse_date(a).ok_or_else(|| {
                incomparable(format!("document value '{a}' is not an ISO-8601 date"))
            })?;
            let rhs = parse_date(b).ok_or_else(|| {
                incomparable(format!("filter value '{b}' is not an ISO-8601 date"))
            })?;
            Ok(Some(lhs.cmp(&rhs)))
        }
        (a, b) => Err(incomparable(format!(
            "{} document value is not comparable with {} filter value",
            a.kind(),
            b.kind()
        ))),
    }
}

/// Parses `YYYY-MM-DD`, naive datetimes, and RFC 3339 datetimes.
/// Offset-aware values are normalized to UTC before the offset is dropped.
fn parse_date(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc_with(pairs: Vec<(&str, MetadataValue)>) -> Document {
        pairs
            .into_iter()
            .fold(Document::builder().content("c"), |b, (k, v)| b.meta(k, v))
            .build()
    }

    fn filter(v: serde_json::Value) -> FilterExpr {
        FilterExpr::from_value(&v).unwrap()
    }

    fn check(f: serde_json::Value, doc: &Document) -> bool {
        matches_filter(doc, &filter(f)).unwrap()
    }

    #[test]
    fn test_eq_string() {
        let doc = doc_with(vec![("name", "test".into())]);
        assert!(check(json!({"field": "meta.name", "operator": "==", "value": "test"}), &doc));
    }

    #[test]
    fn test_eq_string_mismatch() {
        let doc = doc_with(vec![("name", "different value".into())]);
        assert!(!check(json!({"field": "meta.name", "operator": "==", "value": "test"}), &doc));
    }

    #[test]
    fn test_eq_list_vs_scalar() {
        let doc = doc_with(vec![("name", vec!["test"].into())]);
        assert!(!check(json!({"field": "meta.name", "operator": "==", "value": "test"}), &doc));
    }

    #[test]
    fn test_eq_null_filter_value() {
        let doc = doc_with(vec![("name", "test".into())]);
        assert!(!check(json!({"field": "meta.name", "operator": "==", "value": null}), &doc));
    }

    #[test]
    fn test_eq_distinct_tiny_floats() {
        let doc = doc_with(vec![("x", 1e-20_f64.into())]);
        assert!(!check(json!({"field": "meta.x", "operator": "==", "value": 2e-20}), &doc));
        assert!(check(json!({"field": "meta.x", "operator": "!=", "value": 2e-20}), &doc));
        assert!(check(json!({"field": "meta.x", "operator": "<", "value": 2e-20}), &doc));
        assert!(check(json!({"field": "meta.x", "operator": "==", "value": 1e-20}), &doc));

        let zero = doc_with(vec![("x", 0.0_f64.into())]);
        assert!(!check(json!({"field": "meta.x", "operator": "in", "value": [1e-17]}), &zero));
        assert!(check(json!({"field": "meta.x", "operator": "not in", "value": [1e-17]}), &zero));
        assert!(check(json!({"field": "meta.x", "operator": "==", "value": 0}), &zero));
    }

    #[test]
    fn test_eq_integer_with_float_literal() {
        let doc = doc_with(vec![("x", 10.into())]);
        assert!(check(json!({"field": "meta.x", "operator": "==", "value": 10.0}), &doc));
    }

    #[test]
    fn test_eq_on_id_and_content() {
        let doc = Document::builder().id("abc").content("hello").build();
        assert!(check(json!({"field": "id", "operator": "==", "value": "abc"}), &doc));
        assert!(check(json!({"field": "content", "operator": "==", "value": "hello"}), &doc));
    }

    #[test]
    fn test_ne_operator() {
        let doc = doc_with(vec![("status", "active".into())]);
        assert!(check(json!({"field": "meta.status", "operator": "!=", "value": "deleted"}), &doc));
        assert!(!check(json!({"field": "meta.status", "operator": "!=", "value": "active"}), &doc));
    }

    #[test]
    fn test_ne_different_kinds() {
        let doc = doc_with(vec![("name", vec!["test"].into())]);
        assert!(check(json!({"field": "meta.name", "operator": "!=", "value": "test"}), &doc));
    }

    #[test]
    fn test_missing_field_is_non_match() {
        let doc = doc_with(vec![]);
        for op in ["==", "!=", ">", ">=", "<", "<="] {
            let f = json!({"field": "meta.page", "operator": op, "value": 10});
            assert!(!check(f, &doc), "operator {op} should not match a missing field");
        }
        assert!(!check(json!({"field": "meta.page", "operator": "in", "value": [10]}), &doc));
    }

    #[test]
    fn test_missing_field_not_in_matches() {
        let doc = doc_with(vec![]);
        assert!(check(json!({"field": "meta.page", "operator": "not in", "value": [9, 10]}), &doc));
    }

    #[test]
    fn test_null_document_value_is_missing() {
        let doc = doc_with(vec![("page", MetadataValue::Null)]);
        assert!(!check(json!({"field": "meta.page", "operator": ">", "value": 10}), &doc));
        assert!(check(json!({"field": "meta.page", "operator": "exists", "value": false}), &doc));
    }

    #[test]
    fn test_ordering_numbers() {
        let doc = doc_with(vec![("page", 10.into())]);
        assert!(!check(json!({"field": "meta.page", "operator": ">", "value": 10}), &doc));
        assert!(check(json!({"field": "meta.page", "operator": ">=", "value": 10}), &doc));
        assert!(!check(json!({"field": "meta.page", "operator": "<", "value": 10}), &doc));
        assert!(check(json!({"field": "meta.page", "operator": "<=", "value": 10}), &doc));
        assert!(check(json!({"field": "meta.page", "operator": ">", "value": 9.5}), &doc));
        assert!(check(json!({"field": "meta.page", "operator": "<", "value": 11}), &doc));
    }

    #[test]
    fn test_ordering_null_filter_value() {
        let doc = doc_with(vec![("page", 10.into())]);
        for op in [">", ">=", "<", "<="] {
            let f = json!({"field": "meta.page", "operator": op, "value": null});
            assert!(!check(f, &doc));
        }
    }

    #[test]
    fn test_ordering_dates() {
        let doc = doc_with(vec![("date", "1972-12-11T19:54:58".into())]);
        assert!(check(
            json!({"field": "meta.date", "operator": ">", "value": "1969-07-21T20:17:40"}),
            &doc
        ));
        assert!(!check(
            json!({"field": "meta.date", "operator": "<", "value": "1969-07-21T20:17:40"}),
            &doc
        ));
        assert!(check(
            json!({"field": "meta.date", "operator": ">=", "value": "1972-12-11T19:54:58"}),
            &doc
        ));
    }

    #[test]
    fn test_ordering_naive_and_aware_dates() {
        let doc = doc_with(vec![("date", "2025-02-03T12:45:46.435816Z".into())]);
        assert!(check(
            json!({"field": "meta.date", "operator": ">=", "value": "2025-02-01"}),
            &doc
        ));
        assert!(check(
            json!({"field": "meta.date", "operator": "==", "value": "2025-02-03T12:45:46.435816Z"}),
            &doc
        ));
    }

    #[test]
    fn test_ordering_string_vs_number_errors() {
        let doc = doc_with(vec![("page", 10.into())]);
        for op in [">", ">=", "<", "<="] {
            let f = filter(json!({"field": "meta.page", "operator": op, "value": "10"}));
            let err = matches_filter(&doc, &f).unwrap_err();
            assert!(matches!(err, FilterError::Incomparable { .. }), "{op}: {err}");
        }
    }

    #[test]
    fn test_ordering_list_value_errors() {
        let doc = doc_with(vec![("page", 10.into())]);
        let f = filter(json!({"field": "meta.page", "operator": ">", "value": [10]}));
        assert!(matches_filter(&doc, &f).is_err());
    }

    #[test]
    fn test_ordering_non_date_strings_error() {
        let doc = doc_with(vec![("name", "alpha".into())]);
        let f = filter(json!({"field": "meta.name", "operator": "<", "value": "beta"}));
        assert!(matches!(
            matches_filter(&doc, &f),
            Err(FilterError::Incomparable { .. })
        ));
    }

    #[test]
    fn test_ordering_boolean_errors() {
        let doc = doc_with(vec![("flag", true.into())]);
        let f = filter(json!({"field": "meta.flag", "operator": "<", "value": 10}));
        assert!(matches_filter(&doc, &f).is_err());
    }

    #[test]
    fn test_in_operator() {
        let doc = doc_with(vec![("page", 10.into())]);
        let is_in = json!({"field": "meta.page", "operator": "in", "value": [9, 10]});
        let not_in = json!({"field": "meta.page", "operator": "not in", "value": [9, 10]});
        assert!(check(is_in.clone(), &doc));
        assert!(!check(not_in.clone(), &doc));
        let other = doc_with(vec![("page", 1.into())]);
        assert!(!check(is_in, &other));
        assert!(check(not_in, &other));
    }

    #[test]
    fn test_in_requires_list() {
        let doc = doc_with(vec![("page", 10.into())]);
        for op in ["in", "not in"] {
            let f = filter(json!({"field": "meta.page", "operator": op, "value": 1}));
            assert!(matches!(
                matches_filter(&doc, &f),
                Err(FilterError::ExpectedList { .. })
            ));
        }
    }

    #[test]
    fn test_exists() {
        let doc = doc_with(vec![("page", 10.into())]);
        assert!(check(json!({"field": "meta.page", "operator": "exists", "value": true}), &doc));
        assert!(!check(json!({"field": "meta.page", "operator": "exists", "value": false}), &doc));
        assert!(check(json!({"field": "meta.other", "operator": "exists", "value": false}), &doc));
        let f = filter(json!({"field": "meta.page", "operator": "exists", "value": "yes"}));
        assert!(matches!(
            matches_filter(&doc, &f),
            Err(FilterError::ExpectedBoolean { .. })
        ));
    }

    fn two_conditions(op: &str) -> FilterExpr {
        filter(json!({
            "operator": op,
            "conditions": [
                {"field": "meta.page", "operator": "==", "value": 10},
                {"field": "meta.type", "operator": "==", "value": "article"}
            ]
        }))
    }

    #[test]
    fn test_logical_operators() {
        let both = doc_with(vec![("page", 10.into()), ("type", "article".into())]);
        let one = doc_with(vec![("page", 20.into()), ("type", "article".into())]);
        let none = doc_with(vec![("page", 11.into()), ("value", "blog post".into())]);

        let and = two_conditions("AND");
        assert!(matches_filter(&both, &and).unwrap());
        assert!(!matches_filter(&one, &and).unwrap());
        assert!(!matches_filter(&none, &and).unwrap());

        let or = two_conditions("OR");
        assert!(matches_filter(&both, &or).unwrap());
        assert!(matches_filter(&one, &or).unwrap());
        assert!(!matches_filter(&none, &or).unwrap());

        let not = two_conditions("NOT");
        assert!(!matches_filter(&both, &not).unwrap());
        assert!(matches_filter(&one, &not).unwrap());
        assert!(matches_filter(&none, &not).unwrap());
    }

    #[test]
    fn test_and_short_circuits_before_error() {
        let doc = doc_with(vec![("page", 10.into())]);
        let f = FilterExpr::and(vec![
            FilterExpr::eq("meta.page", 11),
            FilterExpr::gt("meta.page", "not a date"),
        ]);
        assert!(!matches_filter(&doc, &f).unwrap());
    }

    #[test]
    fn test_or_short_circuits_before_error() {
        let doc = doc_with(vec![("page", 10.into())]);
        let f = FilterExpr::or(vec![
            FilterExpr::eq("meta.page", 10),
            FilterExpr::gt("meta.page", "not a date"),
        ]);
        assert!(matches_filter(&doc, &f).unwrap());
    }

    #[test]
    fn test_identity_filters_match_everything() {
        let doc = doc_with(vec![]);
        assert!(matches_filter(&doc, &FilterExpr::and(vec![])).unwrap());
        assert!(matches_filter(&doc, &FilterExpr::or(vec![])).unwrap());
        assert!(matches_filter(&doc, &FilterExpr::not(vec![])).unwrap());
        let nested = FilterExpr::and(vec![
            FilterExpr::not(vec![]),
            FilterExpr::exists("meta.anything", false),
        ]);
        assert!(matches_filter(&doc, &nested).unwrap());
    }

    #[test]
    fn test_deterministic() {
        let doc = doc_with(vec![("page", 10.into()), ("type", "article".into())]);
        let f = two_conditions("OR");
        let first = matches_filter(&doc, &f).unwrap();
        for _ in 0..10 {
            assert_eq!(matches_filter(&doc, &f).unwrap(), first);
        }
    }
}
