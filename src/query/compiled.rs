//! Native query representation
//!
//! Compiled queries mirror the store's query DSL: a bool query whose clause
//! groups hold range predicates. They encode to the DSL's JSON form and can be
//! evaluated directly against a JSON document.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use super::kinds::BooleanQueryKind;

/// Range comparison operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeBound {
    /// Greater than
    Gt,
    /// Greater than or equal
    Gte,
    /// Less than
    Lt,
    /// Less than or equal
    Lte,
}

impl RangeBound {
    pub const ALL: [RangeBound; 4] = [RangeBound::Gt, RangeBound::Gte, RangeBound::Lt, RangeBound::Lte];

    pub fn as_str(&self) -> &'static str {
        match self {
            RangeBound::Gt => "gt",
            RangeBound::Gte => "gte",
            RangeBound::Lt => "lt",
            RangeBound::Lte => "lte",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "gt" => Some(RangeBound::Gt),
            "gte" => Some(RangeBound::Gte),
            "lt" => Some(RangeBound::Lt),
            "lte" => Some(RangeBound::Lte),
            _ => None,
        }
    }

    /// Whether `ordering` (document value vs. bound) satisfies this bound
    fn admits(&self, ordering: Ordering) -> bool {
        match self {
            RangeBound::Gt => ordering == Ordering::Greater,
            RangeBound::Gte => ordering != Ordering::Less,
            RangeBound::Lt => ordering == Ordering::Less,
            RangeBound::Lte => ordering != Ordering::Greater,
        }
    }
}

/// Range predicate on one field, targeting the field's original name
#[derive(Debug, Clone, PartialEq)]
pub struct RangeQuery {
    pub field: String,
    pub bounds: BTreeMap<RangeBound, Value>,
}

impl RangeQuery {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            bounds: BTreeMap::new(),
        }
    }

    pub fn bound(mut self, bound: RangeBound, value: Value) -> Self {
        self.bounds.insert(bound, value);
        self
    }

    pub fn get(&self, bound: RangeBound) -> Option<&Value> {
        self.bounds.get(&bound)
    }

    pub fn to_native(&self) -> Value {
        let bounds: Map<String, Value> = self
            .bounds
            .iter()
            .map(|(bound, value)| (bound.as_str().to_string(), value.clone()))
            .collect();
        let mut field = Map::new();
        field.insert(self.field.clone(), Value::Object(bounds));
        json!({ "range": field })
    }

    /// A missing field never matches
    pub fn matches(&self, document: &Map<String, Value>) -> bool {
        let value = match document.get(&self.field) {
            Some(value) if !value.is_null() => value,
            _ => return false,
        };
        self.bounds.iter().all(|(bound, limit)| {
            compare_values(value, limit).is_some_and(|ordering| bound.admits(ordering))
        })
    }
}

/// Compound query with four clause groups
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    pub must: Vec<CompiledQuery>,
    pub must_not: Vec<CompiledQuery>,
    pub filter: Vec<CompiledQuery>,
    pub should: Vec<CompiledQuery>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a query under the clause group of `kind`
    pub fn add(&mut self, kind: BooleanQueryKind, query: CompiledQuery) {
        self.clause_mut(kind).push(query);
    }

    pub fn clause(&self, kind: BooleanQueryKind) -> &[CompiledQuery] {
        match kind {
            BooleanQueryKind::Must => &self.must,
            BooleanQueryKind::MustNot => &self.must_not,
            BooleanQueryKind::Filter => &self.filter,
            BooleanQueryKind::Should => &self.should,
        }
    }

    fn clause_mut(&mut self, kind: BooleanQueryKind) -> &mut Vec<CompiledQuery> {
        match kind {
            BooleanQueryKind::Must => &mut self.must,
            BooleanQueryKind::MustNot => &mut self.must_not,
            BooleanQueryKind::Filter => &mut self.filter,
            BooleanQueryKind::Should => &mut self.should,
        }
    }

    pub fn is_empty(&self) -> bool {
        BooleanQueryKind::ALL.iter().all(|kind| self.clause(*kind).is_empty())
    }

    pub fn to_native(&self) -> Value {
        let mut clauses = Map::new();
        for kind in BooleanQueryKind::ALL {
            let clause = self.clause(kind);
            if !clause.is_empty() {
                clauses.insert(
                    kind.as_str().to_string(),
                    Value::Array(clause.iter().map(CompiledQuery::to_native).collect()),
                );
            }
        }
        json!({ "bool": clauses })
    }

    /// Evaluate with the store's bool semantics
    ///
    /// `should` is only required when the query has no `must` or `filter`
    /// clauses, in which case at least one `should` clause has to match.
    pub fn matches(&self, document: &Map<String, Value>) -> bool {
        let required = self.must.iter().chain(&self.filter).all(|q| q.matches(document));
        let excluded = self.must_not.iter().any(|q| q.matches(document));
        let optional = self.should.is_empty()
            || !self.must.is_empty()
            || !self.filter.is_empty()
            || self.should.iter().any(|q| q.matches(document));
        required && !excluded && optional
    }
}

/// A query handed to the store
#[derive(Debug, Clone, PartialEq)]
pub enum CompiledQuery {
    Range(RangeQuery),
    Bool(BoolQuery),
}

impl CompiledQuery {
    pub fn to_native(&self) -> Value {
        match self {
            CompiledQuery::Range(range) => range.to_native(),
            CompiledQuery::Bool(bool_query) => bool_query.to_native(),
        }
    }

    pub fn matches(&self, document: &Map<String, Value>) -> bool {
        match self {
            CompiledQuery::Range(range) => range.matches(document),
            CompiledQuery::Bool(bool_query) => bool_query.matches(document),
        }
    }
}

impl From<RangeQuery> for CompiledQuery {
    fn from(range: RangeQuery) -> Self {
        CompiledQuery::Range(range)
    }
}

impl From<BoolQuery> for CompiledQuery {
    fn from(bool_query: BoolQuery) -> Self {
        CompiledQuery::Bool(bool_query)
    }
}

/// Encode a list of compiled queries as one DSL query
///
/// No queries means no `query` clause at all; several are combined under an
/// outer `bool.must`.
pub fn encode_queries(queries: &[CompiledQuery]) -> Option<Value> {
    match queries {
        [] => None,
        [single] => Some(single.to_native()),
        many => {
            let mut outer = BoolQuery::new();
            outer.must = many.to_vec();
            Some(outer.to_native())
        }
    }
}

/// Whether a document satisfies every query
pub fn matches_all(queries: &[CompiledQuery], document: &Map<String, Value>) -> bool {
    queries.iter().all(|q| q.matches(document))
}

/// Order two JSON values the way a range predicate compares them
///
/// Numbers compare numerically. Strings that parse as RFC 3339 timestamps
/// compare as epoch milliseconds, so a date bound works against both string
/// and numeric stored dates. Anything else compares as text or not at all.
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (comparable(a)?, comparable(b)?) {
        (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(&b),
        (Comparable::Text(a), Comparable::Text(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

enum Comparable<'a> {
    Number(f64),
    Text(&'a str),
}

fn comparable(value: &Value) -> Option<Comparable<'_>> {
    match value {
        Value::Number(n) => n.as_f64().map(Comparable::Number),
        Value::String(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(at) => Some(Comparable::Number(at.timestamp_millis() as f64)),
            Err(_) => Some(Comparable::Text(s)),
        },
        Value::Bool(b) => Some(Comparable::Number(if *b { 1.0 } else { 0.0 })),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_range_encoding() {
        let range = RangeQuery::new("Price")
            .bound(RangeBound::Lt, json!(20))
            .bound(RangeBound::Gte, json!(10));
        assert_eq!(range.to_native(), json!({"range": {"Price": {"gte": 10, "lt": 20}}}));
    }

    #[test]
    fn test_bool_encoding_skips_empty_clauses() {
        let mut query = BoolQuery::new();
        query.add(
            BooleanQueryKind::Filter,
            RangeQuery::new("Price").bound(RangeBound::Gt, json!(1)).into(),
        );
        assert_eq!(
            query.to_native(),
            json!({"bool": {"filter": [{"range": {"Price": {"gt": 1}}}]}})
        );
        assert!(!query.is_empty());
        assert!(BoolQuery::new().is_empty());
    }

    #[test]
    fn test_encode_queries() {
        assert_eq!(encode_queries(&[]), None);

        let a: CompiledQuery = RangeQuery::new("a").bound(RangeBound::Gt, json!(1)).into();
        let b: CompiledQuery = RangeQuery::new("b").bound(RangeBound::Lt, json!(2)).into();
        assert_eq!(encode_queries(&[a.clone()]), Some(a.to_native()));
        assert_eq!(
            encode_queries(&[a, b]),
            Some(json!({"bool": {"must": [
                {"range": {"a": {"gt": 1}}},
                {"range": {"b": {"lt": 2}}}
            ]}}))
        );
    }

    #[test]
    fn test_range_matches_numbers() {
        let range = RangeQuery::new("Price")
            .bound(RangeBound::Gte, json!(10))
            .bound(RangeBound::Lt, json!(20));

        assert!(range.matches(&doc(json!({"Price": 10}))));
        assert!(range.matches(&doc(json!({"Price": 19.5}))));
        assert!(!range.matches(&doc(json!({"Price": 20}))));
        assert!(!range.matches(&doc(json!({"Price": null}))));
        assert!(!range.matches(&doc(json!({"other": 15}))));
    }

    #[test]
    fn test_range_matches_dates() {
        let range = RangeQuery::new("@timestamp").bound(RangeBound::Gt, json!("2021-01-01T00:00:00Z"));

        assert!(range.matches(&doc(json!({"@timestamp": "2021-06-01T12:00:00+02:00"}))));
        assert!(!range.matches(&doc(json!({"@timestamp": "2020-12-31T23:59:59Z"}))));
        // epoch milliseconds for 2021-01-02
        assert!(range.matches(&doc(json!({"@timestamp": 1609545600000_i64}))));
    }

    #[test]
    fn test_bool_semantics() {
        let cheap: CompiledQuery = RangeQuery::new("p").bound(RangeBound::Lt, json!(10)).into();
        let recent: CompiledQuery = RangeQuery::new("t").bound(RangeBound::Gte, json!(100)).into();

        let mut query = BoolQuery::new();
        query.add(BooleanQueryKind::Filter, cheap.clone());
        query.add(BooleanQueryKind::MustNot, recent.clone());
        assert!(query.matches(&doc(json!({"p": 5, "t": 50}))));
        assert!(!query.matches(&doc(json!({"p": 5, "t": 150}))));
        assert!(!query.matches(&doc(json!({"p": 15, "t": 50}))));

        let mut either = BoolQuery::new();
        either.add(BooleanQueryKind::Should, cheap);
        either.add(BooleanQueryKind::Should, recent);
        assert!(either.matches(&doc(json!({"p": 15, "t": 150}))));
        assert!(!either.matches(&doc(json!({"p": 15, "t": 50}))));

        assert!(BoolQuery::new().matches(&doc(json!({}))));
    }
}
