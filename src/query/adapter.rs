//! Compilation of caller arguments into native queries
//!
//! Only the boolean-query argument is interpreted. Its shape is
//! `{clause: {field: {"range": {bound: value}}}}` with schema field names;
//! predicates target the original names behind them. Bound values are passed
//! through untouched.

use serde_json::{Map, Value};

use crate::names::NameRegistry;
use crate::schema::constants::{BOOLEAN_QUERY, RANGE};

use super::compiled::{BoolQuery, CompiledQuery, RangeBound, RangeQuery};
use super::errors::{QueryError, QueryResult};
use super::kinds::BooleanQueryKind;

/// Compile the arguments of one field invocation
///
/// An absent or empty boolean query compiles to nothing, which the store
/// treats as match-all.
pub fn compile_arguments(names: &NameRegistry, arguments: &Map<String, Value>) -> QueryResult<Vec<CompiledQuery>> {
    let mut queries = Vec::new();
    for (key, value) in arguments {
        if key != BOOLEAN_QUERY || value.is_null() {
            continue;
        }
        let clauses = as_object(BOOLEAN_QUERY, value)?;
        let bool_query = compile_boolean_query(names, clauses)?;
        if !bool_query.is_empty() {
            queries.push(CompiledQuery::Bool(bool_query));
        }
    }
    Ok(queries)
}

/// Compile `{clause: {field: {operator: ...}}}` into one bool query
pub fn compile_boolean_query(names: &NameRegistry, clauses: &Map<String, Value>) -> QueryResult<BoolQuery> {
    let mut bool_query = BoolQuery::new();
    for (clause, fields) in clauses {
        let kind = BooleanQueryKind::from_name(clause)
            .ok_or_else(|| QueryError::invalid_argument(BOOLEAN_QUERY, format!("unknown clause '{}'", clause)))?;
        if fields.is_null() {
            continue;
        }
        for (field, operators) in as_object(clause, fields)? {
            if operators.is_null() {
                continue;
            }
            for query in compile_term_level_queries(names, field, as_object(field, operators)?)? {
                bool_query.add(kind, query);
            }
        }
    }
    Ok(bool_query)
}

fn compile_term_level_queries(
    names: &NameRegistry,
    field: &str,
    operators: &Map<String, Value>,
) -> QueryResult<Vec<CompiledQuery>> {
    let mut queries = Vec::new();
    for (operator, body) in operators {
        match operator.as_str() {
            RANGE if !body.is_null() => {
                queries.push(compile_range(names, field, as_object(RANGE, body)?)?.into());
            }
            _ => {}
        }
    }
    Ok(queries)
}

fn compile_range(names: &NameRegistry, field: &str, bounds: &Map<String, Value>) -> QueryResult<RangeQuery> {
    let mut range = RangeQuery::new(names.to_original_name(field)?);
    for (name, value) in bounds {
        if value.is_null() {
            continue;
        }
        if let Some(bound) = RangeBound::from_name(name) {
            range = range.bound(bound, value.clone());
        }
    }
    Ok(range)
}

fn as_object<'a>(argument: &str, value: &'a Value) -> QueryResult<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| QueryError::invalid_argument(argument, "expected an input object"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> NameRegistry {
        let mut names = NameRegistry::new();
        names.add_name("Price").unwrap();
        names.add_name("@timestamp").unwrap();
        names.add_name("@price").unwrap();
        names
    }

    fn args(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_filter_targets_original_name() {
        let names = registry();
        let queries = compile_arguments(
            &names,
            &args(json!({"boolean_query": {"filter": {"price": {"range": {"gte": 10, "lt": 20}}}}})),
        )
        .unwrap();
        assert_eq!(queries.len(), 1);
        let CompiledQuery::Bool(bool_query) = &queries[0] else {
            panic!("expected a bool query");
        };
        assert!(bool_query.must.is_empty());
        assert!(bool_query.should.is_empty());
        assert!(bool_query.must_not.is_empty());
        assert_eq!(
            bool_query.filter,
            vec![CompiledQuery::Range(
                RangeQuery::new("@price")
                    .bound(RangeBound::Gte, json!(10))
                    .bound(RangeBound::Lt, json!(20))
            )]
        );
    }

    #[test]
    fn test_unregistered_field_is_rejected() {
        let names = registry();
        let queries = compile_arguments(
            &names,
            &args(json!({"boolean_query": {"filter": {"label": {"range": {"gte": 1}}}}})),
        );
        assert!(matches!(queries, Err(QueryError::NameResolution(_))));
    }

    #[test]
    fn test_every_clause_kind() {
        let names = registry();
        let queries = compile_arguments(
            &names,
            &args(json!({"boolean_query": {
                "must": {"Price": {"range": {"gt": 1}}},
                "must_not": {"timestamp": {"range": {"lte": "2021-01-01T00:00:00Z"}}},
                "should": {"Price": {"range": {"lt": 100}}}
            }})),
        )
        .unwrap();

        let CompiledQuery::Bool(bool_query) = &queries[0] else {
            panic!("expected a bool query");
        };
        assert_eq!(bool_query.must.len(), 1);
        assert_eq!(bool_query.must_not.len(), 1);
        assert_eq!(bool_query.should.len(), 1);
        assert!(bool_query.filter.is_empty());
        assert_eq!(
            bool_query.must_not[0].to_native(),
            json!({"range": {"@timestamp": {"lte": "2021-01-01T00:00:00Z"}}})
        );
    }

    #[test]
    fn test_absent_and_empty_arguments() {
        let names = registry();
        assert!(compile_arguments(&names, &Map::new()).unwrap().is_empty());
        assert!(compile_arguments(&names, &args(json!({"size": 10}))).unwrap().is_empty());
        assert!(compile_arguments(&names, &args(json!({"boolean_query": null}))).unwrap().is_empty());
        assert!(compile_arguments(&names, &args(json!({"boolean_query": {}}))).unwrap().is_empty());
        assert!(compile_arguments(&names, &args(json!({"boolean_query": {"filter": null}})))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_null_bounds_are_dropped() {
        let names = registry();
        let queries = compile_arguments(
            &names,
            &args(json!({"boolean_query": {"filter": {"Price": {"range": {"gt": null, "lte": 5}}}}})),
        )
        .unwrap();
        assert_eq!(
            queries[0].to_native(),
            json!({"bool": {"filter": [{"range": {"Price": {"lte": 5}}}]}})
        );
    }

    #[test]
    fn test_malformed_argument() {
        let names = registry();
        let err = compile_arguments(&names, &args(json!({"boolean_query": [1, 2]}))).unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument { .. }));

        let err = compile_arguments(&names, &args(json!({"boolean_query": {"sometimes": {}}}))).unwrap_err();
        assert!(matches!(err, QueryError::InvalidArgument { .. }));
    }
}
