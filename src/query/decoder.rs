//! Decoding of store results into schema-shaped values

use std::collections::BTreeMap;

use serde_json::{json, Map, Number, Value};

use crate::names::NameRegistry;
use crate::schema::constants::{ID, KEY, VALUE};
use crate::store::{NativeAggregation, NativeDocument, PercentileBucket};

use super::errors::{QueryError, QueryResult};
use super::kinds::AggregationKind;

/// Rename a document's keys to schema names and inject `id` when selected
///
/// Keys without a schema name belong to fields the schema does not expose
/// and are dropped.
pub fn decode_document(names: &NameRegistry, document: &NativeDocument, include_identifier: bool) -> Map<String, Value> {
    let mut decoded = Map::new();
    for (key, value) in &document.source {
        match names.to_schema_name(key) {
            Ok(schema_name) => {
                decoded.insert(schema_name.to_string(), value.clone());
            }
            Err(_) => tracing::debug!(field = %key, "dropping field without schema name"),
        }
    }
    if include_identifier {
        decoded.insert(ID.to_string(), Value::String(document.id.clone()));
    }
    decoded
}

/// Unwrap per-field aggregation results of one kind
///
/// Values that are not finite become `null`.
pub fn decode_aggregations(
    names: &NameRegistry,
    kind: AggregationKind,
    results: &BTreeMap<String, NativeAggregation>,
) -> QueryResult<Map<String, Value>> {
    let mut decoded = Map::new();
    for (field, result) in results {
        let schema_name = names.to_schema_name(field)?;
        decoded.insert(schema_name.to_string(), decode_aggregation(kind, field, result)?);
    }
    Ok(decoded)
}

fn decode_aggregation(kind: AggregationKind, field: &str, result: &NativeAggregation) -> QueryResult<Value> {
    match (kind, result) {
        (
            AggregationKind::Avg | AggregationKind::Max | AggregationKind::Min,
            NativeAggregation::Single { value, value_as_string },
        ) => Ok(match (finite(*value), value_as_string) {
            (Some(_), Some(formatted)) => Value::String(formatted.clone()),
            (Some(value), None) => float_value(value),
            (None, _) => Value::Null,
        }),
        (AggregationKind::Cardinality, NativeAggregation::Single { value, .. }) => {
            Ok(finite(*value).map_or(Value::Null, |count| json!(count as i64)))
        }
        (AggregationKind::Percentiles, NativeAggregation::Percentiles(buckets)) => {
            Ok(Value::Array(buckets.iter().map(decode_percentile).collect()))
        }
        _ => Err(QueryError::MalformedResult(format!(
            "unexpected {} result shape for field '{}'",
            kind, field
        ))),
    }
}

fn decode_percentile(bucket: &PercentileBucket) -> Value {
    let mut pair = Map::new();
    pair.insert(KEY.to_string(), Value::String(format!("{:?}", bucket.percent)));
    pair.insert(VALUE.to_string(), finite(bucket.value).map_or(Value::Null, float_value));
    Value::Object(pair)
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn float_value(value: f64) -> Value {
    Number::from_f64(value).map_or(Value::Null, Value::Number)
}
