//! In-process document store
//!
//! Holds JSON documents per collection and answers the same operations as a
//! real store: compiled queries are evaluated directly, aggregations are
//! computed over the matching documents. Used by tests and local demos.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat};
use serde_json::{json, Map, Value};

use crate::query::{matches_all, AggregationKind, CompiledQuery};

use super::errors::{StoreError, StoreResult};
use super::{DocumentStore, NativeAggregation, NativeDocument, PercentileBucket};

/// Percentiles reported when none are requested explicitly
pub const DEFAULT_PERCENTS: [f64; 7] = [1.0, 5.0, 25.0, 50.0, 75.0, 95.0, 99.0];

#[derive(Debug, Default)]
struct Collection {
    mapping: Map<String, Value>,
    /// id -> source, in insertion order
    documents: Vec<(String, Map<String, Value>)>,
}

/// Document store backed by in-memory JSON
#[derive(Debug, Default)]
pub struct InMemoryStore {
    collections: RwLock<BTreeMap<String, Collection>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or replace a collection with the given field mapping
    ///
    /// `properties` is `{field: {"type": tag}}` as the store reports it.
    pub fn create_collection(&self, name: &str, properties: Value) -> StoreResult<()> {
        let mapping = match properties {
            Value::Object(mapping) => mapping,
            other => return Err(StoreError::Parse(format!("properties must be an object, got {}", other))),
        };
        let mut collections = self.write()?;
        collections.insert(
            name.to_string(),
            Collection {
                mapping,
                documents: Vec::new(),
            },
        );
        Ok(())
    }

    /// Insert or replace a document
    pub fn insert(&self, collection: &str, id: &str, source: Value) -> StoreResult<()> {
        let source = match source {
            Value::Object(source) => source,
            other => return Err(StoreError::Parse(format!("document must be an object, got {}", other))),
        };
        let mut collections = self.write()?;
        let target = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        match target.documents.iter_mut().find(|(existing, _)| existing == id) {
            Some((_, existing)) => *existing = source,
            None => target.documents.push((id.to_string(), source)),
        }
        Ok(())
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, BTreeMap<String, Collection>>> {
        self.collections
            .read()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, BTreeMap<String, Collection>>> {
        self.collections
            .write()
            .map_err(|_| StoreError::Internal("lock poisoned".to_string()))
    }

    fn matching(&self, collection: &str, queries: &[CompiledQuery]) -> StoreResult<Vec<(String, Map<String, Value>)>> {
        let collections = self.read()?;
        let target = collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        Ok(target
            .documents
            .iter()
            .filter(|(_, source)| matches_all(queries, source))
            .cloned()
            .collect())
    }

    fn date_fields(&self, collection: &str) -> StoreResult<BTreeSet<String>> {
        let collections = self.read()?;
        let target = collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        Ok(target
            .mapping
            .iter()
            .filter(|(_, property)| property.get("type").and_then(Value::as_str) == Some("date"))
            .map(|(name, _)| name.clone())
            .collect())
    }
}

fn project(source: &Map<String, Value>, fields: &[String]) -> Map<String, Value> {
    fields
        .iter()
        .filter_map(|f| source.get(f).map(|v| (f.clone(), v.clone())))
        .collect()
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn fetch_mappings(&self) -> StoreResult<Value> {
        let collections = self.read()?;
        let mut mappings = Map::new();
        for (name, collection) in collections.iter() {
            mappings.insert(
                name.clone(),
                json!({ "mappings": { "properties": Value::Object(collection.mapping.clone()) } }),
            );
        }
        Ok(Value::Object(mappings))
    }

    async fn get_by_id(&self, collection: &str, id: &str, fields: &[String]) -> StoreResult<Option<NativeDocument>> {
        let collections = self.read()?;
        let target = collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;
        Ok(target
            .documents
            .iter()
            .find(|(existing, _)| existing == id)
            .map(|(id, source)| NativeDocument::new(id.clone(), project(source, fields))))
    }

    async fn search(
        &self,
        collection: &str,
        size: usize,
        fields: &[String],
        queries: &[CompiledQuery],
    ) -> StoreResult<Vec<NativeDocument>> {
        Ok(self
            .matching(collection, queries)?
            .into_iter()
            .take(size)
            .map(|(id, source)| NativeDocument::new(id, project(&source, fields)))
            .collect())
    }

    async fn search_with_aggregation(
        &self,
        collection: &str,
        fields: &[String],
        queries: &[CompiledQuery],
        kind: AggregationKind,
    ) -> StoreResult<BTreeMap<String, NativeAggregation>> {
        let documents = self.matching(collection, queries)?;
        let dates = self.date_fields(collection)?;
        let mut results = BTreeMap::new();
        for field in fields {
            let values: Vec<&Value> = documents
                .iter()
                .filter_map(|(_, source)| source.get(field))
                .filter(|v| !v.is_null())
                .collect();
            let mut aggregation = aggregate(kind, &values);
            if dates.contains(field) && kind != AggregationKind::Cardinality {
                aggregation = format_as_date(aggregation);
            }
            results.insert(field.clone(), aggregation);
        }
        Ok(results)
    }
}

/// Numeric view of a stored value; dates become epoch milliseconds
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|at| at.timestamp_millis() as f64),
        _ => None,
    }
}

fn aggregate(kind: AggregationKind, values: &[&Value]) -> NativeAggregation {
    let numbers: Vec<f64> = values.iter().filter_map(|v| numeric(v)).collect();
    match kind {
        AggregationKind::Avg => NativeAggregation::Single {
            value: (!numbers.is_empty()).then(|| numbers.iter().sum::<f64>() / numbers.len() as f64),
            value_as_string: None,
        },
        // min/max over nothing are the fold identities, as older stores report them
        AggregationKind::Max => NativeAggregation::single(numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        AggregationKind::Min => NativeAggregation::single(numbers.iter().copied().fold(f64::INFINITY, f64::min)),
        AggregationKind::Cardinality => {
            let distinct: BTreeSet<String> = values.iter().map(|v| v.to_string()).collect();
            NativeAggregation::single(distinct.len() as f64)
        }
        AggregationKind::Percentiles => {
            let mut sorted = numbers;
            sorted.sort_by(|a, b| a.total_cmp(b));
            NativeAggregation::Percentiles(
                DEFAULT_PERCENTS
                    .iter()
                    .map(|percent| PercentileBucket {
                        percent: *percent,
                        value: percentile(&sorted, *percent),
                    })
                    .collect(),
            )
        }
    }
}

/// Attach the RFC 3339 rendering of a finite epoch-millisecond result
fn format_as_date(aggregation: NativeAggregation) -> NativeAggregation {
    match aggregation {
        NativeAggregation::Single {
            value: Some(value),
            value_as_string: None,
        } if value.is_finite() => NativeAggregation::Single {
            value: Some(value),
            value_as_string: DateTime::from_timestamp_millis(value.round() as i64)
                .map(|at| at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        },
        other => other,
    }
}

/// Linear interpolation between closest ranks
fn percentile(sorted: &[f64], percent: f64) -> Option<f64> {
    match sorted {
        [] => None,
        [only] => Some(*only),
        _ => {
            let rank = percent / 100.0 * (sorted.len() - 1) as f64;
            let lower = rank.floor() as usize;
            let upper = rank.ceil() as usize;
            let weight = rank - lower as f64;
            Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
        }
    }
}
