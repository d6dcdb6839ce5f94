//! Document store access
//!
//! The engine talks to the store only through [`DocumentStore`]. Collection
//! and field names crossing this boundary are always original names.

mod elasticsearch;
mod errors;
mod memory;

pub use elasticsearch::ElasticsearchStore;
pub use errors::{StoreError, StoreResult};
pub use memory::InMemoryStore;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::query::{AggregationKind, CompiledQuery};

/// One stored document
#[derive(Debug, Clone, PartialEq)]
pub struct NativeDocument {
    /// Store-assigned identifier
    pub id: String,
    /// Projected source, keyed by original field name
    pub source: Map<String, Value>,
}

impl NativeDocument {
    pub fn new(id: impl Into<String>, source: Map<String, Value>) -> Self {
        Self { id: id.into(), source }
    }
}

/// One percentile of a percentiles aggregation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentileBucket {
    pub percent: f64,
    pub value: Option<f64>,
}

/// Result of aggregating one field
#[derive(Debug, Clone, PartialEq)]
pub enum NativeAggregation {
    /// avg, max, min and cardinality
    Single {
        value: Option<f64>,
        /// Formatted value, reported for date fields
        value_as_string: Option<String>,
    },
    /// Percentiles in ascending percent order
    Percentiles(Vec<PercentileBucket>),
}

impl NativeAggregation {
    pub fn single(value: f64) -> Self {
        NativeAggregation::Single {
            value: Some(value),
            value_as_string: None,
        }
    }
}

/// Operations the engine needs from a document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Raw mappings of every collection:
    /// `{collection: {"mappings": {"properties": {...}}}}`
    async fn fetch_mappings(&self) -> StoreResult<Value>;

    /// Fetch one document, projected to `fields`
    async fn get_by_id(&self, collection: &str, id: &str, fields: &[String]) -> StoreResult<Option<NativeDocument>>;

    /// Fetch up to `size` documents matching every query
    async fn search(
        &self,
        collection: &str,
        size: usize,
        fields: &[String],
        queries: &[CompiledQuery],
    ) -> StoreResult<Vec<NativeDocument>>;

    /// Aggregate each of `fields` over the documents matching every query
    async fn search_with_aggregation(
        &self,
        collection: &str,
        fields: &[String],
        queries: &[CompiledQuery],
        kind: AggregationKind,
    ) -> StoreResult<BTreeMap<String, NativeAggregation>>;
}
