//! Resolvers of the aggregation fields
//!
//! `C_aggregations(boolean_query)` resolves to a scope holding its own
//! arguments. Each per-kind child compiles the scope, so one filter applies to
//! every kind requested under it.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::observability::{log_event_with_fields, Event};
use crate::query::{compile_arguments, decode_aggregations, encode_queries, select_fields, AggregationKind, QueryResult};

use super::context::{ExecutionContext, FieldRequest, Resolution};
use super::Resolve;

/// `C_aggregations`: captures the filter for its children
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationScopeResolver {
    /// Original collection name
    pub collection: String,
}

impl AggregationScopeResolver {
    pub fn new(collection: String) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl Resolve for AggregationScopeResolver {
    async fn resolve(&self, _ctx: &ExecutionContext, request: FieldRequest) -> QueryResult<Resolution> {
        Ok(Resolution::Scope(request.arguments))
    }
}

/// `agg_C.<kind>`: one aggregation kind over the selected fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationResolver {
    /// Original collection name
    pub collection: String,
    pub kind: AggregationKind,
}

impl AggregationResolver {
    pub fn new(collection: String, kind: AggregationKind) -> Self {
        Self { collection, kind }
    }
}

#[async_trait]
impl Resolve for AggregationResolver {
    async fn resolve(&self, ctx: &ExecutionContext, request: FieldRequest) -> QueryResult<Resolution> {
        let scope = request.scope.unwrap_or_default();
        let selection = select_fields(ctx.names(), &request.selection)?;
        let queries = compile_arguments(ctx.names(), &scope)?;
        if ctx.query_logging() {
            let encoded = encode_queries(&queries).map_or_else(|| "match_all".to_string(), |q| q.to_string());
            log_event_with_fields(
                Event::QueryCompiled,
                &[
                    ("collection", self.collection.as_str()),
                    ("aggregation", self.kind.as_str()),
                    ("query", encoded.as_str()),
                ],
            );
        }

        let results = if selection.native_fields.is_empty() {
            Default::default()
        } else {
            ctx.store()
                .search_with_aggregation(&self.collection, &selection.native_fields, &queries, self.kind)
                .await?
        };

        let fields = results.len().to_string();
        log_event_with_fields(
            Event::QueryExecuted,
            &[
                ("collection", self.collection.as_str()),
                ("aggregation", self.kind.as_str()),
                ("fields", fields.as_str()),
            ],
        );
        let decoded: Map<String, Value> = decode_aggregations(ctx.names(), self.kind, &results)?;
        Ok(Resolution::Value(Value::Object(decoded)))
    }
}
