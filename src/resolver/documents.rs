//! Resolvers of the list and by-id root fields

use async_trait::async_trait;
use serde_json::Value;

use crate::observability::{log_event_with_fields, Event};
use crate::query::{compile_arguments, decode_document, encode_queries, select_fields, QueryError, QueryResult};
use crate::schema::constants::{ID, SIZE};

use super::context::{ExecutionContext, FieldRequest, Resolution};
use super::Resolve;

/// `C(size, boolean_query)`: matching documents of one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentListResolver {
    /// Original collection name
    pub collection: String,
}

impl DocumentListResolver {
    pub fn new(collection: String) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl Resolve for DocumentListResolver {
    async fn resolve(&self, ctx: &ExecutionContext, request: FieldRequest) -> QueryResult<Resolution> {
        let size = size_argument(&request)?;
        let selection = select_fields(ctx.names(), &request.selection)?;
        let queries = compile_arguments(ctx.names(), &request.arguments)?;
        if ctx.query_logging() {
            let encoded = encode_queries(&queries).map_or_else(|| "match_all".to_string(), |q| q.to_string());
            log_event_with_fields(
                Event::QueryCompiled,
                &[("collection", self.collection.as_str()), ("query", encoded.as_str())],
            );
        }

        let documents = ctx
            .store()
            .search(&self.collection, size, &selection.native_fields, &queries)
            .await?;

        let hits = documents.len().to_string();
        log_event_with_fields(
            Event::QueryExecuted,
            &[("collection", self.collection.as_str()), ("hits", hits.as_str())],
        );
        Ok(Resolution::Value(Value::Array(
            documents
                .iter()
                .map(|document| Value::Object(decode_document(ctx.names(), document, selection.include_identifier)))
                .collect(),
        )))
    }
}

fn size_argument(request: &FieldRequest) -> QueryResult<usize> {
    let size = request
        .arguments
        .get(SIZE)
        .and_then(Value::as_i64)
        .ok_or_else(|| QueryError::invalid_argument(SIZE, "expected an integer"))?;
    usize::try_from(size).map_err(|_| QueryError::invalid_argument(SIZE, "must not be negative"))
}

/// `C_by_id(id)`: one document of one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentByIdResolver {
    /// Original collection name
    pub collection: String,
}

impl DocumentByIdResolver {
    pub fn new(collection: String) -> Self {
        Self { collection }
    }
}

#[async_trait]
impl Resolve for DocumentByIdResolver {
    async fn resolve(&self, ctx: &ExecutionContext, request: FieldRequest) -> QueryResult<Resolution> {
        let id = request
            .arguments
            .get(ID)
            .and_then(Value::as_str)
            .ok_or_else(|| QueryError::invalid_argument(ID, "expected a string"))?;
        let selection = select_fields(ctx.names(), &request.selection)?;

        let document = ctx
            .store()
            .get_by_id(&self.collection, id, &selection.native_fields)
            .await?;

        let found = if document.is_some() { "1" } else { "0" };
        log_event_with_fields(
            Event::QueryExecuted,
            &[("collection", self.collection.as_str()), ("hits", found)],
        );
        Ok(Resolution::Value(document.map_or(Value::Null, |document| {
            Value::Object(decode_document(ctx.names(), &document, selection.include_identifier))
        })))
    }
}
