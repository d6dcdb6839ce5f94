//! Elasticsearch over its REST API
//!
//! Hosts are tried in order; a host that cannot be reached is skipped, while
//! an HTTP error from a reachable host is final.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Map, Value};

use crate::query::{encode_queries, AggregationKind, CompiledQuery};

use super::errors::{StoreError, StoreResult};
use super::{DocumentStore, NativeAggregation, NativeDocument, PercentileBucket};

/// Elasticsearch client
#[derive(Debug, Clone)]
pub struct ElasticsearchStore {
    client: Client,
    hosts: Vec<String>,
    log_results: bool,
}

impl ElasticsearchStore {
    /// Create a client for `hosts` (base URLs such as `http://localhost:9200`)
    pub fn new(hosts: Vec<String>, timeout: Duration) -> StoreResult<Self> {
        if hosts.is_empty() {
            return Err(StoreError::Connection("no hosts configured".to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StoreError::Internal(e.to_string()))?;
        Ok(Self {
            client,
            hosts: hosts.into_iter().map(|h| h.trim_end_matches('/').to_string()).collect(),
            log_results: false,
        })
    }

    /// Log raw response bodies
    pub fn with_result_logging(mut self, enabled: bool) -> Self {
        self.log_results = enabled;
        self
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&Value>,
    ) -> StoreResult<(StatusCode, Value)> {
        let mut last_error = None;
        for host in &self.hosts {
            let mut request = self.client.request(method.clone(), format!("{}{}", host, path)).query(query);
            if let Some(body) = body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(e) => {
                    let err = send_error(host, &e);
                    if !err.is_retryable_on_other_host() {
                        return Err(err);
                    }
                    tracing::warn!(host = %host, error = %e, "store host unreachable");
                    last_error = Some(err);
                    continue;
                }
            };

            let status = response.status();
            let payload: Value = response
                .json()
                .await
                .map_err(|e| StoreError::Parse(e.to_string()))?;
            if self.log_results {
                tracing::debug!(path = %path, status = status.as_u16(), body = %payload, "store response");
            }
            return Ok((status, payload));
        }
        Err(last_error.unwrap_or_else(|| StoreError::Connection("no hosts configured".to_string())))
    }
}

#[async_trait]
impl DocumentStore for ElasticsearchStore {
    async fn fetch_mappings(&self) -> StoreResult<Value> {
        let (status, payload) = self.request(Method::GET, "/_mapping", &[], None).await?;
        check_status(status, &payload, None)?;
        Ok(payload)
    }

    async fn get_by_id(&self, collection: &str, id: &str, fields: &[String]) -> StoreResult<Option<NativeDocument>> {
        let path = format!("/{}/_doc/{}", collection, id);
        let (status, payload) = self
            .request(Method::GET, &path, &source_parameters(fields), None)
            .await?;
        if status == StatusCode::NOT_FOUND && payload.get("found") == Some(&Value::Bool(false)) {
            return Ok(None);
        }
        check_status(status, &payload, Some(collection))?;
        parse_document(&payload)
    }

    async fn search(
        &self,
        collection: &str,
        size: usize,
        fields: &[String],
        queries: &[CompiledQuery],
    ) -> StoreResult<Vec<NativeDocument>> {
        let body = search_body(size, fields, queries);
        let path = format!("/{}/_search", collection);
        let (status, payload) = self.request(Method::POST, &path, &[], Some(&body)).await?;
        check_status(status, &payload, Some(collection))?;
        parse_hits(&payload)
    }

    async fn search_with_aggregation(
        &self,
        collection: &str,
        fields: &[String],
        queries: &[CompiledQuery],
        kind: AggregationKind,
    ) -> StoreResult<BTreeMap<String, NativeAggregation>> {
        if fields.is_empty() {
            return Ok(BTreeMap::new());
        }
        let body = aggregation_body(fields, queries, kind);
        let path = format!("/{}/_search", collection);
        let (status, payload) = self.request(Method::POST, &path, &[], Some(&body)).await?;
        check_status(status, &payload, Some(collection))?;
        parse_aggregations(kind, fields, &payload)
    }
}

/// Only an unreachable host is worth skipping
fn send_error(host: &str, e: &reqwest::Error) -> StoreError {
    if e.is_connect() || e.is_timeout() {
        StoreError::Connection(format!("{}: {}", host, e))
    } else {
        StoreError::Internal(format!("{}: {}", host, e))
    }
}

fn check_status(status: StatusCode, payload: &Value, collection: Option<&str>) -> StoreResult<()> {
    if status.is_success() {
        return Ok(());
    }
    let error_type = payload.pointer("/error/type").and_then(Value::as_str);
    if let (Some("index_not_found_exception"), Some(collection)) = (error_type, collection) {
        return Err(StoreError::UnknownCollection(collection.to_string()));
    }
    let reason = payload
        .pointer("/error/reason")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| payload.to_string());
    Err(StoreError::Http {
        status: status.as_u16(),
        reason,
    })
}

/// Query-string source filtering for a single-document fetch
fn source_parameters(fields: &[String]) -> Vec<(&'static str, String)> {
    if fields.is_empty() {
        vec![("_source", "false".to_string())]
    } else {
        vec![("_source_includes", fields.join(","))]
    }
}

fn source_filter(fields: &[String]) -> Value {
    if fields.is_empty() {
        Value::Bool(false)
    } else {
        json!(fields)
    }
}

/// Body of a document search
pub(crate) fn search_body(size: usize, fields: &[String], queries: &[CompiledQuery]) -> Value {
    let mut body = Map::new();
    body.insert("size".to_string(), json!(size));
    body.insert("_source".to_string(), source_filter(fields));
    if let Some(query) = encode_queries(queries) {
        body.insert("query".to_string(), query);
    }
    Value::Object(body)
}

/// Aggregation name of the field at `position`
///
/// Field names may contain characters the store rejects in aggregation names,
/// so requests are keyed by kind and position instead.
fn aggregation_key(kind: AggregationKind, position: usize) -> String {
    format!("{}_{}", kind, position)
}

/// Body of an aggregation search, one aggregation per field
pub(crate) fn aggregation_body(fields: &[String], queries: &[CompiledQuery], kind: AggregationKind) -> Value {
    let mut aggregations = Map::new();
    for (position, field) in fields.iter().enumerate() {
        let mut definition = Map::new();
        definition.insert("field".to_string(), json!(field));
        if kind == AggregationKind::Percentiles {
            definition.insert("keyed".to_string(), Value::Bool(false));
        }
        let mut aggregation = Map::new();
        aggregation.insert(kind.as_str().to_string(), Value::Object(definition));
        aggregations.insert(aggregation_key(kind, position), Value::Object(aggregation));
    }

    let mut body = Map::new();
    body.insert("size".to_string(), json!(0));
    if let Some(query) = encode_queries(queries) {
        body.insert("query".to_string(), query);
    }
    body.insert("aggs".to_string(), Value::Object(aggregations));
    Value::Object(body)
}

fn parse_hit(hit: &Value) -> StoreResult<NativeDocument> {
    let id = hit
        .get("_id")
        .and_then(Value::as_str)
        .ok_or_else(|| StoreError::Parse("hit without '_id'".to_string()))?;
    let source = match hit.get("_source") {
        Some(Value::Object(source)) => source.clone(),
        None | Some(Value::Null) => Map::new(),
        Some(other) => return Err(StoreError::Parse(format!("'_source' is not an object: {}", other))),
    };
    Ok(NativeDocument::new(id, source))
}

pub(crate) fn parse_document(payload: &Value) -> StoreResult<Option<NativeDocument>> {
    if payload.get("found") == Some(&Value::Bool(false)) {
        return Ok(None);
    }
    parse_hit(payload).map(Some)
}

pub(crate) fn parse_hits(payload: &Value) -> StoreResult<Vec<NativeDocument>> {
    payload
        .pointer("/hits/hits")
        .and_then(Value::as_array)
        .ok_or_else(|| StoreError::Parse("response without 'hits.hits'".to_string()))?
        .iter()
        .map(parse_hit)
        .collect()
}

/// Results keyed back by the original field names in `fields`
pub(crate) fn parse_aggregations(
    kind: AggregationKind,
    fields: &[String],
    payload: &Value,
) -> StoreResult<BTreeMap<String, NativeAggregation>> {
    let aggregations = match payload.get("aggregations") {
        Some(Value::Object(aggregations)) => aggregations,
        None => return Ok(BTreeMap::new()),
        Some(_) => return Err(StoreError::Parse("'aggregations' is not an object".to_string())),
    };

    let mut results = BTreeMap::new();
    for (position, field) in fields.iter().enumerate() {
        let result = match aggregations.get(&aggregation_key(kind, position)) {
            Some(result) => result,
            None => continue,
        };
        let parsed = match kind {
            AggregationKind::Percentiles => parse_percentiles(field, result)?,
            AggregationKind::Avg | AggregationKind::Max | AggregationKind::Min | AggregationKind::Cardinality => {
                NativeAggregation::Single {
                    value: result.get("value").and_then(Value::as_f64),
                    value_as_string: result
                        .get("value_as_string")
                        .and_then(Value::as_str)
                        .map(str::to_string),
                }
            }
        };
        results.insert(field.clone(), parsed);
    }
    Ok(results)
}

fn parse_percentiles(field: &str, result: &Value) -> StoreResult<NativeAggregation> {
    let values = result
        .get("values")
        .ok_or_else(|| StoreError::Parse(format!("percentiles of '{}' without 'values'", field)))?;

    let mut buckets = Vec::new();
    match values {
        // keyed: false
        Value::Array(entries) => {
            for entry in entries {
                let percent = entry
                    .get("key")
                    .and_then(Value::as_f64)
                    .ok_or_else(|| StoreError::Parse(format!("percentile of '{}' without 'key'", field)))?;
                buckets.push(PercentileBucket {
                    percent,
                    value: entry.get("value").and_then(Value::as_f64),
                });
            }
        }
        // keyed: true, as returned by stores that ignore the flag
        Value::Object(entries) => {
            for (key, value) in entries {
                let percent: f64 = match key.parse() {
                    Ok(percent) => percent,
                    Err(_) => continue,
                };
                buckets.push(PercentileBucket {
                    percent,
                    value: value.as_f64(),
                });
            }
            buckets.sort_by(|a, b| a.percent.total_cmp(&b.percent));
        }
        _ => return Err(StoreError::Parse(format!("percentiles of '{}' are malformed", field))),
    }
    Ok(NativeAggregation::Percentiles(buckets))
}
