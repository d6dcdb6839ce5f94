//! GraphQL Execution Tests
//!
//! End-to-end: mappings from an in-memory store, schema built and bound, then
//! queried through the executable schema exactly as the HTTP endpoint would.

use std::sync::Arc;

use async_graphql::dynamic::Schema;
use serde_json::{json, Value};
use sturgeon::graphql::build_executable_schema;
use sturgeon::names::NameRegistry;
use sturgeon::resolver::ExecutionContext;
use sturgeon::schema::SchemaBuilder;
use sturgeon::store::{DocumentStore, InMemoryStore};

// =============================================================================
// Helper Functions
// =============================================================================

const FIRST: &str = "2b4c3d2e-1f0a-4b5c-9d8e-7f6a5b4c3d2e";
const SECOND: &str = "7c9e6679-7425-40de-944b-e07fc1f90ae7";
const THIRD: &str = "f47ac10b-58cc-4372-a567-0e02b2c3d479";

fn sensor_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store
        .create_collection(
            "sensors",
            json!({
                "Price": {"type": "float"},
                "@timestamp": {"type": "date"},
                "label": {"type": "string"},
                "meta": {"properties": {"origin": {"type": "string"}}}
            }),
        )
        .unwrap();
    store
        .insert(
            "sensors",
            FIRST,
            json!({"Price": 5.0, "@timestamp": "2021-11-24T00:00:00Z", "label": "a"}),
        )
        .unwrap();
    store
        .insert(
            "sensors",
            SECOND,
            json!({"Price": 12.5, "@timestamp": "2021-11-25T00:00:00Z", "label": "b"}),
        )
        .unwrap();
    store
        .insert(
            "sensors",
            THIRD,
            json!({"Price": 20.0, "@timestamp": "2021-11-26T00:00:00Z", "label": "c"}),
        )
        .unwrap();
    store
}

async fn executable(store: InMemoryStore) -> Schema {
    let store: Arc<dyn DocumentStore> = Arc::new(store);
    let mut names = NameRegistry::new();
    let schema = SchemaBuilder::default()
        .build_from_store(store.as_ref(), &mut names)
        .await
        .unwrap();
    build_executable_schema(&schema, ExecutionContext::new(store, Arc::new(names))).unwrap()
}

async fn execute(schema: &Schema, query: &str) -> Value {
    let response = schema.execute(query).await;
    assert!(response.errors.is_empty(), "unexpected errors: {:?}", response.errors);
    response.data.into_json().unwrap()
}

// =============================================================================
// Document Query Tests
// =============================================================================

#[tokio::test]
async fn test_list_returns_selected_fields() {
    let schema = executable(sensor_store()).await;
    let data = execute(&schema, "{ sensors(size: 10) { id Price timestamp } }").await;

    assert_eq!(
        data,
        json!({"sensors": [
            {"id": FIRST, "Price": 5.0, "timestamp": "2021-11-24T00:00:00Z"},
            {"id": SECOND, "Price": 12.5, "timestamp": "2021-11-25T00:00:00Z"},
            {"id": THIRD, "Price": 20.0, "timestamp": "2021-11-26T00:00:00Z"}
        ]})
    );
}

#[tokio::test]
async fn test_size_limits_results() {
    let schema = executable(sensor_store()).await;
    let data = execute(&schema, "{ sensors(size: 1) { label } }").await;
    assert_eq!(data, json!({"sensors": [{"label": "a"}]}));
}

#[tokio::test]
async fn test_filter_is_applied() {
    let schema = executable(sensor_store()).await;
    let data = execute(
        &schema,
        r#"{ sensors(size: 10, boolean_query: {filter: {Price: {range: {gte: 10.0}}}}) { label } }"#,
    )
    .await;
    assert_eq!(data, json!({"sensors": [{"label": "b"}, {"label": "c"}]}));

    let data = execute(
        &schema,
        r#"{ sensors(size: 10, boolean_query: {must_not: {timestamp: {range: {lt: "2021-11-26T00:00:00Z"}}}}) { label } }"#,
    )
    .await;
    assert_eq!(data, json!({"sensors": [{"label": "c"}]}));
}

#[tokio::test]
async fn test_negative_size_is_rejected() {
    let schema = executable(sensor_store()).await;
    let response = schema.execute("{ sensors(size: -1) { label } }").await;
    assert_eq!(response.errors.len(), 1);
    assert!(response.errors[0].message.contains("size"));
}

#[tokio::test]
async fn test_by_id() {
    let schema = executable(sensor_store()).await;
    let query = format!(r#"{{ sensors_by_id(id: "{}") {{ id label }} }}"#, SECOND);
    let data = execute(&schema, &query).await;
    assert_eq!(data, json!({"sensors_by_id": {"id": SECOND, "label": "b"}}));

    let query = r#"{ sensors_by_id(id: "00000000-0000-4000-8000-000000000000") { label } }"#;
    let data = execute(&schema, query).await;
    assert_eq!(data, json!({"sensors_by_id": null}));
}

#[tokio::test]
async fn test_by_id_rejects_non_uuid() {
    let schema = executable(sensor_store()).await;
    let response = schema.execute(r#"{ sensors_by_id(id: "not-a-uuid") { label } }"#).await;
    assert!(!response.errors.is_empty());
}

#[tokio::test]
async fn test_untyped_field_is_not_queryable() {
    let schema = executable(sensor_store()).await;
    let response = schema.execute("{ sensors(size: 1) { meta } }").await;
    assert!(!response.errors.is_empty());
}

// =============================================================================
// Aggregation Query Tests
// =============================================================================

#[tokio::test]
async fn test_aggregations() {
    let schema = executable(sensor_store()).await;
    let data = execute(
        &schema,
        "{ sensors_aggregations { avg { Price } max { Price } min { Price } cardinality { Price } } }",
    )
    .await;

    assert_eq!(
        data,
        json!({"sensors_aggregations": {
            "avg": {"Price": 12.5},
            "max": {"Price": 20.0},
            "min": {"Price": 5.0},
            "cardinality": {"Price": 3}
        }})
    );
}

#[tokio::test]
async fn test_aggregation_filter_applies_to_every_kind() {
    let schema = executable(sensor_store()).await;
    let data = execute(
        &schema,
        r#"{ sensors_aggregations(boolean_query: {filter: {Price: {range: {lte: 12.5}}}}) {
            max { Price }
            min { Price }
        } }"#,
    )
    .await;

    assert_eq!(
        data,
        json!({"sensors_aggregations": {"max": {"Price": 12.5}, "min": {"Price": 5.0}}})
    );
}

#[tokio::test]
async fn test_date_aggregations_are_timestamps() {
    let schema = executable(sensor_store()).await;
    let data = execute(
        &schema,
        "{ sensors_aggregations { max { timestamp } min { timestamp } avg { timestamp } } }",
    )
    .await;

    assert_eq!(
        data,
        json!({"sensors_aggregations": {
            "max": {"timestamp": "2021-11-26T00:00:00Z"},
            "min": {"timestamp": "2021-11-24T00:00:00Z"},
            "avg": {"timestamp": "2021-11-25T00:00:00Z"}
        }})
    );
}

#[tokio::test]
async fn test_empty_match_gives_null_aggregations() {
    let schema = executable(sensor_store()).await;
    let data = execute(
        &schema,
        r#"{ sensors_aggregations(boolean_query: {filter: {Price: {range: {gt: 100.0}}}}) {
            max { Price }
            avg { Price }
        } }"#,
    )
    .await;

    assert_eq!(
        data,
        json!({"sensors_aggregations": {"max": {"Price": null}, "avg": {"Price": null}}})
    );
}

#[tokio::test]
async fn test_percentiles() {
    let schema = executable(sensor_store()).await;
    let data = execute(&schema, "{ sensors_aggregations { percentiles { Price { key value } } } }").await;

    let pairs = data["sensors_aggregations"]["percentiles"]["Price"].as_array().unwrap();
    assert_eq!(pairs.len(), 7);
    let median = pairs.iter().find(|p| p["key"] == "50.0").unwrap();
    assert_eq!(median["value"], json!(12.5));
}

#[tokio::test]
async fn test_percentiles_keep_field_scalar() {
    let store = InMemoryStore::new();
    store
        .create_collection("counters", json!({"hits": {"type": "long"}, "ratio": {"type": "float"}}))
        .unwrap();
    for (id, hits) in [(FIRST, 10), (SECOND, 20), (THIRD, 30)] {
        store.insert("counters", id, json!({"hits": hits, "ratio": 0.5})).unwrap();
    }
    let schema = executable(store).await;

    let sdl = schema.sdl();
    assert!(sdl.contains("type keyed_long"));
    assert!(sdl.contains("type keyed_float"));
    assert!(sdl.contains("hits: [keyed_long]"));

    let data = execute(&schema, "{ counters_aggregations { percentiles { hits { key value } } } }").await;
    let pairs = data["counters_aggregations"]["percentiles"]["hits"].as_array().unwrap();
    let median = pairs.iter().find(|p| p["key"] == "50.0").unwrap();
    assert_eq!(median["value"].as_f64(), Some(20.0));
}

// =============================================================================
// SDL Tests
// =============================================================================

#[tokio::test]
async fn test_sdl_exposes_custom_scalars_and_inputs() {
    let schema = executable(sensor_store()).await;
    let sdl = schema.sdl();

    assert!(sdl.contains("scalar DateTime"));
    assert!(sdl.contains("scalar UUID"));
    assert!(sdl.contains("input boolean_query_sensors"));
    assert!(sdl.contains("input sensors_range_query_Price_filter"));
    assert!(sdl.contains("type keyed_float"));
}
