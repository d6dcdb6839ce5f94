//! Collection mappings as fetched from the store
//!
//! The store answers a mapping request with
//! `{collection: {"mappings": {"properties": {field: descriptor}}}}`. Older
//! stores nest the properties one level deeper under a per-type key; both
//! shapes are flattened into one field map per collection.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::names::normalize_name;
use crate::observability::{log_event_with_fields, Event};

use super::constants::{MAPPINGS, PROPERTIES};
use super::errors::{SchemaError, SchemaResult};

/// Metadata of one field; only the type tag is interpreted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Native type tag, absent for nested object fields
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
}

impl FieldDescriptor {
    pub fn typed(tag: impl Into<String>) -> Self {
        Self {
            field_type: Some(tag.into()),
        }
    }

    /// Descriptor of a nested object field
    pub fn nested() -> Self {
        Self { field_type: None }
    }
}

/// Field mapping of one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionMapping {
    pub name: String,
    pub fields: BTreeMap<String, FieldDescriptor>,
}

impl CollectionMapping {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, descriptor: FieldDescriptor) -> Self {
        self.fields.insert(name.into(), descriptor);
        self
    }
}

/// Mappings of every visible collection at one point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappingSnapshot {
    collections: BTreeMap<String, CollectionMapping>,
}

impl MappingSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the store's raw mapping response
    pub fn from_native(raw: &Value) -> SchemaResult<Self> {
        let entries = raw
            .as_object()
            .ok_or_else(|| SchemaError::malformed("*", "mapping response is not an object"))?;

        let mut snapshot = Self::new();
        for (name, entry) in entries {
            if let Some(collection) = parse_collection(name, entry)? {
                snapshot.insert(collection);
            }
        }
        Ok(snapshot)
    }

    pub fn insert(&mut self, collection: CollectionMapping) {
        self.collections.insert(collection.name.clone(), collection);
    }

    pub fn get(&self, name: &str) -> Option<&CollectionMapping> {
        self.collections.get(name)
    }

    /// Collections ordered by name
    pub fn collections(&self) -> impl Iterator<Item = &CollectionMapping> {
        self.collections.values()
    }

    pub fn len(&self) -> usize {
        self.collections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Drop collections whose name the pattern does not match
    pub fn retain_matching(&mut self, pattern: &Regex) {
        self.collections.retain(|name, _| {
            let keep = pattern.is_match(name);
            if !keep {
                tracing::debug!(collection = %name, "collection excluded by include pattern");
            }
            keep
        });
    }

    /// Drop fields whose original name starts with `prefix`
    pub fn ignore_field_prefix(&mut self, prefix: &str) {
        for collection in self.collections.values_mut() {
            collection.fields.retain(|name, _| !name.starts_with(prefix));
        }
    }

    /// Drop fields that would normalize onto a name the schema synthesizes
    pub fn drop_reserved_field(&mut self, reserved: &str) {
        for CollectionMapping { name: collection, fields } in self.collections.values_mut() {
            fields.retain(|name, _| {
                let keep = normalize_name(name) != reserved;
                if !keep {
                    tracing::warn!(
                        collection = %collection,
                        field = %name,
                        "field shadows the synthesized '{}' field and is left out",
                        reserved
                    );
                }
                keep
            });
        }
    }
}

fn parse_collection(name: &str, entry: &Value) -> SchemaResult<Option<CollectionMapping>> {
    let mappings = entry
        .get(MAPPINGS)
        .and_then(Value::as_object)
        .ok_or_else(|| SchemaError::malformed(name, "missing 'mappings' object"))?;

    let property_maps: Vec<&Map<String, Value>> = match mappings.get(PROPERTIES) {
        Some(properties) => vec![properties
            .as_object()
            .ok_or_else(|| SchemaError::malformed(name, "'properties' is not an object"))?],
        None => mappings
            .values()
            .filter_map(|v| v.get(PROPERTIES).and_then(Value::as_object))
            .collect(),
    };

    if property_maps.is_empty() {
        log_event_with_fields(
            Event::CollectionSkipped,
            &[("collection", name), ("reason", "mapping has no properties")],
        );
        return Ok(None);
    }

    let mut collection = CollectionMapping::new(name);
    for properties in property_maps {
        for (field, descriptor) in properties {
            let descriptor: FieldDescriptor = serde_json::from_value(descriptor.clone())
                .map_err(|e| SchemaError::malformed(name, format!("field '{}': {}", field, e)))?;
            collection.fields.insert(field.clone(), descriptor);
        }
    }
    Ok(Some(collection))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_properties() {
        let raw = json!({
            "sensors": {
                "mappings": {
                    "properties": {
                        "Price": {"type": "float"},
                        "@timestamp": {"type": "date", "format": "strict_date_optional_time"},
                        "3": {"properties": {"3V Bus Current": {"type": "float"}}}
                    }
                }
            }
        });

        let snapshot = MappingSnapshot::from_native(&raw).unwrap();
        let sensors = snapshot.get("sensors").unwrap();
        assert_eq!(sensors.fields.len(), 3);
        assert_eq!(sensors.fields["Price"], FieldDescriptor::typed("float"));
        assert_eq!(sensors.fields["@timestamp"], FieldDescriptor::typed("date"));
        assert_eq!(sensors.fields["3"], FieldDescriptor::nested());
    }

    #[test]
    fn test_parse_typed_mappings_are_flattened() {
        let raw = json!({
            "legacy": {
                "mappings": {
                    "_doc": {"properties": {"a": {"type": "long"}}},
                    "other": {"properties": {"b": {"type": "boolean"}}}
                }
            }
        });

        let snapshot = MappingSnapshot::from_native(&raw).unwrap();
        let legacy = snapshot.get("legacy").unwrap();
        assert_eq!(legacy.fields.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_collection_without_properties_is_skipped() {
        let raw = json!({
            "empty": {"mappings": {}},
            "full": {"mappings": {"properties": {"a": {"type": "long"}}}}
        });

        let snapshot = MappingSnapshot::from_native(&raw).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get("empty").is_none());
    }

    #[test]
    fn test_missing_mappings_is_malformed() {
        let raw = json!({"broken": {"settings": {}}});
        let err = MappingSnapshot::from_native(&raw).unwrap_err();
        assert!(matches!(err, SchemaError::MalformedMapping { ref collection, .. } if collection == "broken"));
    }

    #[test]
    fn test_non_object_response_is_malformed() {
        assert!(MappingSnapshot::from_native(&json!([])).is_err());
    }

    #[test]
    fn test_include_pattern_and_ignore_prefix() {
        let mut snapshot = MappingSnapshot::new();
        snapshot.insert(
            CollectionMapping::new("telemetry-1")
                .with_field("raw_blob", FieldDescriptor::typed("string"))
                .with_field("value", FieldDescriptor::typed("float")),
        );
        snapshot.insert(CollectionMapping::new(".internal"));

        snapshot.retain_matching(&Regex::new("^(?:telemetry-.*)$").unwrap());
        snapshot.ignore_field_prefix("raw_");

        assert_eq!(snapshot.len(), 1);
        let telemetry = snapshot.get("telemetry-1").unwrap();
        assert_eq!(telemetry.fields.keys().collect::<Vec<_>>(), vec!["value"]);
    }
}
