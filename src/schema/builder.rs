//! Schema construction
//!
//! Runs once at startup against a mapping snapshot. The name registry is
//! borrowed mutably for the whole build and is read-only once the schema is
//! returned.

use std::collections::BTreeSet;

use regex::Regex;

use crate::names::NameRegistry;
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::resolver::{AggregationScopeResolver, DocumentByIdResolver, DocumentListResolver};
use crate::store::DocumentStore;

use super::arguments::{build_boolean_query_argument, id_argument, size_argument};
use super::constants::{ID, QUERY_TYPE};
use super::document::{DocumentAggregationTypeBuilder, DocumentTypeBuilder};
use super::errors::{SchemaError, SchemaResult};
use super::fields::keyed_type;
use super::mapping::{CollectionMapping, MappingSnapshot};
use super::types::{FieldDefinition, ObjectType, QuerySchema, ScalarType, TypeRef};

/// Options that shape the generated schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaBuilderOptions {
    /// Expose `C_aggregations` fields
    pub enable_aggregations: bool,
    /// Collections whose whole name does not match are ignored
    pub include_pattern: Option<String>,
    /// Fields whose original name starts with this prefix are ignored
    pub ignore_prefix: Option<String>,
}

impl Default for SchemaBuilderOptions {
    fn default() -> Self {
        Self {
            enable_aggregations: true,
            include_pattern: None,
            ignore_prefix: None,
        }
    }
}

/// Compile an include pattern so that it must match a whole collection name
pub fn compile_include_pattern(pattern: &str) -> SchemaResult<Regex> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| SchemaError::InvalidIncludePattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

/// Builds the query schema from collection mappings
#[derive(Debug, Clone, Default)]
pub struct SchemaBuilder {
    options: SchemaBuilderOptions,
}

impl SchemaBuilder {
    pub fn new(options: SchemaBuilderOptions) -> Self {
        Self { options }
    }

    /// Fetch mappings from the store and build the schema from them
    pub async fn build_from_store(
        &self,
        store: &dyn DocumentStore,
        names: &mut NameRegistry,
    ) -> SchemaResult<QuerySchema> {
        let raw = store.fetch_mappings().await?;
        let snapshot = MappingSnapshot::from_native(&raw)?;
        let count = snapshot.len().to_string();
        log_event_with_fields(Event::MappingsFetched, &[("collections", count.as_str())]);
        self.build(snapshot, names)
    }

    /// Build the schema from a snapshot
    ///
    /// Fails with [`SchemaError::NoCollections`] when no collection survives
    /// filtering.
    pub fn build(&self, mut snapshot: MappingSnapshot, names: &mut NameRegistry) -> SchemaResult<QuerySchema> {
        log_event_with_fields(Event::SchemaBuildBegin, &[("collections", snapshot.len().to_string().as_str())]);
        let scope = ObservationScope::new("SCHEMA_BUILD");

        match self.build_inner(&mut snapshot, names) {
            Ok(schema) => {
                let root_fields = schema.query().fields.len().to_string();
                log_event_with_fields(
                    Event::SchemaBuildComplete,
                    &[("root_fields", root_fields.as_str()), ("names", names.len().to_string().as_str())],
                );
                scope.complete_with_fields(&[("root_fields", root_fields.as_str())]);
                Ok(schema)
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e)
            }
        }
    }

    fn build_inner(&self, snapshot: &mut MappingSnapshot, names: &mut NameRegistry) -> SchemaResult<QuerySchema> {
        if let Some(pattern) = &self.options.include_pattern {
            snapshot.retain_matching(&compile_include_pattern(pattern)?);
        }
        if let Some(prefix) = &self.options.ignore_prefix {
            snapshot.ignore_field_prefix(prefix);
        }
        snapshot.drop_reserved_field(ID);
        if snapshot.is_empty() {
            return Err(SchemaError::NoCollections);
        }

        let mut schema = QuerySchema::new(ObjectType::new(QUERY_TYPE));
        let mut keyed_scalars = BTreeSet::new();
        for collection in snapshot.collections() {
            keyed_scalars.extend(self.add_collection(&mut schema, collection, names)?);
        }
        for scalar in keyed_scalars {
            schema.register_object(keyed_type(scalar));
        }

        if schema.query().fields.is_empty() {
            return Err(SchemaError::NoCollections);
        }
        Ok(schema)
    }

    /// Add the root fields and types of one collection
    ///
    /// Returns the value scalars of the percentile pair types it refers to.
    fn add_collection(
        &self,
        schema: &mut QuerySchema,
        collection: &CollectionMapping,
        names: &mut NameRegistry,
    ) -> SchemaResult<BTreeSet<ScalarType>> {
        let schema_name = names.add_name(&collection.name)?;
        let original = collection.name.clone();

        let document = DocumentTypeBuilder::new(collection, &schema_name).build(names)?;
        let document_name = document.name.clone();
        schema.register_object(document);

        let boolean_query = build_boolean_query_argument(names, collection, &schema_name)?;
        if let Some(arg) = &boolean_query {
            for input in &arg.inputs {
                schema.register_input(input.clone());
            }
            let inputs = arg.inputs.len().to_string();
            log_event_with_fields(
                Event::BooleanArgumentBuilt,
                &[("collection", original.as_str()), ("inputs", inputs.as_str())],
            );
        }

        let mut list = FieldDefinition::new(
            schema_name.clone(),
            TypeRef::list(TypeRef::named(document_name.clone())),
        )
        .argument(size_argument())
        .resolver(DocumentListResolver::new(original.clone()));
        if let Some(arg) = &boolean_query {
            list = list.argument(arg.argument.clone());
        }
        schema.query_mut().add_field(list);

        schema.query_mut().add_field(
            FieldDefinition::new(format!("{}_by_id", schema_name), TypeRef::named(document_name))
                .argument(id_argument())
                .resolver(DocumentByIdResolver::new(original.clone())),
        );

        if !self.options.enable_aggregations {
            return Ok(BTreeSet::new());
        }
        let aggregations = match DocumentAggregationTypeBuilder::new(collection, &schema_name).build(names)? {
            Some(aggregations) => aggregations,
            None => return Ok(BTreeSet::new()),
        };

        let mut scope_field = FieldDefinition::new(
            format!("{}_aggregations", schema_name),
            TypeRef::named(aggregations.root.name.clone()),
        )
        .resolver(AggregationScopeResolver::new(original));
        if let Some(arg) = boolean_query {
            scope_field = scope_field.argument(arg.argument);
        }
        schema.query_mut().add_field(scope_field);

        schema.register_object(aggregations.root);
        for kind_type in aggregations.kinds {
            schema.register_object(kind_type);
        }
        Ok(aggregations.keyed_scalars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Resolver;
    use crate::schema::mapping::FieldDescriptor;

    fn snapshot() -> MappingSnapshot {
        let mut snapshot = MappingSnapshot::new();
        snapshot.insert(
            CollectionMapping::new("sensor-data")
                .with_field("Price", FieldDescriptor::typed("float"))
                .with_field("@timestamp", FieldDescriptor::typed("date"))
                .with_field("label", FieldDescriptor::typed("string")),
        );
        snapshot.insert(CollectionMapping::new("labels").with_field("label", FieldDescriptor::typed("string")));
        snapshot
    }

    #[test]
    fn test_root_fields_per_collection() {
        let mut names = NameRegistry::new();
        let schema = SchemaBuilder::default().build(snapshot(), &mut names).unwrap();

        assert_eq!(
            schema.query().field_names(),
            vec![
                "labels",
                "labels_by_id",
                "sensor_data",
                "sensor_data_by_id",
                "sensor_data_aggregations"
            ]
        );

        let list = schema.query().field("sensor_data").unwrap();
        assert_eq!(list.ty.to_string(), "[doc_sensor_data]");
        let args: Vec<String> = list.arguments.iter().map(|a| format!("{}: {}", a.name, a.ty)).collect();
        assert_eq!(args, vec!["size: Int!", "boolean_query: boolean_query_sensor_data"]);
        assert_eq!(
            list.resolver,
            Some(Resolver::DocumentList(DocumentListResolver::new("sensor-data".to_string())))
        );

        // labels has nothing to filter or aggregate on
        let labels = schema.query().field("labels").unwrap();
        assert_eq!(labels.arguments.len(), 1);
        assert!(schema.query().field("labels_aggregations").is_none());

        assert!(schema.object("keyed_float").is_some());
        assert!(schema.object("agg_percentiles_sensor_data").is_some());
    }

    #[test]
    fn test_aggregations_disabled() {
        let mut names = NameRegistry::new();
        let options = SchemaBuilderOptions {
            enable_aggregations: false,
            ..SchemaBuilderOptions::default()
        };
        let schema = SchemaBuilder::new(options).build(snapshot(), &mut names).unwrap();

        assert!(schema.query().field("sensor_data_aggregations").is_none());
        assert!(schema.object("agg_sensor_data").is_none());
        assert!(schema.object("keyed_float").is_none());
    }

    #[test]
    fn test_include_pattern_matches_whole_name() {
        let mut names = NameRegistry::new();
        let options = SchemaBuilderOptions {
            include_pattern: Some("sensor".to_string()),
            ..SchemaBuilderOptions::default()
        };
        let err = SchemaBuilder::new(options).build(snapshot(), &mut names).unwrap_err();
        assert!(matches!(err, SchemaError::NoCollections));

        let options = SchemaBuilderOptions {
            include_pattern: Some("sensor-.*".to_string()),
            ..SchemaBuilderOptions::default()
        };
        let schema = SchemaBuilder::new(options).build(snapshot(), &mut names).unwrap();
        assert!(schema.query().field("labels").is_none());
        assert!(schema.query().field("sensor_data").is_some());
    }

    #[test]
    fn test_invalid_include_pattern() {
        let mut names = NameRegistry::new();
        let options = SchemaBuilderOptions {
            include_pattern: Some("(".to_string()),
            ..SchemaBuilderOptions::default()
        };
        let err = SchemaBuilder::new(options).build(snapshot(), &mut names).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidIncludePattern { .. }));
    }

    #[test]
    fn test_ignore_prefix() {
        let mut names = NameRegistry::new();
        let options = SchemaBuilderOptions {
            ignore_prefix: Some("@".to_string()),
            ..SchemaBuilderOptions::default()
        };
        let schema = SchemaBuilder::new(options).build(snapshot(), &mut names).unwrap();

        let document = schema.object("doc_sensor_data").unwrap();
        assert_eq!(document.field_names(), vec!["Price", "label", "id"]);
        assert!(names.to_schema_name("@timestamp").is_err());
    }

    #[test]
    fn test_mapped_id_field_is_left_out() {
        let mut snapshot = MappingSnapshot::new();
        snapshot.insert(
            CollectionMapping::new("orders")
                .with_field("id", FieldDescriptor::typed("long"))
                .with_field("@id", FieldDescriptor::typed("string"))
                .with_field("total", FieldDescriptor::typed("float")),
        );
        let mut names = NameRegistry::new();
        let schema = SchemaBuilder::default().build(snapshot, &mut names).unwrap();

        let document = schema.object("doc_orders").unwrap();
        assert_eq!(document.field_names(), vec!["total", "id"]);
        assert_eq!(document.field("id").unwrap().ty.to_string(), "UUID!");
        assert!(names.to_schema_name("id").is_err());
        assert!(names.to_schema_name("@id").is_err());
        assert!(schema.object("agg_max_orders").unwrap().field("id").is_none());
    }

    #[test]
    fn test_empty_snapshot() {
        let mut names = NameRegistry::new();
        let err = SchemaBuilder::default()
            .build(MappingSnapshot::new(), &mut names)
            .unwrap_err();
        assert!(matches!(err, SchemaError::NoCollections));
    }
}
