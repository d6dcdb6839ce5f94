//! Document and aggregation types of one collection

use std::collections::BTreeSet;

use crate::names::NameRegistry;
use crate::observability::{log_event_with_fields, Event, ObservationScope};
use crate::query::{AggregationKind, AggregationOutput};
use crate::resolver::AggregationResolver;

use super::constants::ID;
use super::errors::SchemaResult;
use super::fields::{build_aggregation_field, build_document_field, scalar_of};
use super::mapping::CollectionMapping;
use super::types::{FieldDefinition, ObjectType, ScalarType, TypeRef};

/// Name of the document type of a collection
pub fn document_type_name(collection: &str) -> String {
    format!("doc_{}", collection)
}

/// Name of the aggregation root type of a collection
pub fn aggregation_type_name(collection: &str) -> String {
    format!("agg_{}", collection)
}

/// Name of the per-kind aggregation type of a collection
pub fn aggregation_kind_type_name(kind: AggregationKind, collection: &str) -> String {
    format!("agg_{}_{}", kind, collection)
}

/// Builds `doc_C`: one field per supported mapping entry plus `id: UUID!`
pub struct DocumentTypeBuilder<'a> {
    collection: &'a CollectionMapping,
    schema_name: &'a str,
}

impl<'a> DocumentTypeBuilder<'a> {
    /// `schema_name` is the registered schema name of the collection
    pub fn new(collection: &'a CollectionMapping, schema_name: &'a str) -> Self {
        Self {
            collection,
            schema_name,
        }
    }

    pub fn build(&self, names: &mut NameRegistry) -> SchemaResult<ObjectType> {
        let scope = ObservationScope::with_fields("DOCUMENT_TYPE", &[("collection", self.collection.name.as_str())]);

        let mut document = ObjectType::new(document_type_name(self.schema_name));
        for (name, descriptor) in &self.collection.fields {
            match build_document_field(names, name, descriptor, None) {
                Ok(Some(field)) => document.add_field(field),
                Ok(None) => {
                    tracing::debug!(collection = %self.collection.name, field = %name, "unsupported field type, omitted");
                }
                Err(e) => {
                    scope.fail(&e.to_string());
                    return Err(e);
                }
            }
        }
        document.add_field(FieldDefinition::new(
            ID,
            TypeRef::non_null(ScalarType::Identifier.into()),
        ));

        let field_count = document.fields.len().to_string();
        log_event_with_fields(
            Event::DocumentTypeBuilt,
            &[("collection", self.collection.name.as_str()), ("fields", field_count.as_str())],
        );
        scope.complete();
        Ok(document)
    }
}

/// Aggregation types of one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationTypes {
    /// `agg_C`, one field per kind with at least one compatible field
    pub root: ObjectType,
    /// `agg_<kind>_C` for every kind present on the root
    pub kinds: Vec<ObjectType>,
    /// Value scalars of the `keyed_<scalar>` pair types the kinds refer to
    pub keyed_scalars: BTreeSet<ScalarType>,
}

/// Builds `agg_C` and its per-kind `agg_<kind>_C` types
pub struct DocumentAggregationTypeBuilder<'a> {
    collection: &'a CollectionMapping,
    schema_name: &'a str,
}

impl<'a> DocumentAggregationTypeBuilder<'a> {
    pub fn new(collection: &'a CollectionMapping, schema_name: &'a str) -> Self {
        Self {
            collection,
            schema_name,
        }
    }

    /// Returns `None` when no field of the collection can be aggregated
    pub fn build(&self, names: &mut NameRegistry) -> SchemaResult<Option<AggregationTypes>> {
        let scope = ObservationScope::with_fields("AGGREGATION_TYPE", &[("collection", self.collection.name.as_str())]);

        let mut root = ObjectType::new(aggregation_type_name(self.schema_name));
        let mut kinds = Vec::new();
        let mut keyed_scalars = BTreeSet::new();
        for kind in AggregationKind::ALL {
            let kind_type = match self.build_kind(names, kind, &mut keyed_scalars) {
                Ok(kind_type) => kind_type,
                Err(e) => {
                    scope.fail(&e.to_string());
                    return Err(e);
                }
            };
            if kind_type.fields.is_empty() {
                continue;
            }
            root.add_field(
                FieldDefinition::new(kind.as_str(), TypeRef::named(kind_type.name.clone()))
                    .resolver(AggregationResolver::new(self.collection.name.clone(), kind)),
            );
            kinds.push(kind_type);
        }

        if kinds.is_empty() {
            scope.complete_with_fields(&[("kinds", "0")]);
            return Ok(None);
        }

        let kind_count = kinds.len().to_string();
        log_event_with_fields(
            Event::AggregationTypeBuilt,
            &[("collection", self.collection.name.as_str()), ("kinds", kind_count.as_str())],
        );
        scope.complete_with_fields(&[("kinds", kind_count.as_str())]);
        Ok(Some(AggregationTypes {
            root,
            kinds,
            keyed_scalars,
        }))
    }

    fn build_kind(
        &self,
        names: &mut NameRegistry,
        kind: AggregationKind,
        keyed_scalars: &mut BTreeSet<ScalarType>,
    ) -> SchemaResult<ObjectType> {
        let mut kind_type = ObjectType::new(aggregation_kind_type_name(kind, self.schema_name));
        for (name, descriptor) in &self.collection.fields {
            if let Some(field) = build_aggregation_field(names, name, descriptor, kind)? {
                if let Some(AggregationOutput::KeyedList(value)) = scalar_of(descriptor).map(|s| kind.output(s)) {
                    keyed_scalars.insert(value);
                }
                kind_type.add_field(field);
            }
        }
        Ok(kind_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::Resolver;
    use crate::schema::mapping::FieldDescriptor;

    fn sensors() -> CollectionMapping {
        CollectionMapping::new("sensors")
            .with_field("Price", FieldDescriptor::typed("float"))
            .with_field("@timestamp", FieldDescriptor::typed("date"))
            .with_field("label", FieldDescriptor::typed("string"))
            .with_field("location", FieldDescriptor::nested())
    }

    #[test]
    fn test_document_type_omits_untyped_fields() {
        let mut names = NameRegistry::new();
        let collection = sensors();
        let document = DocumentTypeBuilder::new(&collection, "sensors").build(&mut names).unwrap();

        assert_eq!(document.name, "doc_sensors");
        assert_eq!(document.field_names(), vec!["timestamp", "Price", "label", "id"]);
        assert!(document.field("location").is_none());
        assert_eq!(document.field("id").unwrap().ty.to_string(), "UUID!");
    }

    #[test]
    fn test_document_type_of_untyped_collection_keeps_identifier() {
        let mut names = NameRegistry::new();
        let collection = CollectionMapping::new("nested_only").with_field("inner", FieldDescriptor::nested());
        let document = DocumentTypeBuilder::new(&collection, "nested_only").build(&mut names).unwrap();

        assert_eq!(document.field_names(), vec!["id"]);
    }

    #[test]
    fn test_aggregation_types_per_kind() {
        let mut names = NameRegistry::new();
        let collection = sensors();
        let types = DocumentAggregationTypeBuilder::new(&collection, "sensors")
            .build(&mut names)
            .unwrap()
            .unwrap();

        assert_eq!(types.root.name, "agg_sensors");
        assert_eq!(
            types.root.field_names(),
            vec!["avg", "max", "min", "cardinality", "percentiles"]
        );
        assert_eq!(types.keyed_scalars, BTreeSet::from([ScalarType::Float]));

        let max = types.kinds.iter().find(|t| t.name == "agg_max_sensors").unwrap();
        assert_eq!(max.field_names(), vec!["timestamp", "Price"]);

        let cardinality = types.kinds.iter().find(|t| t.name == "agg_cardinality_sensors").unwrap();
        assert_eq!(cardinality.field_names(), vec!["Price"]);

        let resolver = types.root.field("min").unwrap().resolver.clone().unwrap();
        assert_eq!(
            resolver,
            Resolver::Aggregation(AggregationResolver::new("sensors".to_string(), AggregationKind::Min))
        );
    }

    #[test]
    fn test_aggregation_types_skip_empty_kinds() {
        let mut names = NameRegistry::new();
        let collection = CollectionMapping::new("events").with_field("at", FieldDescriptor::typed("date"));
        let types = DocumentAggregationTypeBuilder::new(&collection, "events")
            .build(&mut names)
            .unwrap()
            .unwrap();

        assert_eq!(types.root.field_names(), vec!["avg", "max", "min"]);
        assert!(types.keyed_scalars.is_empty());
    }

    #[test]
    fn test_no_aggregatable_fields() {
        let mut names = NameRegistry::new();
        let collection = CollectionMapping::new("labels").with_field("label", FieldDescriptor::typed("string"));
        let types = DocumentAggregationTypeBuilder::new(&collection, "labels").build(&mut names).unwrap();
        assert!(types.is_none());
    }
}
