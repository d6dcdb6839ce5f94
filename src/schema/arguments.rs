//! Arguments of the root query fields
//!
//! The boolean-query argument of a collection is a tree of input objects:
//!
//! ```text
//! boolean_query_C
//!   filter: boolean_query_filter_C
//!     price: C_boolean_query_price_filter
//!       range: C_range_query_price_filter { gt gte lt lte }
//! ```
//!
//! Every level is named after the collection, field and clause so no two
//! collections or clauses share an input type.

use crate::names::NameRegistry;
use crate::query::BooleanQueryKind;
use crate::query::RangeBound;

use super::constants::{BOOLEAN_QUERY, ID, RANGE, SIZE};
use super::errors::SchemaResult;
use super::fields::scalar_of;
use super::mapping::CollectionMapping;
use super::types::{InputObjectType, InputValueDefinition, ScalarType, TypeRef};

/// `size: Int!`
pub fn size_argument() -> InputValueDefinition {
    InputValueDefinition::new(SIZE, TypeRef::non_null(ScalarType::Int.into()))
}

/// `id: UUID!`
pub fn id_argument() -> InputValueDefinition {
    InputValueDefinition::new(ID, TypeRef::non_null(ScalarType::Identifier.into()))
}

/// Scalars that can appear in a range predicate
pub fn is_range_comparable(scalar: ScalarType) -> bool {
    scalar.is_numeric() || scalar == ScalarType::DateTime
}

/// The boolean-query argument of one collection with the input types it needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BooleanQueryArgument {
    pub argument: InputValueDefinition,
    pub inputs: Vec<InputObjectType>,
}

/// Build `boolean_query: boolean_query_C`
///
/// Returns `None` when the collection has no range-comparable field.
pub fn build_boolean_query_argument(
    names: &mut NameRegistry,
    collection: &CollectionMapping,
    schema_name: &str,
) -> SchemaResult<Option<BooleanQueryArgument>> {
    let mut comparable = Vec::new();
    for (name, descriptor) in &collection.fields {
        if let Some(scalar) = scalar_of(descriptor).filter(|s| is_range_comparable(*s)) {
            comparable.push((names.add_name(name)?, scalar));
        }
    }
    if comparable.is_empty() {
        return Ok(None);
    }

    let mut inputs = Vec::new();
    let mut clauses = Vec::new();
    for kind in BooleanQueryKind::ALL {
        let mut clause_fields = Vec::new();
        for (field, scalar) in &comparable {
            let range = InputObjectType::new(
                format!("{}_range_query_{}_{}", schema_name, field, kind),
                RangeBound::ALL
                    .iter()
                    .map(|bound| InputValueDefinition::new(bound.as_str(), *scalar))
                    .collect(),
            );
            let predicate = InputObjectType::new(
                format!("{}_boolean_query_{}_{}", schema_name, field, kind),
                vec![InputValueDefinition::new(RANGE, TypeRef::named(range.name.clone()))],
            );
            clause_fields.push(InputValueDefinition::new(
                field.clone(),
                TypeRef::named(predicate.name.clone()),
            ));
            inputs.push(range);
            inputs.push(predicate);
        }

        let clause = InputObjectType::new(
            format!("{}_{}_{}", BOOLEAN_QUERY, kind, schema_name),
            clause_fields,
        );
        clauses.push(InputValueDefinition::new(kind.as_str(), TypeRef::named(clause.name.clone())));
        inputs.push(clause);
    }

    let root = InputObjectType::new(format!("{}_{}", BOOLEAN_QUERY, schema_name), clauses);
    let argument = InputValueDefinition::new(BOOLEAN_QUERY, TypeRef::named(root.name.clone()));
    inputs.push(root);

    Ok(Some(BooleanQueryArgument { argument, inputs }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::mapping::FieldDescriptor;

    fn find<'a>(arg: &'a BooleanQueryArgument, name: &str) -> &'a InputObjectType {
        arg.inputs.iter().find(|i| i.name == name).unwrap()
    }

    #[test]
    fn test_size_and_id_arguments() {
        assert_eq!(size_argument().ty.to_string(), "Int!");
        assert_eq!(id_argument().ty.to_string(), "UUID!");
    }

    #[test]
    fn test_boolean_query_shape() {
        let mut names = NameRegistry::new();
        let collection = CollectionMapping::new("sensors")
            .with_field("Price", FieldDescriptor::typed("float"))
            .with_field("@timestamp", FieldDescriptor::typed("date"))
            .with_field("label", FieldDescriptor::typed("string"))
            .with_field("online", FieldDescriptor::typed("boolean"));

        let arg = build_boolean_query_argument(&mut names, &collection, "sensors")
            .unwrap()
            .unwrap();

        assert_eq!(arg.argument.name, "boolean_query");
        assert_eq!(arg.argument.ty.to_string(), "boolean_query_sensors");

        let root = find(&arg, "boolean_query_sensors");
        let clause_names: Vec<&str> = root.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(clause_names, vec!["must", "must_not", "filter", "should"]);

        let filter = find(&arg, "boolean_query_filter_sensors");
        let field_names: Vec<&str> = filter.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(field_names, vec!["timestamp", "Price"]);

        let predicate = find(&arg, "sensors_boolean_query_Price_filter");
        assert_eq!(predicate.field("range").unwrap().ty.to_string(), "sensors_range_query_Price_filter");

        let range = find(&arg, "sensors_range_query_Price_filter");
        let bounds: Vec<String> = range.fields.iter().map(|f| format!("{}: {}", f.name, f.ty)).collect();
        assert_eq!(bounds, vec!["gt: Float", "gte: Float", "lt: Float", "lte: Float"]);

        let date_range = find(&arg, "sensors_range_query_timestamp_must_not");
        assert_eq!(date_range.field("lte").unwrap().ty.to_string(), "DateTime");

        assert!(names.to_schema_name("label").is_err());
    }

    #[test]
    fn test_input_names_are_unique() {
        let mut names = NameRegistry::new();
        let collection = CollectionMapping::new("c")
            .with_field("a", FieldDescriptor::typed("long"))
            .with_field("b", FieldDescriptor::typed("float"));
        let arg = build_boolean_query_argument(&mut names, &collection, "c").unwrap().unwrap();

        let mut input_names: Vec<&str> = arg.inputs.iter().map(|i| i.name.as_str()).collect();
        let total = input_names.len();
        input_names.sort();
        input_names.dedup();
        assert_eq!(input_names.len(), total);
        // 2 fields x 4 clauses x (range + predicate) + 4 clauses + root
        assert_eq!(total, 21);
    }

    #[test]
    fn test_no_comparable_fields() {
        let mut names = NameRegistry::new();
        let collection = CollectionMapping::new("labels").with_field("label", FieldDescriptor::typed("string"));
        assert!(build_boolean_query_argument(&mut names, &collection, "labels")
            .unwrap()
            .is_none());
    }
}
