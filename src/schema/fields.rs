//! Field definitions for document and aggregation types
//!
//! A descriptor whose type tag does not resolve to a scalar never reaches the
//! name registry, so unsupported fields leave no trace in the schema.

use crate::names::NameRegistry;
use crate::query::{AggregationKind, AggregationOutput};

use super::constants::{KEY, VALUE};
use super::errors::SchemaResult;
use super::mapping::FieldDescriptor;
use super::types::{FieldDefinition, ObjectType, ScalarType, TypeRef};

/// Resolve the scalar type of a descriptor
pub fn scalar_of(descriptor: &FieldDescriptor) -> Option<ScalarType> {
    ScalarType::from_native(descriptor.field_type.as_deref())
}

/// Build the document-type field for one mapping entry
///
/// With `required` set, only fields of exactly that scalar type are emitted.
pub fn build_document_field(
    names: &mut NameRegistry,
    name: &str,
    descriptor: &FieldDescriptor,
    required: Option<ScalarType>,
) -> SchemaResult<Option<FieldDefinition>> {
    let scalar = match scalar_of(descriptor) {
        Some(scalar) => scalar,
        None => return Ok(None),
    };
    if required.is_some_and(|r| r != scalar) {
        return Ok(None);
    }

    let schema_name = names.add_name(name)?;
    Ok(Some(FieldDefinition::new(schema_name, scalar)))
}

/// Build the aggregation-type field for one mapping entry
///
/// Fields the kind cannot aggregate are skipped. Percentiles produce a list
/// of `keyed_<scalar>` pairs instead of a single value.
pub fn build_aggregation_field(
    names: &mut NameRegistry,
    name: &str,
    descriptor: &FieldDescriptor,
    kind: AggregationKind,
) -> SchemaResult<Option<FieldDefinition>> {
    let scalar = match scalar_of(descriptor) {
        Some(scalar) if kind.accepts(scalar) => scalar,
        _ => return Ok(None),
    };

    let schema_name = names.add_name(name)?;
    let ty = match kind.output(scalar) {
        AggregationOutput::Scalar(output) => TypeRef::Scalar(output),
        AggregationOutput::KeyedList(value) => TypeRef::list(TypeRef::named(keyed_type_name(value))),
    };
    Ok(Some(FieldDefinition::new(schema_name, ty)))
}

/// Name of the percentile pair type whose values are `scalar`
pub fn keyed_type_name(scalar: ScalarType) -> String {
    format!("keyed_{}", scalar.name().to_lowercase())
}

/// The `{key: String, value: scalar}` percentile pair type, shared by every
/// percentile field of that scalar
pub fn keyed_type(scalar: ScalarType) -> ObjectType {
    let mut keyed = ObjectType::new(keyed_type_name(scalar));
    keyed.add_field(FieldDefinition::new(KEY, ScalarType::String));
    keyed.add_field(FieldDefinition::new(VALUE, scalar));
    keyed
}
