//! Schema translation for sturgeon
//!
//! Turns collection mappings into a query schema:
//!
//! - `C(size: Int!, boolean_query: boolean_query_C): [doc_C]`
//! - `C_by_id(id: UUID!): doc_C`
//! - `C_aggregations(boolean_query: boolean_query_C): agg_C`
//!
//! Fields with a type tag that does not map to a scalar are omitted
//! everywhere. Names are made schema-safe through the
//! [`NameRegistry`](crate::names::NameRegistry).

mod arguments;
mod builder;
pub mod constants;
mod document;
mod errors;
mod fields;
mod mapping;
mod types;

pub use arguments::{
    build_boolean_query_argument, id_argument, is_range_comparable, size_argument, BooleanQueryArgument,
};
pub use builder::{compile_include_pattern, SchemaBuilder, SchemaBuilderOptions};
pub use document::{
    aggregation_kind_type_name, aggregation_type_name, document_type_name, AggregationTypes,
    DocumentAggregationTypeBuilder, DocumentTypeBuilder,
};
pub use errors::{SchemaError, SchemaResult};
pub use fields::{build_aggregation_field, build_document_field, keyed_type, keyed_type_name, scalar_of};
pub use mapping::{CollectionMapping, FieldDescriptor, MappingSnapshot};
pub use types::{
    FieldDefinition, InputObjectType, InputValueDefinition, ObjectType, QuerySchema, ScalarType, TypeRef,
};
