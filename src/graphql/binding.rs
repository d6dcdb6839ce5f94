//! Binding of the schema model onto an executable GraphQL schema
//!
//! Fields with a resolver dispatch to it; every other field reads its value
//! from the parent object by name. The aggregation scope travels between
//! `C_aggregations` and its children as an opaque parent value.

use async_graphql::dynamic::{
    Field, FieldFuture, FieldValue, InputObject, InputValue, Object, ResolverContext, Scalar, Schema,
    TypeRef as GraphqlTypeRef,
};
use async_graphql::{Error as GraphqlError, Name, SelectionField, Value as GraphqlValue};
use chrono::DateTime;
use serde_json::{Map, Value};

use crate::query::SelectedField;
use crate::resolver::{ExecutionContext, FieldRequest, Resolution, Resolve, Resolver};
use crate::schema::constants::QUERY_TYPE;
use crate::schema::{
    FieldDefinition, InputObjectType, ObjectType, QuerySchema, ScalarType, SchemaError, SchemaResult, TypeRef,
};

/// Arguments captured by an aggregation scope field
struct AggregationScope(Map<String, Value>);

/// Build the executable schema; `ctx` is attached as schema data
pub fn build_executable_schema(schema: &QuerySchema, ctx: ExecutionContext) -> SchemaResult<Schema> {
    let mut builder = Schema::build(QUERY_TYPE, None, None).data(ctx);
    for scalar in schema.custom_scalars() {
        builder = builder.register(custom_scalar(scalar));
    }
    builder = builder.register(object_type(schema.query()));
    for object in schema.objects() {
        builder = builder.register(object_type(object));
    }
    for input in schema.inputs() {
        builder = builder.register(input_object_type(input));
    }
    builder.finish().map_err(|e| SchemaError::Binding(e.to_string()))
}

fn custom_scalar(scalar: ScalarType) -> Scalar {
    let base = Scalar::new(scalar.name());
    match scalar {
        ScalarType::Long => base
            .description("64-bit integer")
            .validator(|value| matches!(value, GraphqlValue::Number(n) if n.is_i64() || n.is_u64())),
        ScalarType::DateTime => base
            .description("RFC 3339 timestamp or epoch milliseconds")
            .validator(|value| match value {
                GraphqlValue::String(s) => DateTime::parse_from_rfc3339(s).is_ok(),
                GraphqlValue::Number(_) => true,
                _ => false,
            }),
        ScalarType::Identifier => base
            .description("Document identifier")
            .validator(|value| matches!(value, GraphqlValue::String(s) if uuid::Uuid::parse_str(s).is_ok())),
        ScalarType::Float | ScalarType::String | ScalarType::Boolean | ScalarType::Int => base,
    }
}

fn type_ref(ty: &TypeRef) -> GraphqlTypeRef {
    match ty {
        TypeRef::Scalar(scalar) => GraphqlTypeRef::named(scalar.name()),
        TypeRef::Named(name) => GraphqlTypeRef::named(name.clone()),
        TypeRef::List(inner) => GraphqlTypeRef::List(Box::new(type_ref(inner))),
        TypeRef::NonNull(inner) => GraphqlTypeRef::NonNull(Box::new(type_ref(inner))),
    }
}

fn object_type(object: &ObjectType) -> Object {
    object
        .fields
        .iter()
        .fold(Object::new(object.name.clone()), |obj, field| obj.field(field_of(field)))
}

fn input_object_type(input: &InputObjectType) -> InputObject {
    input.fields.iter().fold(InputObject::new(input.name.clone()), |obj, field| {
        obj.field(InputValue::new(field.name.clone(), type_ref(&field.ty)))
    })
}

fn field_of(definition: &FieldDefinition) -> Field {
    let name = definition.name.clone();
    let resolver = definition.resolver.clone();
    let field = Field::new(definition.name.clone(), type_ref(&definition.ty), move |ctx| {
        let name = name.clone();
        let resolver = resolver.clone();
        FieldFuture::new(async move {
            match resolver {
                Some(resolver) => resolve_field(&resolver, ctx).await,
                None => Ok(read_parent(&ctx, &name)),
            }
        })
    });

    definition.arguments.iter().fold(field, |field, argument| {
        field.argument(InputValue::new(argument.name.clone(), type_ref(&argument.ty)))
    })
}

async fn resolve_field<'a>(
    resolver: &Resolver,
    ctx: ResolverContext<'a>,
) -> async_graphql::Result<Option<FieldValue<'a>>> {
    let execution = ctx.data::<ExecutionContext>()?;

    let mut arguments = Map::new();
    for (name, value) in ctx.args.as_index_map() {
        arguments.insert(name.to_string(), value.clone().into_json()?);
    }
    let mut request = FieldRequest::new(arguments, selection_of(ctx.field()));
    if let Ok(scope) = ctx.parent_value.try_downcast_ref::<AggregationScope>() {
        request = request.with_scope(scope.0.clone());
    }

    match resolver.resolve(execution, request).await {
        Ok(Resolution::Value(Value::Null)) => Ok(None),
        Ok(Resolution::Value(value)) => Ok(Some(to_field_value(GraphqlValue::from_json(value)?))),
        Ok(Resolution::Scope(scope)) => Ok(Some(FieldValue::owned_any(AggregationScope(scope)))),
        Err(e) => Err(GraphqlError::new(e.client_message())),
    }
}

fn selection_of(field: SelectionField<'_>) -> Vec<SelectedField> {
    field
        .selection_set()
        .map(|child| SelectedField::with_children(child.name(), selection_of(child)))
        .collect()
}

fn read_parent<'a>(ctx: &ResolverContext<'a>, name: &str) -> Option<FieldValue<'a>> {
    match ctx.parent_value.as_value() {
        Some(GraphqlValue::Object(fields)) => match fields.get(&Name::new(name)) {
            None | Some(GraphqlValue::Null) => None,
            Some(value) => Some(to_field_value(value.clone())),
        },
        _ => None,
    }
}

/// Lists become list field values so their items resolve one by one
fn to_field_value<'a>(value: GraphqlValue) -> FieldValue<'a> {
    match value {
        GraphqlValue::List(items) => FieldValue::list(items.into_iter().map(to_field_value)),
        other => FieldValue::value(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::names::NameRegistry;
    use crate::schema::{CollectionMapping, FieldDescriptor, MappingSnapshot, SchemaBuilder};
    use crate::store::InMemoryStore;

    #[test]
    fn test_type_ref_conversion() {
        let ty = TypeRef::list(TypeRef::non_null(TypeRef::named("doc_x")));
        assert_eq!(type_ref(&ty).to_string(), "[doc_x!]");
        assert_eq!(type_ref(&ScalarType::Identifier.into()).to_string(), "UUID");
    }

    #[test]
    fn test_schema_binds() {
        let mut snapshot = MappingSnapshot::new();
        snapshot.insert(
            CollectionMapping::new("sensors")
                .with_field("Price", FieldDescriptor::typed("float"))
                .with_field("count", FieldDescriptor::typed("long"))
                .with_field("@timestamp", FieldDescriptor::typed("date")),
        );
        let mut names = NameRegistry::new();
        let schema = SchemaBuilder::default().build(snapshot, &mut names).unwrap();

        let ctx = ExecutionContext::new(Arc::new(InMemoryStore::new()), Arc::new(names));
        let executable = build_executable_schema(&schema, ctx).unwrap();
        let sdl = executable.sdl();
        assert!(sdl.contains("scalar UUID"));
        assert!(sdl.contains("scalar Long"));
        assert!(sdl.contains("sensors_by_id(id: UUID!): doc_sensors"));
    }

    #[tokio::test]
    async fn test_long_inputs_must_be_integers() {
        let store = InMemoryStore::new();
        store
            .create_collection("sensors", serde_json::json!({"count": {"type": "long"}}))
            .unwrap();
        let store: Arc<dyn crate::store::DocumentStore> = Arc::new(store);
        let mut names = NameRegistry::new();
        let schema = SchemaBuilder::default()
            .build_from_store(store.as_ref(), &mut names)
            .await
            .unwrap();
        let executable = build_executable_schema(&schema, ExecutionContext::new(store, Arc::new(names))).unwrap();

        let fractional = executable
            .execute("{ sensors(size: 1, boolean_query: {filter: {count: {range: {gte: 1.5}}}}) { id } }")
            .await;
        assert!(!fractional.errors.is_empty());

        let whole = executable
            .execute("{ sensors(size: 1, boolean_query: {filter: {count: {range: {gte: 2}}}}) { id } }")
            .await;
        assert!(whole.errors.is_empty(), "{:?}", whole.errors);
    }
}
