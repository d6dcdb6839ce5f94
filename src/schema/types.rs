//! Query schema model
//!
//! The schema is built once from a mapping snapshot and never mutated
//! afterwards. It is a plain data structure; `crate::graphql` turns it into an
//! executable GraphQL schema.

use std::collections::BTreeMap;
use std::fmt;

use crate::resolver::Resolver;

/// Scalar types the schema can expose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarType {
    Float,
    Long,
    String,
    DateTime,
    Boolean,
    /// 32-bit integer, used for the `size` argument
    Int,
    /// Document identifier, validated as a UUID on input
    Identifier,
}

impl ScalarType {
    /// Map a native field-type tag to a scalar type
    ///
    /// `None` means the field is unsupported: either the tag is unknown or it
    /// is missing altogether, which is how nested object fields look.
    pub fn from_native(tag: Option<&str>) -> Option<Self> {
        match tag? {
            "float" => Some(ScalarType::Float),
            "long" => Some(ScalarType::Long),
            "string" => Some(ScalarType::String),
            "date" => Some(ScalarType::DateTime),
            "boolean" => Some(ScalarType::Boolean),
            _ => None,
        }
    }

    /// GraphQL type name
    pub fn name(&self) -> &'static str {
        match self {
            ScalarType::Float => "Float",
            ScalarType::Long => "Long",
            ScalarType::String => "String",
            ScalarType::DateTime => "DateTime",
            ScalarType::Boolean => "Boolean",
            ScalarType::Int => "Int",
            ScalarType::Identifier => "UUID",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ScalarType::Float | ScalarType::Long | ScalarType::Int)
    }

    /// Whether GraphQL defines this scalar itself
    pub fn is_builtin(&self) -> bool {
        matches!(
            self,
            ScalarType::Float | ScalarType::String | ScalarType::Boolean | ScalarType::Int
        )
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Reference to a type from a field or argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRef {
    Scalar(ScalarType),
    /// Object or input object, by name
    Named(String),
    List(Box<TypeRef>),
    NonNull(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        TypeRef::Named(name.into())
    }

    pub fn list(inner: TypeRef) -> Self {
        TypeRef::List(Box::new(inner))
    }

    pub fn non_null(inner: TypeRef) -> Self {
        TypeRef::NonNull(Box::new(inner))
    }

    /// Innermost named type
    pub fn base_name(&self) -> &str {
        match self {
            TypeRef::Scalar(scalar) => scalar.name(),
            TypeRef::Named(name) => name,
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.base_name(),
        }
    }

    /// Collect every scalar referenced by this type
    fn collect_scalars(&self, out: &mut Vec<ScalarType>) {
        match self {
            TypeRef::Scalar(scalar) => out.push(*scalar),
            TypeRef::Named(_) => {}
            TypeRef::List(inner) | TypeRef::NonNull(inner) => inner.collect_scalars(out),
        }
    }
}

impl From<ScalarType> for TypeRef {
    fn from(scalar: ScalarType) -> Self {
        TypeRef::Scalar(scalar)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Scalar(scalar) => write!(f, "{}", scalar),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::List(inner) => write!(f, "[{}]", inner),
            TypeRef::NonNull(inner) => write!(f, "{}!", inner),
        }
    }
}

/// An argument or an input object field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputValueDefinition {
    pub name: String,
    pub ty: TypeRef,
}

impl InputValueDefinition {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// A field of an object type
///
/// Fields without a resolver read their value from the parent object by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDefinition {
    pub name: String,
    pub ty: TypeRef,
    pub arguments: Vec<InputValueDefinition>,
    pub resolver: Option<Resolver>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeRef>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
            arguments: Vec::new(),
            resolver: None,
        }
    }

    pub fn argument(mut self, argument: InputValueDefinition) -> Self {
        self.arguments.push(argument);
        self
    }

    pub fn resolver(mut self, resolver: impl Into<Resolver>) -> Self {
        self.resolver = Some(resolver.into());
        self
    }
}

/// An output object type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectType {
    pub name: String,
    pub fields: Vec<FieldDefinition>,
}

impl ObjectType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Add a field, replacing any earlier field with the same name
    pub fn add_field(&mut self, field: FieldDefinition) {
        match self.fields.iter_mut().find(|f| f.name == field.name) {
            Some(existing) => *existing = field,
            None => self.fields.push(field),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.name.as_str()).collect()
    }
}

/// An input object type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputObjectType {
    pub name: String,
    pub fields: Vec<InputValueDefinition>,
}

impl InputObjectType {
    pub fn new(name: impl Into<String>, fields: Vec<InputValueDefinition>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&InputValueDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// The complete, immutable query schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySchema {
    query: ObjectType,
    objects: BTreeMap<String, ObjectType>,
    inputs: BTreeMap<String, InputObjectType>,
}

impl QuerySchema {
    pub(crate) fn new(query: ObjectType) -> Self {
        Self {
            query,
            objects: BTreeMap::new(),
            inputs: BTreeMap::new(),
        }
    }

    pub(crate) fn query_mut(&mut self) -> &mut ObjectType {
        &mut self.query
    }

    pub(crate) fn register_object(&mut self, object: ObjectType) {
        self.objects.insert(object.name.clone(), object);
    }

    pub(crate) fn register_input(&mut self, input: InputObjectType) {
        self.inputs.insert(input.name.clone(), input);
    }

    /// The root query type
    pub fn query(&self) -> &ObjectType {
        &self.query
    }

    pub fn object(&self, name: &str) -> Option<&ObjectType> {
        self.objects.get(name)
    }

    pub fn input(&self, name: &str) -> Option<&InputObjectType> {
        self.inputs.get(name)
    }

    /// All non-root object types, ordered by name
    pub fn objects(&self) -> impl Iterator<Item = &ObjectType> {
        self.objects.values()
    }

    /// All input object types, ordered by name
    pub fn inputs(&self) -> impl Iterator<Item = &InputObjectType> {
        self.inputs.values()
    }

    /// Custom scalars referenced anywhere in the schema
    pub fn custom_scalars(&self) -> Vec<ScalarType> {
        let mut scalars = Vec::new();
        for object in std::iter::once(&self.query).chain(self.objects.values()) {
            for field in &object.fields {
                field.ty.collect_scalars(&mut scalars);
                for argument in &field.arguments {
                    argument.ty.collect_scalars(&mut scalars);
                }
            }
        }
        for input in self.inputs.values() {
            for field in &input.fields {
                field.ty.collect_scalars(&mut scalars);
            }
        }
        scalars.retain(|s| !s.is_builtin());
        scalars.sort();
        scalars.dedup();
        scalars
    }
}

impl fmt::Display for QuerySchema {
    /// Renders the schema in GraphQL SDL
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for scalar in self.custom_scalars() {
            writeln!(f, "scalar {}\n", scalar)?;
        }
        for object in std::iter::once(&self.query).chain(self.objects.values()) {
            writeln!(f, "type {} {{", object.name)?;
            for field in &object.fields {
                write!(f, "  {}", field.name)?;
                if !field.arguments.is_empty() {
                    let args: Vec<String> = field
                        .arguments
                        .iter()
                        .map(|a| format!("{}: {}", a.name, a.ty))
                        .collect();
                    write!(f, "({})", args.join(", "))?;
                }
                writeln!(f, ": {}", field.ty)?;
            }
            writeln!(f, "}}\n")?;
        }
        for input in self.inputs.values() {
            writeln!(f, "input {} {{", input.name)?;
            for field in &input.fields {
                writeln!(f, "  {}: {}", field.name, field.ty)?;
            }
            writeln!(f, "}}\n")?;
        }
        Ok(())
    }
}
