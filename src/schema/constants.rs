//! Names shared between schema construction and request handling

/// Descriptor key holding nested field descriptors
pub const PROPERTIES: &str = "properties";
/// Collection entry key holding the mapping body
pub const MAPPINGS: &str = "mappings";

/// Root query type name
pub const QUERY_TYPE: &str = "Query";

/// Synthetic identifier field and argument
pub const ID: &str = "id";
/// Result-size argument
pub const SIZE: &str = "size";
/// Boolean-query argument
pub const BOOLEAN_QUERY: &str = "boolean_query";
/// The only supported term-level operator
pub const RANGE: &str = "range";

/// Fields of the keyed percentile output types
pub const KEY: &str = "key";
pub const VALUE: &str = "value";

/// Introspection field that never maps to a stored field
pub const TYPENAME: &str = "__typename";
