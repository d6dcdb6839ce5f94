//! Name registry for sturgeon
//!
//! Collection and field names in the document store may contain characters
//! that are illegal in GraphQL identifiers (`@timestamp`, `Unix Time`,
//! `+X Temperature`). The registry maps every original name to a schema-safe
//! name and keeps the reverse mapping, which is the only way back: the
//! normalization is lossy.
//!
//! The registry is written while the schema is built and only read afterwards,
//! so it is owned mutably by the builder and shared behind an `Arc` once the
//! schema is finished.

mod errors;
mod registry;

pub use errors::{NameError, NameResult};
pub use registry::{normalize_name, CollisionPolicy, NameRegistry};
