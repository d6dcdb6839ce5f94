//! sturgeon - a strongly-typed GraphQL query interface over document store collections
//!
//! Collection mappings are fetched once at startup and translated into a
//! GraphQL schema. Every collection `C` gets three root fields:
//!
//! - `C(size, boolean_query)` lists documents
//! - `C_by_id(id)` fetches one document
//! - `C_aggregations(boolean_query)` computes per-field aggregations
//!
//! Names that are not valid GraphQL identifiers are normalized through a
//! [`names::NameRegistry`], which also maps them back when queries are
//! compiled for the store.

pub mod cli;
pub mod graphql;
pub mod names;
pub mod observability;
pub mod query;
pub mod resolver;
pub mod schema;
pub mod store;
