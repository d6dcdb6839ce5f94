//! GraphQL execution and serving
//!
//! The schema model from [`crate::schema`] is bound onto an
//! `async_graphql::dynamic::Schema` and served over HTTP with axum.

mod binding;
mod server;

pub use binding::build_executable_schema;
pub use server::{build_router, GraphqlServer, HealthResponse, GRAPHQL_PATH};
