//! Query compilation for sturgeon
//!
//! Per request the resolvers run, in order:
//!
//! 1. [`select_fields`]: selection set -> native projection
//! 2. [`compile_arguments`]: boolean-query argument -> native queries
//! 3. the store call
//! 4. [`decode_document`] / [`decode_aggregations`]: native result -> schema shape
//!
//! Every step is a pure function of its inputs and the read-only name registry.

mod adapter;
mod compiled;
mod decoder;
mod errors;
mod kinds;
mod selector;

pub use adapter::{compile_arguments, compile_boolean_query};
pub use compiled::{compare_values, encode_queries, matches_all, BoolQuery, CompiledQuery, RangeBound, RangeQuery};
pub use decoder::{decode_aggregations, decode_document};
pub use errors::{QueryError, QueryResult};
pub use kinds::{AggregationKind, AggregationOutput, BooleanQueryKind};
pub use selector::{select_fields, QuerySelection, SelectedField};
