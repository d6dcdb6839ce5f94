//! Schema construction errors
//!
//! Every error raised while building the schema aborts startup.

use thiserror::Error;

use crate::names::NameError;
use crate::store::StoreError;

/// Result type for schema construction
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Schema construction errors
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Mappings could not be fetched
    #[error("failed to fetch mappings: {0}")]
    Store(#[from] StoreError),

    /// Mapping response did not have the expected shape
    #[error("malformed mapping for '{collection}': {reason}")]
    MalformedMapping { collection: String, reason: String },

    /// Name registration failed under the reject collision policy
    #[error("name registration failed: {0}")]
    Names(#[from] NameError),

    /// Include pattern is not a valid regular expression
    #[error("invalid index include pattern '{pattern}': {reason}")]
    InvalidIncludePattern { pattern: String, reason: String },

    /// No collection produced any root field
    #[error("no valid mappings provided, no schemas were built")]
    NoCollections,

    /// Model could not be turned into an executable GraphQL schema
    #[error("failed to build executable schema: {0}")]
    Binding(String),
}

impl SchemaError {
    pub fn malformed(collection: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::MalformedMapping {
            collection: collection.into(),
            reason: reason.into(),
        }
    }

    /// Construction errors are never recoverable
    pub fn is_fatal(&self) -> bool {
        true
    }
}
