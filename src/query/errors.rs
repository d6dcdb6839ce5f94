//! Request-time errors

use thiserror::Error;

use crate::names::NameError;
use crate::store::StoreError;

/// Result type for request handling
pub type QueryResult<T> = Result<T, QueryError>;

/// Errors raised while answering a query
#[derive(Debug, Error)]
pub enum QueryError {
    /// The store rejected or failed the request
    #[error("store request failed: {0}")]
    Store(#[from] StoreError),

    /// An argument value had an unexpected shape
    #[error("invalid argument '{argument}': {reason}")]
    InvalidArgument { argument: String, reason: String },

    /// A schema name had no registered original name, or the reverse
    #[error("name resolution failed: {0}")]
    NameResolution(#[from] NameError),

    /// The store answered with something that cannot be decoded
    #[error("malformed store result: {0}")]
    MalformedResult(String),
}

impl QueryError {
    pub fn invalid_argument(argument: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidArgument {
            argument: argument.into(),
            reason: reason.into(),
        }
    }

    /// Internal errors are bugs, not caller mistakes
    pub fn is_internal(&self) -> bool {
        matches!(self, QueryError::NameResolution(_))
    }

    /// Message safe to return to the caller
    pub fn client_message(&self) -> String {
        if self.is_internal() {
            "internal error".to_string()
        } else {
            self.to_string()
        }
    }
}
