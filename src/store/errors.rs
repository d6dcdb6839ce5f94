//! Document store errors

use thiserror::Error;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a document store client
#[derive(Debug, Error)]
pub enum StoreError {
    /// No configured host could be reached
    #[error("store unreachable: {0}")]
    Connection(String),

    /// The store answered with an error status
    #[error("store returned HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    /// The store's answer could not be parsed
    #[error("failed to parse store response: {0}")]
    Parse(String),

    /// The collection does not exist
    #[error("unknown collection '{0}'")]
    UnknownCollection(String),

    /// Internal state of the client is unusable
    #[error("store client error: {0}")]
    Internal(String),
}

impl StoreError {
    /// HTTP status reported by the store, if there was one
    pub fn status_code(&self) -> Option<u16> {
        match self {
            StoreError::Http { status, .. } => Some(*status),
            StoreError::UnknownCollection(_) => Some(404),
            _ => None,
        }
    }

    /// Whether another host might succeed where this one failed
    pub fn is_retryable_on_other_host(&self) -> bool {
        matches!(self, StoreError::Connection(_))
    }
}
