//! Name registry errors

use thiserror::Error;

/// Result type for registry operations
pub type NameResult<T> = Result<T, NameError>;

/// Registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// Original name was never registered
    #[error("no schema name registered for original name '{0}'")]
    UnknownOriginal(String),

    /// Schema name has no original counterpart
    #[error("no original name registered for schema name '{0}'")]
    UnknownSchemaName(String),

    /// Two original names normalize to the same schema name
    #[error("schema name '{schema_name}' for '{incoming}' is already taken by '{existing}'")]
    Collision {
        schema_name: String,
        existing: String,
        incoming: String,
    },
}
