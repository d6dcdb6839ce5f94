//! Observable lifecycle events
//!
//! Events are explicit and typed. Their string form is stable so log lines can
//! be matched on.

use std::fmt;

/// Observable events in sturgeon
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Startup
    /// Configuration file loaded and validated
    ConfigLoaded,
    /// Raw mappings fetched from the store
    MappingsFetched,
    /// HTTP listener bound
    Serving,

    // Schema construction
    /// Schema construction started
    SchemaBuildBegin,
    /// Schema construction finished
    SchemaBuildComplete,
    /// A collection contributed nothing to the schema
    CollectionSkipped,
    /// Document type of one collection built
    DocumentTypeBuilt,
    /// Aggregation types of one collection built
    AggregationTypeBuilt,
    /// Boolean-query argument of one collection built
    BooleanArgumentBuilt,

    // Request handling
    /// Caller arguments compiled into native queries, only with query logging on
    QueryCompiled,
    /// Store answered a request
    QueryExecuted,
    /// Store request failed
    QueryFailed,
    /// A schema name had no original counterpart
    InvariantViolated,
}

impl Event {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::MappingsFetched => "MAPPINGS_FETCHED",
            Event::Serving => "SERVING",
            Event::SchemaBuildBegin => "SCHEMA_BUILD_BEGIN",
            Event::SchemaBuildComplete => "SCHEMA_BUILD_COMPLETE",
            Event::CollectionSkipped => "COLLECTION_SKIPPED",
            Event::DocumentTypeBuilt => "DOCUMENT_TYPE_BUILT",
            Event::AggregationTypeBuilt => "AGGREGATION_TYPE_BUILT",
            Event::BooleanArgumentBuilt => "BOOLEAN_ARGUMENT_BUILT",
            Event::QueryCompiled => "QUERY_COMPILED",
            Event::QueryExecuted => "QUERY_EXECUTED",
            Event::QueryFailed => "QUERY_FAILED",
            Event::InvariantViolated => "INVARIANT_VIOLATED",
        }
    }

    /// Events that indicate a bug rather than bad input
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::InvariantViolated)
    }

    /// Events that report a failed operation
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::QueryFailed | Event::InvariantViolated)
    }

    /// Per-collection construction steps, noisy on large clusters
    pub fn is_verbose(&self) -> bool {
        matches!(
            self,
            Event::DocumentTypeBuilt
                | Event::AggregationTypeBuilt
                | Event::BooleanArgumentBuilt
                | Event::QueryExecuted
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
