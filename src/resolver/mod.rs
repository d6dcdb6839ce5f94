//! Field resolvers
//!
//! Every root and aggregation field carries a small resolver value built once
//! with the schema. Resolvers hold only original collection names and the
//! aggregation kind; everything request-specific arrives through
//! [`FieldRequest`] and the shared [`ExecutionContext`].

mod aggregations;
mod context;
mod documents;

pub use aggregations::{AggregationResolver, AggregationScopeResolver};
pub use context::{ExecutionContext, FieldRequest, Resolution};
pub use documents::{DocumentByIdResolver, DocumentListResolver};

use async_trait::async_trait;

use crate::observability::{log_event_with_fields, Event};
use crate::query::QueryResult;

/// Resolve one field invocation
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, ctx: &ExecutionContext, request: FieldRequest) -> QueryResult<Resolution>;
}

/// Resolver attached to a schema field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolver {
    DocumentList(DocumentListResolver),
    DocumentById(DocumentByIdResolver),
    AggregationScope(AggregationScopeResolver),
    Aggregation(AggregationResolver),
}

impl Resolver {
    /// Original name of the collection the resolver reads from
    pub fn collection(&self) -> &str {
        match self {
            Resolver::DocumentList(r) => &r.collection,
            Resolver::DocumentById(r) => &r.collection,
            Resolver::AggregationScope(r) => &r.collection,
            Resolver::Aggregation(r) => &r.collection,
        }
    }

    fn inner(&self) -> &dyn Resolve {
        match self {
            Resolver::DocumentList(r) => r,
            Resolver::DocumentById(r) => r,
            Resolver::AggregationScope(r) => r,
            Resolver::Aggregation(r) => r,
        }
    }
}

#[async_trait]
impl Resolve for Resolver {
    /// Dispatch and log failures
    ///
    /// Internal errors are logged as invariant violations; the caller only
    /// ever sees their opaque client message.
    async fn resolve(&self, ctx: &ExecutionContext, request: FieldRequest) -> QueryResult<Resolution> {
        let result = self.inner().resolve(ctx, request).await;
        if let Err(e) = &result {
            let reason = e.to_string();
            let event = if e.is_internal() {
                Event::InvariantViolated
            } else {
                Event::QueryFailed
            };
            log_event_with_fields(event, &[("collection", self.collection()), ("reason", reason.as_str())]);
        }
        result
    }
}

impl From<DocumentListResolver> for Resolver {
    fn from(resolver: DocumentListResolver) -> Self {
        Resolver::DocumentList(resolver)
    }
}

impl From<DocumentByIdResolver> for Resolver {
    fn from(resolver: DocumentByIdResolver) -> Self {
        Resolver::DocumentById(resolver)
    }
}

impl From<AggregationScopeResolver> for Resolver {
    fn from(resolver: AggregationScopeResolver) -> Self {
        Resolver::AggregationScope(resolver)
    }
}

impl From<AggregationResolver> for Resolver {
    fn from(resolver: AggregationResolver) -> Self {
        Resolver::Aggregation(resolver)
    }
}
