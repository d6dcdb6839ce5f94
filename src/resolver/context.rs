//! Per-process execution state shared by every request

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::names::NameRegistry;
use crate::query::SelectedField;
use crate::store::DocumentStore;

/// Store handle and frozen name registry, shared across requests
#[derive(Clone)]
pub struct ExecutionContext {
    store: Arc<dyn DocumentStore>,
    names: Arc<NameRegistry>,
    query_logging: bool,
}

impl ExecutionContext {
    pub fn new(store: Arc<dyn DocumentStore>, names: Arc<NameRegistry>) -> Self {
        Self {
            store,
            names,
            query_logging: false,
        }
    }

    /// Log every compiled query before it is sent
    pub fn with_query_logging(mut self, enabled: bool) -> Self {
        self.query_logging = enabled;
        self
    }

    pub fn store(&self) -> &dyn DocumentStore {
        self.store.as_ref()
    }

    pub fn names(&self) -> &NameRegistry {
        &self.names
    }

    pub fn query_logging(&self) -> bool {
        self.query_logging
    }
}

impl fmt::Debug for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionContext")
            .field("names", &self.names.len())
            .field("query_logging", &self.query_logging)
            .finish()
    }
}

/// What one field invocation asked for
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldRequest {
    /// Arguments given to the field itself
    pub arguments: Map<String, Value>,
    /// Sub-fields selected under the field
    pub selection: Vec<SelectedField>,
    /// Arguments captured by an enclosing scope field
    pub scope: Option<Map<String, Value>>,
}

impl FieldRequest {
    pub fn new(arguments: Map<String, Value>, selection: Vec<SelectedField>) -> Self {
        Self {
            arguments,
            selection,
            scope: None,
        }
    }

    pub fn with_scope(mut self, scope: Map<String, Value>) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Outcome of resolving one field
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Schema-shaped data
    Value(Value),
    /// Arguments handed down to child fields
    Scope(Map<String, Value>),
}
