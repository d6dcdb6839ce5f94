//! Projection from the caller's selection set

use crate::names::NameRegistry;
use crate::schema::constants::{ID, TYPENAME};

use super::errors::QueryResult;

/// One field of a selection set
///
/// Children are recorded but never projected: the only nested selections
/// are the `key`/`value` pairs of percentile results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedField {
    pub name: String,
    pub children: Vec<SelectedField>,
}

impl SelectedField {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    pub fn with_children(name: impl Into<String>, children: Vec<SelectedField>) -> Self {
        Self {
            name: name.into(),
            children,
        }
    }
}

/// Native fields to fetch for one request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuerySelection {
    /// Original field names, in selection order, without duplicates
    pub native_fields: Vec<String>,
    /// Whether the synthetic `id` field was selected
    pub include_identifier: bool,
}

/// Translate a selection set into a native projection
///
/// A selected name without an original counterpart is a registration bug and
/// fails the request.
pub fn select_fields(names: &NameRegistry, selection: &[SelectedField]) -> QueryResult<QuerySelection> {
    let mut result = QuerySelection::default();
    for field in selection {
        match field.name.as_str() {
            ID => result.include_identifier = true,
            TYPENAME => {}
            name => {
                let original = names.to_original_name(name)?;
                if !result.native_fields.iter().any(|f| f == original) {
                    result.native_fields.push(original.to_string());
                }
            }
        }
    }
    Ok(result)
}
