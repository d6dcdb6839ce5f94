//! Bidirectional original <-> schema name mapping

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::errors::{NameError, NameResult};

/// What to do when a second original name normalizes onto a taken schema name
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// The newer original name takes over the reverse mapping
    #[default]
    LastWriteWins,
    /// Registration of the newer original name fails
    Reject,
}

/// Registry of original names and their schema-safe counterparts
///
/// Re-registering an already known original name is a no-op. Under
/// [`CollisionPolicy::LastWriteWins`] a colliding registration replaces the
/// reverse entry while the earlier original keeps its forward entry, so
/// `to_original_name` always answers with the most recent registration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameRegistry {
    policy: CollisionPolicy,
    to_schema: HashMap<String, String>,
    to_original: HashMap<String, String>,
}

impl NameRegistry {
    /// Create an empty registry with the default collision policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry with an explicit collision policy
    pub fn with_policy(policy: CollisionPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    /// Returns the collision policy
    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Register `original` and return its schema name
    pub fn add_name(&mut self, original: &str) -> NameResult<String> {
        if let Some(existing) = self.to_schema.get(original) {
            return Ok(existing.clone());
        }

        let schema_name = normalize_name(original);
        if let Some(existing) = self.to_original.get(&schema_name) {
            if self.policy == CollisionPolicy::Reject {
                return Err(NameError::Collision {
                    schema_name,
                    existing: existing.clone(),
                    incoming: original.to_string(),
                });
            }
            tracing::warn!(
                schema_name = %schema_name,
                existing = %existing,
                incoming = %original,
                "schema name collision, later registration wins"
            );
        }

        self.to_schema
            .insert(original.to_string(), schema_name.clone());
        self.to_original
            .insert(schema_name.clone(), original.to_string());
        Ok(schema_name)
    }

    /// Look up the schema name of a registered original name
    pub fn to_schema_name(&self, original: &str) -> NameResult<&str> {
        self.to_schema
            .get(original)
            .map(String::as_str)
            .ok_or_else(|| NameError::UnknownOriginal(original.to_string()))
    }

    /// Look up the original name behind a schema name
    pub fn to_original_name(&self, schema_name: &str) -> NameResult<&str> {
        self.to_original
            .get(schema_name)
            .map(String::as_str)
            .ok_or_else(|| NameError::UnknownSchemaName(schema_name.to_string()))
    }

    /// Number of registered original names
    pub fn len(&self) -> usize {
        self.to_schema.len()
    }

    /// Whether nothing has been registered yet
    pub fn is_empty(&self) -> bool {
        self.to_schema.is_empty()
    }
}

/// Deterministic schema-safe transformation of a store name
///
/// Rules, in order: a leading `+` becomes `plus_`, a leading `-` becomes
/// `minus_`, `@` and `#` are dropped, spaces and any other character outside
/// `[A-Za-z0-9_]` become `_`, and a leading digit gets a `_` prefix.
pub fn normalize_name(name: &str) -> String {
    let (prefix, rest) = if let Some(rest) = name.strip_prefix('+') {
        ("plus_", rest)
    } else if let Some(rest) = name.strip_prefix('-') {
        ("minus_", rest)
    } else {
        ("", name)
    };

    let mut normalized = String::with_capacity(name.len() + prefix.len() + 1);
    normalized.push_str(prefix);
    for c in rest.chars() {
        match c {
            '@' | '#' => {}
            c if c.is_ascii_alphanumeric() || c == '_' => normalized.push(c),
            _ => normalized.push('_'),
        }
    }

    if normalized.is_empty() || normalized.starts_with(|c: char| c.is_ascii_digit()) {
        normalized.insert(0, '_');
    }
    normalized
}
