//! Aggregation and boolean-query kinds
//!
//! Both are closed sets; every per-kind rule is an exhaustive `match` so a new
//! variant cannot be added without deciding each rule for it.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::schema::ScalarType;

/// Store-side reduction over a single field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregationKind {
    Avg,
    Max,
    Min,
    Cardinality,
    Percentiles,
}

/// Output shape of one aggregated field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregationOutput {
    /// A single value of the given scalar type
    Scalar(ScalarType),
    /// A list of `{key, value}` percentile pairs, values of the given scalar type
    KeyedList(ScalarType),
}

impl AggregationKind {
    /// All kinds, in schema order
    pub const ALL: [AggregationKind; 5] = [
        AggregationKind::Avg,
        AggregationKind::Max,
        AggregationKind::Min,
        AggregationKind::Cardinality,
        AggregationKind::Percentiles,
    ];

    /// Name used in the schema and in the store's aggregation DSL
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregationKind::Avg => "avg",
            AggregationKind::Max => "max",
            AggregationKind::Min => "min",
            AggregationKind::Cardinality => "cardinality",
            AggregationKind::Percentiles => "percentiles",
        }
    }

    /// Parse the aggregation type tag reported by the store
    pub fn from_native(tag: &str) -> Option<Self> {
        match tag {
            "avg" => Some(AggregationKind::Avg),
            "max" => Some(AggregationKind::Max),
            "min" => Some(AggregationKind::Min),
            "cardinality" => Some(AggregationKind::Cardinality),
            "percentiles" | "tdigest_percentiles" | "hdr_percentiles" => {
                Some(AggregationKind::Percentiles)
            }
            _ => None,
        }
    }

    /// Whether a field of the given scalar type can be aggregated by this kind
    pub fn accepts(&self, scalar: ScalarType) -> bool {
        match self {
            AggregationKind::Avg | AggregationKind::Max | AggregationKind::Min => {
                scalar.is_numeric() || scalar == ScalarType::DateTime
            }
            AggregationKind::Cardinality | AggregationKind::Percentiles => scalar.is_numeric(),
        }
    }

    /// Output shape for a field of the given (accepted) scalar type
    pub fn output(&self, scalar: ScalarType) -> AggregationOutput {
        match self {
            AggregationKind::Avg | AggregationKind::Max | AggregationKind::Min => {
                AggregationOutput::Scalar(scalar)
            }
            AggregationKind::Cardinality => AggregationOutput::Scalar(ScalarType::Long),
            AggregationKind::Percentiles => AggregationOutput::KeyedList(scalar),
        }
    }
}

impl fmt::Display for AggregationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clause group of a compound boolean query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanQueryKind {
    /// Must match, contributes to scoring
    Must,
    /// Must not match
    MustNot,
    /// Must match, does not affect scoring
    Filter,
    /// Optional match
    Should,
}

impl BooleanQueryKind {
    /// All kinds, in schema order
    pub const ALL: [BooleanQueryKind; 4] = [
        BooleanQueryKind::Must,
        BooleanQueryKind::MustNot,
        BooleanQueryKind::Filter,
        BooleanQueryKind::Should,
    ];

    /// Name used in the schema and in the store's query DSL
    pub fn as_str(&self) -> &'static str {
        match self {
            BooleanQueryKind::Must => "must",
            BooleanQueryKind::MustNot => "must_not",
            BooleanQueryKind::Filter => "filter",
            BooleanQueryKind::Should => "should",
        }
    }

    /// Parse a clause name as it appears in the boolean-query argument
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "must" => Some(BooleanQueryKind::Must),
            "must_not" => Some(BooleanQueryKind::MustNot),
            "filter" => Some(BooleanQueryKind::Filter),
            "should" => Some(BooleanQueryKind::Should),
            _ => None,
        }
    }
}

impl fmt::Display for BooleanQueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
