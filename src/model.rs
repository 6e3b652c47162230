//! Shared value types: the placeholder sentinel, candidate lists and the
//! records decoded from neighborhood and whole-graph queries.

use serde::{Deserialize, Serialize};

/// "Nothing selected / nothing available". Every candidate list falls back to
/// this so a dependent control always has a default.
pub const PLACEHOLDER: &str = " ";

/// Returns `true` when `value` is the placeholder sentinel.
pub fn is_placeholder(value: &str) -> bool {
    value == PLACEHOLDER
}

/// Non-empty list of choices offered for one selection field. Deserializing
/// an empty list yields the placeholder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>")]
pub struct Candidates(Vec<String>);

impl Candidates {
    /// The single-element placeholder list.
    pub fn placeholder() -> Self {
        Candidates(vec![PLACEHOLDER.to_owned()])
    }

    /// Keeps schema order as-is; an empty slice becomes the placeholder.
    pub fn from_schema(values: &[String]) -> Self {
        if values.is_empty() {
            Self::placeholder()
        } else {
            Candidates(values.to_vec())
        }
    }

    /// Sorts ascending and removes duplicates; an empty input becomes the
    /// placeholder.
    pub fn sorted<I>(values: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut values: Vec<String> = values.into_iter().collect();
        values.sort();
        values.dedup();
        if values.is_empty() {
            Self::placeholder()
        } else {
            Candidates(values)
        }
    }

    /// First candidate; the default selection for the field.
    pub fn first(&self) -> &str {
        // Invariant: never empty.
        &self.0[0]
    }

    /// Returns `true` if `value` is one of the candidates.
    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|c| c == value)
    }

    /// Returns `true` when every entry is the placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.0.iter().all(|c| is_placeholder(c))
    }

    /// Borrowed view of the candidates.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of candidates (always at least one).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterates over the candidates.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }
}

impl From<Vec<String>> for Candidates {
    fn from(values: Vec<String>) -> Self {
        if values.is_empty() {
            Self::placeholder()
        } else {
            Candidates(values)
        }
    }
}

impl Default for Candidates {
    fn default() -> Self {
        Self::placeholder()
    }
}

/// One row of a 1-hop neighborhood: a direct peer of the center node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NeighborRow {
    /// Peer node ID.
    pub peer_id: String,
    /// Peer node name.
    pub peer_name: String,
    /// Type of the connecting relationship.
    pub rel_type: String,
}

/// One row of a 2-hop neighborhood: a relationship between a direct peer and
/// a node one hop further out.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TwoHopRow {
    /// ID of the intermediate node.
    pub mid_id: String,
    /// Name of the intermediate node.
    pub mid_name: String,
    /// ID of the far node.
    pub end_id: String,
    /// Name of the far node.
    pub end_name: String,
    /// Type of the relationship between the intermediate and far node.
    pub rel_type: String,
}

/// A node in the whole-graph population.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeRecord {
    /// Node ID.
    pub id: String,
    /// Node name.
    pub name: String,
    /// Node type label(s), comma-joined when there are several.
    pub label: String,
}

/// A relationship in the whole-graph population.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EdgeRecord {
    /// Source node ID.
    pub source_id: String,
    /// Target node ID.
    pub target_id: String,
    /// Relationship type.
    pub rel_type: String,
}
