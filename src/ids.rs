//! Node identifier allocation.
//!
//! Identifiers are canonical non-negative decimal strings. The allocator keeps
//! every identifier seen so far and hands out `max + 1`. Identifiers are never
//! released, so allocation is monotonic for the lifetime of the workspace.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{GraphFormError, Result};
use crate::query::Value;
use crate::session::Row;

/// Set of allocated node identifiers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IdAllocator {
    ids: BTreeSet<String>,
}

impl IdAllocator {
    /// Empty allocator; the first allocation yields `"1"`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the set from the rows of a full `ID` scan. Null IDs are
    /// dropped.
    pub fn seed(rows: &[Row]) -> Self {
        let ids = rows
            .iter()
            .filter_map(|row| row.get("ID"))
            .filter(|value| !value.is_null())
            .map(Value::to_text)
            .collect();
        Self { ids }
    }

    /// Records an identifier created outside the allocator.
    pub fn register(&mut self, id: impl Into<String>) {
        self.ids.insert(id.into());
    }

    /// Returns `true` if `id` has been allocated or registered.
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    /// Number of known identifiers.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if no identifier is known.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Allocates and registers the next identifier.
    ///
    /// Fails with [`GraphFormError::InvalidIdFormat`] if any known identifier
    /// is not a canonical decimal integer (no sign, no leading zeros); nothing
    /// is registered in that case.
    pub fn allocate(&mut self) -> Result<String> {
        let mut max: Option<u64> = None;
        for id in &self.ids {
            let parsed = parse_canonical(id)
                .ok_or_else(|| GraphFormError::InvalidIdFormat { id: id.clone() })?;
            max = Some(max.map_or(parsed, |m| m.max(parsed)));
        }
        let next = match max {
            None => 1,
            Some(m) => m
                .checked_add(1)
                .ok_or_else(|| GraphFormError::InvalidIdFormat { id: m.to_string() })?,
        };
        let id = next.to_string();
        self.ids.insert(id.clone());
        debug!(id = %id, "ids.allocated");
        Ok(id)
    }
}

/// `"42"` parses; `"+42"`, `"042"` and `" 42"` do not.
fn parse_canonical(id: &str) -> Option<u64> {
    let parsed = id.parse::<u64>().ok()?;
    (parsed.to_string() == id).then_some(parsed)
}
