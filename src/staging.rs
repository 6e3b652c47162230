//! Client-side staging of property edits.
//!
//! Edits accumulate in a [`PendingEdits`] list until one commit turns them
//! into a single create or SET statement. The list is cleared only after the
//! store accepted that statement.

use std::fmt;

use tracing::{debug, info};

use crate::error::{GraphFormError, Result};
use crate::ids::IdAllocator;
use crate::model::is_placeholder;
use crate::query::ast::Assignments;
use crate::query::{builder, Query, Value};
use crate::session::GraphSession;

/// What a set of edits applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditKind {
    /// Node properties.
    Node,
    /// Relationship properties.
    Relationship,
}

impl fmt::Display for EditKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditKind::Node => f.write_str("node"),
            EditKind::Relationship => f.write_str("relationship"),
        }
    }
}

/// Multi-field property dialog supplied by the host application.
pub trait PropertyEditor {
    /// Shows one input per `(name, current value)` pair for a `kind` of
    /// `type_name`. Returns the edited values in the same order, or `None`
    /// when the user cancelled.
    fn edit(
        &mut self,
        kind: EditKind,
        type_name: &str,
        fields: &[(String, String)],
    ) -> Option<Vec<String>>;
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Blanks {
    Skip,
    Keep,
}

/// Where a commit goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommitTarget {
    /// A node of this type; its ID is allocated at commit time.
    NewNode {
        /// Label of the new node.
        node_type: String,
    },
    /// A relationship `id1 -[rel_type]-> id2`.
    NewRelationship {
        /// Source node ID.
        id1: String,
        /// Target node ID.
        id2: String,
        /// Relationship type.
        rel_type: String,
    },
    /// An existing node.
    ExistingNode {
        /// Node ID.
        id: String,
    },
    /// An existing relationship `id1 -[rel_type]-> id2`.
    ExistingRelationship {
        /// Source node ID.
        id1: String,
        /// Target node ID.
        id2: String,
        /// Relationship type.
        rel_type: String,
    },
}

/// Outcome of a successful commit.
#[derive(Clone, Debug, PartialEq)]
pub struct Committed {
    /// The executed statement.
    pub query: Query,
    /// ID allocated for a new node.
    pub node_id: Option<String>,
}

/// Ordered `(property, value)` edits awaiting one commit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingEdits {
    edits: Vec<(String, String)>,
}

impl PendingEdits {
    /// Empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Staged edits in order.
    pub fn edits(&self) -> &[(String, String)] {
        &self.edits
    }

    /// Returns `true` when nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Staged value of `property`, if any.
    pub fn value(&self, property: &str) -> Option<&str> {
        self.edits
            .iter()
            .find(|(name, _)| name == property)
            .map(|(_, value)| value.as_str())
    }

    /// Stages one edit. Restaging a property replaces its value in place.
    pub fn add_edit(&mut self, property: &str, value: &str) -> Result<()> {
        if is_placeholder(property) {
            return Err(GraphFormError::no_selection("property name"));
        }
        match self.edits.iter_mut().find(|(name, _)| name == property) {
            Some((_, existing)) => *existing = value.to_owned(),
            None => self.edits.push((property.to_owned(), value.to_owned())),
        }
        debug!(property, "staging.edit.added");
        Ok(())
    }

    /// Opens `editor` with every property in `properties`, seeded from the
    /// staged list. The returned values replace the staged list; empty values
    /// are left unstaged. Returns `false` when the editor was cancelled, in
    /// which case nothing changes.
    pub fn add_all_edits(
        &mut self,
        kind: EditKind,
        type_name: &str,
        properties: &[String],
        editor: &mut dyn PropertyEditor,
    ) -> bool {
        self.collect(kind, type_name, properties, editor, Blanks::Skip)
    }

    /// Existing-target form of [`PendingEdits::add_all_edits`]: every
    /// returned value is staged, so each dialog field is written back and an
    /// emptied field clears its property on commit.
    pub fn replace_all_edits(
        &mut self,
        kind: EditKind,
        type_name: &str,
        properties: &[String],
        editor: &mut dyn PropertyEditor,
    ) -> bool {
        self.collect(kind, type_name, properties, editor, Blanks::Keep)
    }

    fn collect(
        &mut self,
        kind: EditKind,
        type_name: &str,
        properties: &[String],
        editor: &mut dyn PropertyEditor,
        blanks: Blanks,
    ) -> bool {
        let fields: Vec<(String, String)> = properties
            .iter()
            .filter(|name| !is_placeholder(name))
            .map(|name| {
                let current = self.value(name).unwrap_or_default().to_owned();
                (name.clone(), current)
            })
            .collect();
        let Some(values) = editor.edit(kind, type_name, &fields) else {
            return false;
        };
        self.edits = fields
            .into_iter()
            .zip(values)
            .filter(|(_, value)| blanks == Blanks::Keep || !value.is_empty())
            .map(|((name, _), value)| (name, value))
            .collect();
        true
    }

    /// Drops every staged edit.
    pub fn clear(&mut self) {
        self.edits.clear();
    }

    /// Builds and executes the single statement for `target`. The list is
    /// cleared only if the store accepted it.
    pub fn commit(
        &mut self,
        target: &CommitTarget,
        session: &mut dyn GraphSession,
        ids: &mut IdAllocator,
    ) -> Result<Committed> {
        let (query, node_id) = self.build(target, ids)?;
        session.run(&query)?;
        info!(edits = self.edits.len(), "staging.committed");
        self.clear();
        Ok(Committed { query, node_id })
    }

    /// An empty value is bound as null, which removes the property.
    fn assignments(&self) -> Assignments {
        self.edits
            .iter()
            .map(|(name, value)| {
                let value = if value.is_empty() {
                    Value::Null
                } else {
                    Value::from(value)
                };
                (name.clone(), value)
            })
            .collect()
    }

    fn build(
        &self,
        target: &CommitTarget,
        ids: &mut IdAllocator,
    ) -> Result<(Query, Option<String>)> {
        let query = match target {
            CommitTarget::NewNode { node_type } => {
                if is_placeholder(node_type) {
                    return Err(GraphFormError::no_selection("node type"));
                }
                let id = ids.allocate()?;
                let mut properties = vec![("ID".to_owned(), Value::from(id.as_str()))];
                properties.extend(
                    self.assignments()
                        .into_iter()
                        .filter(|(name, _)| name != "ID"),
                );
                return Ok((builder::create_node(node_type, properties)?, Some(id)));
            }
            CommitTarget::NewRelationship { id1, id2, rel_type } => {
                builder::create_relationship(id1, id2, rel_type, self.assignments())
            }
            CommitTarget::ExistingNode { id } => {
                builder::set_node_properties(id, self.assignments())
            }
            CommitTarget::ExistingRelationship { id1, id2, rel_type } => {
                builder::set_relationship_properties(id1, id2, rel_type, self.assignments())
            }
        }?;
        Ok((query, None))
    }
}
