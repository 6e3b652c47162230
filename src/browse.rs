//! Candidate lists for the browse controls.
//!
//! Schema-backed lists come straight from the [`SchemaSnapshot`]; the rest run
//! one statement each. Store-backed lists drop nulls, are deduplicated and
//! sorted, and fall back to the placeholder when empty. A placeholder input
//! returns the placeholder without contacting the store.

use tracing::debug;

use crate::error::Result;
use crate::model::Candidates;
use crate::query::{builder, Query};
use crate::schema::SchemaSnapshot;
use crate::session::GraphSession;

/// Property key every node carries; not offered as an editable property.
pub const ID_PROPERTY: &str = "ID";

/// Borrowed view over the schema and an open session.
pub struct Browser<'a> {
    schema: &'a SchemaSnapshot,
    session: &'a mut dyn GraphSession,
}

impl<'a> Browser<'a> {
    /// Wraps a schema snapshot and a session.
    pub fn new(schema: &'a SchemaSnapshot, session: &'a mut dyn GraphSession) -> Self {
        Self { schema, session }
    }

    /// Schema in use.
    pub fn schema(&self) -> &SchemaSnapshot {
        self.schema
    }

    /// All node types.
    pub fn node_types(&self) -> Candidates {
        self.schema.node_types()
    }

    /// Names of nodes of `node_type`.
    pub fn node_names(&mut self, node_type: &str) -> Result<Candidates> {
        self.list(builder::node_names(node_type))
    }

    /// IDs of nodes of `node_type` named `name`.
    pub fn node_ids(&mut self, node_type: &str, name: &str) -> Result<Candidates> {
        self.list(builder::node_ids(node_type, name))
    }

    /// Property keys present on node `id`, excluding `ID`.
    pub fn property_names(&mut self, id: &str) -> Result<Candidates> {
        let Some(query) = builder::node_property_names(id) else {
            return Ok(Candidates::placeholder());
        };
        let values = self.values(&query)?;
        Ok(Candidates::sorted(
            values.into_iter().filter(|key| key != ID_PROPERTY),
        ))
    }

    /// Current value(s) of `property` on node `id`.
    pub fn property_value(&mut self, property: &str, id: &str) -> Result<Candidates> {
        self.list(builder::node_property_value(property, id))
    }

    /// Name of node `id`.
    pub fn node_name(&mut self, id: &str) -> Result<Candidates> {
        self.list(builder::node_name(id))
    }

    /// Relationship types `node_type` may originate.
    pub fn relationship_types(&self, node_type: &str) -> Candidates {
        self.schema.relationship_types(node_type)
    }

    /// Declared properties of `rel_type`.
    pub fn relationship_property_names(&self, rel_type: &str) -> Candidates {
        self.schema.relationship_properties(rel_type)
    }

    /// Current value(s) of a relationship property.
    pub fn relationship_property_value(
        &mut self,
        id1: &str,
        id2: &str,
        rel_type: &str,
        property: &str,
    ) -> Result<Candidates> {
        self.list(builder::relationship_property_value(
            id1, id2, rel_type, property,
        ))
    }

    /// Node types `rel_type` may target.
    pub fn node2_types(&self, rel_type: &str) -> Candidates {
        self.schema.node2_types(rel_type)
    }

    /// Names of nodes reachable from `id` over `rel_type`.
    pub fn node2_names(&mut self, id: &str, rel_type: &str) -> Result<Candidates> {
        self.list(builder::peer_names(id, rel_type))
    }

    /// IDs of nodes named `name` reachable from `id` over `rel_type`.
    pub fn node2_ids(&mut self, id: &str, rel_type: &str, name: &str) -> Result<Candidates> {
        self.list(builder::peer_ids(id, rel_type, name))
    }

    fn list(&mut self, query: Option<Query>) -> Result<Candidates> {
        match query {
            Some(query) => Ok(Candidates::sorted(self.values(&query)?)),
            None => Ok(Candidates::placeholder()),
        }
    }

    /// Runs `query` and returns the non-null values of its single column.
    fn values(&mut self, query: &Query) -> Result<Vec<String>> {
        debug!(statement = query.text(), "browse.query");
        let rows = self.session.run(query)?;
        let column = query.columns().first().copied().unwrap_or_default();
        Ok(rows
            .iter()
            .filter_map(|row| row.get(column))
            .filter(|value| !value.is_null())
            .map(|value| value.to_text())
            .collect())
    }
}
