#![forbid(unsafe_code)]

//! Loose type schema for one database folder.
//!
//! A [`SchemaSnapshot`] is an immutable value. The workspace shares it through
//! an [`Arc`](std::sync::Arc) and replaces it wholesale when the database is
//! switched or when a staged edit introduces a property the schema did not
//! declare.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{is_placeholder, Candidates, PLACEHOLDER};

/// CSV loading of the four schema resources.
pub mod loader;

pub use loader::{load_folder, load_folder_strict, load_mapping, parse_mapping};

/// Key → ordered value list, as read from one schema resource.
pub type SchemaMapping = BTreeMap<String, Vec<String>>;

/// The four schema mappings of one database.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SchemaSnapshot {
    node_properties: SchemaMapping,
    relationship_properties: SchemaMapping,
    node_relationships: SchemaMapping,
    relationship_nodes: SchemaMapping,
}

impl SchemaSnapshot {
    /// Assembles a snapshot from already-parsed mappings.
    pub fn new(
        node_properties: SchemaMapping,
        relationship_properties: SchemaMapping,
        node_relationships: SchemaMapping,
        relationship_nodes: SchemaMapping,
    ) -> Self {
        Self {
            node_properties,
            relationship_properties,
            node_relationships,
            relationship_nodes,
        }
    }

    /// Node types, in key order.
    pub fn node_types(&self) -> Candidates {
        let types: Vec<String> = self.node_properties.keys().cloned().collect();
        Candidates::from_schema(&types)
    }

    /// Declared properties of a node type.
    pub fn property_types(&self, node_type: &str) -> Candidates {
        lookup(&self.node_properties, node_type)
    }

    /// Relationship types a node type may originate.
    pub fn relationship_types(&self, node_type: &str) -> Candidates {
        lookup(&self.node_relationships, node_type)
    }

    /// Declared properties of a relationship type.
    pub fn relationship_properties(&self, rel_type: &str) -> Candidates {
        lookup(&self.relationship_properties, rel_type)
    }

    /// Node types a relationship type may target.
    pub fn node2_types(&self, rel_type: &str) -> Candidates {
        lookup(&self.relationship_nodes, rel_type)
    }

    /// Raw node-property mapping.
    pub fn node_properties(&self) -> &SchemaMapping {
        &self.node_properties
    }

    /// Raw relationship-property mapping.
    pub fn relationship_property_map(&self) -> &SchemaMapping {
        &self.relationship_properties
    }

    /// Returns a snapshot in which `node_type` declares `property`. Returns an
    /// unchanged copy when it already does or either input is the placeholder.
    pub fn with_node_property(&self, node_type: &str, property: &str) -> Self {
        let mut next = self.clone();
        add_property(&mut next.node_properties, node_type, property);
        next
    }

    /// Relationship counterpart of [`SchemaSnapshot::with_node_property`].
    pub fn with_relationship_property(&self, rel_type: &str, property: &str) -> Self {
        let mut next = self.clone();
        add_property(&mut next.relationship_properties, rel_type, property);
        next
    }
}

fn lookup(mapping: &SchemaMapping, key: &str) -> Candidates {
    if is_placeholder(key) {
        return Candidates::placeholder();
    }
    mapping
        .get(key)
        .map(|values| Candidates::from_schema(values))
        .unwrap_or_default()
}

fn add_property(mapping: &mut SchemaMapping, key: &str, property: &str) {
    if is_placeholder(key) || is_placeholder(property) {
        return;
    }
    let values = mapping.entry(key.to_owned()).or_default();
    if values.iter().any(|v| v == property) {
        return;
    }
    // A key-only row was normalized to placeholders; the first real property
    // replaces them.
    values.retain(|v| v != PLACEHOLDER);
    values.push(property.to_owned());
}
