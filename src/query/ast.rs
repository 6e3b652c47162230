//! Structured form of every statement the editor issues.
//!
//! Each variant is one statement shape. The builder renders a variant to
//! statement text with `$name` parameter slots; gateways that understand the
//! structured form (the in-memory graph) execute the variant directly.

use crate::query::Value;

/// Ordered property assignments carried by create/set statements.
pub type Assignments = Vec<(String, Value)>;

/// Statement shapes issued by the editor core.
#[derive(Clone, Debug, PartialEq)]
pub enum Statement {
    /// Every node's `ID` property.
    AllIds,
    /// Distinct names of nodes with a label.
    NodeNames {
        /// Node type label.
        node_type: String,
    },
    /// Distinct IDs of nodes with a label and name.
    NodeIds {
        /// Node type label.
        node_type: String,
        /// Node name.
        name: String,
    },
    /// Property keys present on the node with an ID.
    NodePropertyNames {
        /// Node ID.
        id: String,
    },
    /// Value of one property on the node with an ID.
    NodePropertyValue {
        /// Node ID.
        id: String,
        /// Property key.
        property: String,
    },
    /// Name of the node with an ID.
    NodeName {
        /// Node ID.
        id: String,
    },
    /// Value of one property on the relationship(s) of a type between two
    /// nodes, in either direction.
    RelationshipPropertyValue {
        /// First node ID.
        id1: String,
        /// Second node ID.
        id2: String,
        /// Relationship type.
        rel_type: String,
        /// Property key.
        property: String,
    },
    /// Distinct names of nodes reached from a node over an outgoing
    /// relationship type.
    PeerNames {
        /// Source node ID.
        id: String,
        /// Relationship type.
        rel_type: String,
    },
    /// Distinct IDs of named nodes reached from a node over an outgoing
    /// relationship type.
    PeerIds {
        /// Source node ID.
        id: String,
        /// Relationship type.
        rel_type: String,
        /// Target node name.
        name: String,
    },
    /// Direct peers of a node, either direction.
    OneHop {
        /// Center node ID.
        id: String,
    },
    /// Relationships one hop beyond the direct peers of a node.
    TwoHop {
        /// Center node ID.
        id: String,
    },
    /// Whole node population.
    AllNodes,
    /// Whole directed relationship population.
    AllRelationships,
    /// Number of relationships leaving a node.
    OutgoingCount {
        /// Node ID.
        id: String,
    },
    /// Number of relationships arriving at a node.
    IncomingCount {
        /// Node ID.
        id: String,
    },
    /// Create one node with a label and properties.
    CreateNode {
        /// Node type label.
        node_type: String,
        /// Properties, `ID` first.
        properties: Assignments,
    },
    /// Create one relationship between two existing nodes.
    CreateRelationship {
        /// Source node ID.
        id1: String,
        /// Target node ID.
        id2: String,
        /// Relationship type.
        rel_type: String,
        /// Relationship properties.
        properties: Assignments,
    },
    /// Set properties on an existing node.
    SetNodeProperties {
        /// Node ID.
        id: String,
        /// Assignments applied in order.
        properties: Assignments,
    },
    /// Set properties on an existing directed relationship.
    SetRelationshipProperties {
        /// Source node ID.
        id1: String,
        /// Target node ID.
        id2: String,
        /// Relationship type.
        rel_type: String,
        /// Assignments applied in order.
        properties: Assignments,
    },
    /// Delete a node. Callers check for incident relationships first.
    DeleteNode {
        /// Node ID.
        id: String,
    },
    /// Delete the directed relationship(s) of a type between two nodes.
    DeleteRelationship {
        /// Source node ID.
        id1: String,
        /// Target node ID.
        id2: String,
        /// Relationship type.
        rel_type: String,
    },
}

impl Statement {
    /// Result columns in declared order. Write statements return none.
    pub fn columns(&self) -> &'static [&'static str] {
        match self {
            Statement::AllIds | Statement::NodeIds { .. } | Statement::PeerIds { .. } => &["ID"],
            Statement::NodeNames { .. } | Statement::NodeName { .. } | Statement::PeerNames { .. } => {
                &["name"]
            }
            Statement::NodePropertyNames { .. } => &["key"],
            Statement::NodePropertyValue { .. } | Statement::RelationshipPropertyValue { .. } => {
                &["value"]
            }
            Statement::OneHop { .. } => &["peer_id", "peer_name", "rel_type"],
            Statement::TwoHop { .. } => &["mid_id", "mid_name", "end_id", "end_name", "rel_type"],
            Statement::AllNodes => &["id", "name", "labels"],
            Statement::AllRelationships => &["source_id", "target_id", "rel_type"],
            Statement::OutgoingCount { .. } | Statement::IncomingCount { .. } => &["degree"],
            Statement::CreateNode { .. }
            | Statement::CreateRelationship { .. }
            | Statement::SetNodeProperties { .. }
            | Statement::SetRelationshipProperties { .. }
            | Statement::DeleteNode { .. }
            | Statement::DeleteRelationship { .. } => &[],
        }
    }

    /// Returns `true` for statements that mutate the graph.
    pub fn is_write(&self) -> bool {
        self.columns().is_empty()
    }
}
