//! Statement construction.
//!
//! Browse builders return `None` when any input is the placeholder, so a
//! statement is never built from an unselected field. Write builders reject
//! the placeholder with [`GraphFormError::NoSelection`].

use std::borrow::Cow;
use std::fmt;

use crate::error::{GraphFormError, Result};
use crate::model::is_placeholder;
use crate::query::ast::{Assignments, Statement};
use crate::query::Value;

/// A statement ready for a gateway: structured form, rendered text with
/// `$name` slots, and the bound parameters in slot order.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
    statement: Statement,
    text: String,
    params: Vec<(String, Value)>,
}

impl Query {
    /// Renders `statement` with bound parameters.
    pub fn new(statement: Statement) -> Self {
        let mut renderer = Renderer::new(ParamMode::Bound);
        renderer.statement(&statement);
        Self {
            statement,
            text: renderer.out,
            params: renderer.params,
        }
    }

    /// Structured form.
    pub fn statement(&self) -> &Statement {
        &self.statement
    }

    /// Statement text with `$name` parameter slots.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bound parameters in slot order.
    pub fn params(&self) -> &[(String, Value)] {
        &self.params
    }

    /// Looks up one bound parameter.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Declared result columns.
    pub fn columns(&self) -> &'static [&'static str] {
        self.statement.columns()
    }
}

/// Echo form with parameters written as escaped literals. Only for status
/// messages and logs; gateways receive [`Query::text`] plus [`Query::params`].
impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut renderer = Renderer::new(ParamMode::Inline);
        renderer.statement(&self.statement);
        f.write_str(&renderer.out)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ParamMode {
    Bound,
    Inline,
}

struct Renderer {
    mode: ParamMode,
    out: String,
    params: Vec<(String, Value)>,
}

impl Renderer {
    fn new(mode: ParamMode) -> Self {
        Self {
            mode,
            out: String::new(),
            params: Vec::new(),
        }
    }

    fn push(&mut self, text: &str) {
        self.out.push_str(text);
    }

    fn ident(&mut self, name: &str) {
        let quoted = quote_ident(name);
        self.out.push_str(&quoted);
    }

    fn param(&mut self, name: &str, value: Value) {
        match self.mode {
            ParamMode::Bound => {
                self.out.push('$');
                self.out.push_str(name);
                self.params.push((name.to_owned(), value));
            }
            ParamMode::Inline => self.out.push_str(&value.to_literal()),
        }
    }

    /// `key: $p0, key2: $p1`
    fn map_body(&mut self, properties: &Assignments) {
        for (idx, (key, value)) in properties.iter().enumerate() {
            if idx > 0 {
                self.push(", ");
            }
            self.ident(key);
            self.push(": ");
            self.param(&format!("p{idx}"), value.clone());
        }
    }

    /// `var.key = $p0, var.key2 = $p1`
    fn set_list(&mut self, var: &str, properties: &Assignments) {
        for (idx, (key, value)) in properties.iter().enumerate() {
            if idx > 0 {
                self.push(", ");
            }
            self.push(var);
            self.push(".");
            self.ident(key);
            self.push(" = ");
            self.param(&format!("p{idx}"), value.clone());
        }
    }

    fn where_pair(&mut self, id1: &str, id2: &str) {
        self.push(" WHERE n1.ID = ");
        self.param("id1", id1.into());
        self.push(" AND n2.ID = ");
        self.param("id2", id2.into());
    }

    fn statement(&mut self, statement: &Statement) {
        match statement {
            Statement::AllIds => self.push("MATCH (n) WHERE n.ID IS NOT NULL RETURN n.ID AS ID"),
            Statement::NodeNames { node_type } => {
                self.push("MATCH (n:");
                self.ident(node_type);
                self.push(") RETURN DISTINCT n.name AS name");
            }
            Statement::NodeIds { node_type, name } => {
                self.push("MATCH (n:");
                self.ident(node_type);
                self.push(") WHERE n.name = ");
                self.param("name", name.into());
                self.push(" RETURN DISTINCT n.ID AS ID");
            }
            Statement::NodePropertyNames { id } => {
                self.push("MATCH (n) WHERE n.ID = ");
                self.param("id", id.into());
                self.push(" UNWIND keys(n) AS key RETURN DISTINCT key");
            }
            Statement::NodePropertyValue { id, property } => {
                self.push("MATCH (n) WHERE n.ID = ");
                self.param("id", id.into());
                self.push(" RETURN DISTINCT n.");
                self.ident(property);
                self.push(" AS value");
            }
            Statement::NodeName { id } => {
                self.push("MATCH (n) WHERE n.ID = ");
                self.param("id", id.into());
                self.push(" RETURN n.name AS name");
            }
            Statement::RelationshipPropertyValue {
                id1,
                id2,
                rel_type,
                property,
            } => {
                self.push("MATCH (n1)-[r:");
                self.ident(rel_type);
                self.push("]-(n2)");
                self.where_pair(id1, id2);
                self.push(" RETURN DISTINCT r.");
                self.ident(property);
                self.push(" AS value");
            }
            Statement::PeerNames { id, rel_type } => {
                self.push("MATCH (n1)-[:");
                self.ident(rel_type);
                self.push("]->(n2) WHERE n1.ID = ");
                self.param("id", id.into());
                self.push(" RETURN DISTINCT n2.name AS name");
            }
            Statement::PeerIds { id, rel_type, name } => {
                self.push("MATCH (n1)-[:");
                self.ident(rel_type);
                self.push("]->(n2) WHERE n1.ID = ");
                self.param("id", id.into());
                self.push(" AND n2.name = ");
                self.param("name", name.into());
                self.push(" RETURN DISTINCT n2.ID AS ID");
            }
            Statement::OneHop { id } => {
                self.push("MATCH (n1)-[r]-(n2) WHERE n1.ID = ");
                self.param("id", id.into());
                self.push(" RETURN n2.ID AS peer_id, n2.name AS peer_name, type(r) AS rel_type");
            }
            Statement::TwoHop { id } => {
                self.push("MATCH (n1)-[r]-(n2)-[r2]-(n3) WHERE n1.ID = ");
                self.param("id", id.into());
                self.push(
                    " RETURN n2.ID AS mid_id, n2.name AS mid_name, \
                     n3.ID AS end_id, n3.name AS end_name, type(r2) AS rel_type",
                );
            }
            Statement::AllNodes => {
                self.push("MATCH (n) RETURN n.ID AS id, n.name AS name, labels(n) AS labels")
            }
            Statement::AllRelationships => self.push(
                "MATCH (n1)-[r]->(n2) RETURN n1.ID AS source_id, n2.ID AS target_id, type(r) AS rel_type",
            ),
            Statement::OutgoingCount { id } => {
                self.push("MATCH (n)-[r]->() WHERE n.ID = ");
                self.param("id", id.into());
                self.push(" RETURN count(r) AS degree");
            }
            Statement::IncomingCount { id } => {
                self.push("MATCH ()-[r]->(n) WHERE n.ID = ");
                self.param("id", id.into());
                self.push(" RETURN count(r) AS degree");
            }
            Statement::CreateNode {
                node_type,
                properties,
            } => {
                self.push("CREATE (n:");
                self.ident(node_type);
                self.push(" {");
                self.map_body(properties);
                self.push("})");
            }
            Statement::CreateRelationship {
                id1,
                id2,
                rel_type,
                properties,
            } => {
                self.push("MATCH (n1), (n2)");
                self.where_pair(id1, id2);
                self.push(" CREATE (n1)-[r:");
                self.ident(rel_type);
                if !properties.is_empty() {
                    self.push(" {");
                    self.map_body(properties);
                    self.push("}");
                }
                self.push("]->(n2)");
            }
            Statement::SetNodeProperties { id, properties } => {
                self.push("MATCH (n) WHERE n.ID = ");
                self.param("id", id.into());
                self.push(" SET ");
                self.set_list("n", properties);
            }
            Statement::SetRelationshipProperties {
                id1,
                id2,
                rel_type,
                properties,
            } => {
                self.push("MATCH (n1)-[r:");
                self.ident(rel_type);
                self.push("]->(n2)");
                self.where_pair(id1, id2);
                self.push(" SET ");
                self.set_list("r", properties);
            }
            Statement::DeleteNode { id } => {
                self.push("MATCH (n) WHERE n.ID = ");
                self.param("id", id.into());
                self.push(" DELETE n");
            }
            Statement::DeleteRelationship { id1, id2, rel_type } => {
                self.push("MATCH (n1)-[r:");
                self.ident(rel_type);
                self.push("]->(n2)");
                self.where_pair(id1, id2);
                self.push(" DELETE r");
            }
        }
    }
}

/// Labels, relationship types and property keys cannot be bound as
/// parameters. Plain identifiers are emitted bare, anything else is
/// backtick-quoted with embedded backticks doubled.
pub fn quote_ident(name: &str) -> Cow<'_, str> {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("`{}`", name.replace('`', "``")))
    }
}

fn all_selected(values: &[&str]) -> bool {
    values.iter().all(|v| !is_placeholder(v))
}

fn browse(inputs: &[&str], statement: impl FnOnce() -> Statement) -> Option<Query> {
    all_selected(inputs).then(|| Query::new(statement()))
}

fn require(value: &str, what: &'static str) -> Result<()> {
    if is_placeholder(value) {
        Err(GraphFormError::no_selection(what))
    } else {
        Ok(())
    }
}

fn require_keys(properties: &Assignments) -> Result<()> {
    properties
        .iter()
        .try_for_each(|(key, _)| require(key, "property name"))
}

/// Scan of every node ID; run once per database open.
pub fn all_ids() -> Query {
    Query::new(Statement::AllIds)
}

/// Names of all nodes of a type.
pub fn node_names(node_type: &str) -> Option<Query> {
    browse(&[node_type], || Statement::NodeNames {
        node_type: node_type.to_owned(),
    })
}

/// IDs of all nodes of a type with a name.
pub fn node_ids(node_type: &str, name: &str) -> Option<Query> {
    browse(&[node_type, name], || Statement::NodeIds {
        node_type: node_type.to_owned(),
        name: name.to_owned(),
    })
}

/// Property keys present on a node.
pub fn node_property_names(id: &str) -> Option<Query> {
    browse(&[id], || Statement::NodePropertyNames { id: id.to_owned() })
}

/// Current value of one node property.
pub fn node_property_value(property: &str, id: &str) -> Option<Query> {
    browse(&[property, id], || Statement::NodePropertyValue {
        id: id.to_owned(),
        property: property.to_owned(),
    })
}

/// Name of a node.
pub fn node_name(id: &str) -> Option<Query> {
    browse(&[id], || Statement::NodeName { id: id.to_owned() })
}

/// Current value of one relationship property.
pub fn relationship_property_value(
    id1: &str,
    id2: &str,
    rel_type: &str,
    property: &str,
) -> Option<Query> {
    browse(&[id1, id2, rel_type, property], || {
        Statement::RelationshipPropertyValue {
            id1: id1.to_owned(),
            id2: id2.to_owned(),
            rel_type: rel_type.to_owned(),
            property: property.to_owned(),
        }
    })
}

/// Names of nodes reachable from `id` over `rel_type`.
pub fn peer_names(id: &str, rel_type: &str) -> Option<Query> {
    browse(&[id, rel_type], || Statement::PeerNames {
        id: id.to_owned(),
        rel_type: rel_type.to_owned(),
    })
}

/// IDs of nodes named `name` reachable from `id` over `rel_type`.
pub fn peer_ids(id: &str, rel_type: &str, name: &str) -> Option<Query> {
    browse(&[id, rel_type, name], || Statement::PeerIds {
        id: id.to_owned(),
        rel_type: rel_type.to_owned(),
        name: name.to_owned(),
    })
}

/// Direct neighborhood of a node.
pub fn one_hop(id: &str) -> Option<Query> {
    browse(&[id], || Statement::OneHop { id: id.to_owned() })
}

/// Second ring of a node's neighborhood.
pub fn two_hop(id: &str) -> Option<Query> {
    browse(&[id], || Statement::TwoHop { id: id.to_owned() })
}

/// Whole node population.
pub fn all_nodes() -> Query {
    Query::new(Statement::AllNodes)
}

/// Whole relationship population.
pub fn all_relationships() -> Query {
    Query::new(Statement::AllRelationships)
}

/// Outgoing relationship count, for the delete guard.
pub fn outgoing_count(id: &str) -> Result<Query> {
    require(id, "node ID")?;
    Ok(Query::new(Statement::OutgoingCount { id: id.to_owned() }))
}

/// Incoming relationship count, for the delete guard.
pub fn incoming_count(id: &str) -> Result<Query> {
    require(id, "node ID")?;
    Ok(Query::new(Statement::IncomingCount { id: id.to_owned() }))
}

/// Creates a node. `properties` must already include the allocated `ID`.
pub fn create_node(node_type: &str, properties: Assignments) -> Result<Query> {
    require(node_type, "node type")?;
    require_keys(&properties)?;
    Ok(Query::new(Statement::CreateNode {
        node_type: node_type.to_owned(),
        properties,
    }))
}

/// Creates a relationship `id1 -[rel_type]-> id2`.
pub fn create_relationship(
    id1: &str,
    id2: &str,
    rel_type: &str,
    properties: Assignments,
) -> Result<Query> {
    require(id1, "source node ID")?;
    require(id2, "target node ID")?;
    require(rel_type, "relationship type")?;
    require_keys(&properties)?;
    Ok(Query::new(Statement::CreateRelationship {
        id1: id1.to_owned(),
        id2: id2.to_owned(),
        rel_type: rel_type.to_owned(),
        properties,
    }))
}

/// Sets properties on a node in one statement.
pub fn set_node_properties(id: &str, properties: Assignments) -> Result<Query> {
    require(id, "node ID")?;
    if properties.is_empty() {
        return Err(GraphFormError::no_selection("property edits"));
    }
    require_keys(&properties)?;
    Ok(Query::new(Statement::SetNodeProperties {
        id: id.to_owned(),
        properties,
    }))
}

/// Sets properties on a relationship in one statement.
pub fn set_relationship_properties(
    id1: &str,
    id2: &str,
    rel_type: &str,
    properties: Assignments,
) -> Result<Query> {
    require(id1, "source node ID")?;
    require(id2, "target node ID")?;
    require(rel_type, "relationship type")?;
    if properties.is_empty() {
        return Err(GraphFormError::no_selection("property edits"));
    }
    require_keys(&properties)?;
    Ok(Query::new(Statement::SetRelationshipProperties {
        id1: id1.to_owned(),
        id2: id2.to_owned(),
        rel_type: rel_type.to_owned(),
        properties,
    }))
}

/// Deletes a node. Pair with [`outgoing_count`]/[`incoming_count`].
pub fn delete_node(id: &str) -> Result<Query> {
    require(id, "node ID")?;
    Ok(Query::new(Statement::DeleteNode { id: id.to_owned() }))
}

/// Deletes the relationship(s) `id1 -[rel_type]-> id2`.
pub fn delete_relationship(id1: &str, id2: &str, rel_type: &str) -> Result<Query> {
    require(id1, "source node ID")?;
    require(id2, "target node ID")?;
    require(rel_type, "relationship type")?;
    Ok(Query::new(Statement::DeleteRelationship {
        id1: id1.to_owned(),
        id2: id2.to_owned(),
        rel_type: rel_type.to_owned(),
    }))
}
