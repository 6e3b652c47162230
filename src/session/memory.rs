//! In-memory property graph that executes the structured form of each
//! [`Query`]. Result rows use the same column keys a remote store returns for
//! the rendered statement text.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use tracing::debug;

use super::{Connector, Credentials, DatabaseTarget, GraphSession, Row, SessionError};
use crate::query::ast::Assignments;
use crate::query::{Query, Statement, Value};

#[derive(Clone, Debug)]
struct MemNode {
    labels: Vec<String>,
    props: BTreeMap<String, Value>,
}

impl MemNode {
    fn prop(&self, key: &str) -> Value {
        self.props.get(key).cloned().unwrap_or(Value::Null)
    }

    fn has_id(&self, id: &str) -> bool {
        matches!(self.props.get("ID"), Some(Value::String(v)) if v == id)
    }

    fn has_name(&self, name: &str) -> bool {
        matches!(self.props.get("name"), Some(Value::String(v)) if v == name)
    }
}

#[derive(Clone, Debug)]
struct MemEdge {
    src: usize,
    dst: usize,
    rel_type: String,
    props: BTreeMap<String, Value>,
}

impl MemEdge {
    fn other(&self, node: usize) -> Option<usize> {
        if self.src == node {
            Some(self.dst)
        } else if self.dst == node {
            Some(self.src)
        } else {
            None
        }
    }
}

/// Property graph held in memory. Deleted slots stay `None` so indices
/// remain stable.
#[derive(Clone, Debug, Default)]
pub struct MemoryGraph {
    nodes: Vec<Option<MemNode>>,
    edges: Vec<Option<MemEdge>>,
    statements: usize,
    captured: Option<Vec<Query>>,
    failure: Option<(usize, String)>,
}

impl MemoryGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty graph that keeps a copy of every query it runs.
    pub fn capturing() -> Self {
        Self {
            captured: Some(Vec::new()),
            ..Self::default()
        }
    }

    /// Captured queries, oldest first. Empty unless built with
    /// [`MemoryGraph::capturing`].
    pub fn executed(&self) -> &[Query] {
        self.captured.as_deref().unwrap_or_default()
    }

    /// Number of queries run so far.
    pub fn statements_executed(&self) -> usize {
        self.statements
    }

    /// Makes the next [`GraphSession::run`] fail with `reason`.
    pub fn fail_next(&mut self, reason: impl Into<String>) {
        self.fail_after(0, reason);
    }

    /// Lets `succeed` more statements run, then fails the one after with
    /// `reason`.
    pub fn fail_after(&mut self, succeed: usize, reason: impl Into<String>) {
        self.failure = Some((succeed, reason.into()));
    }

    /// Live node count.
    pub fn node_count(&self) -> usize {
        self.nodes.iter().flatten().count()
    }

    /// Live relationship count.
    pub fn relationship_count(&self) -> usize {
        self.edges.iter().flatten().count()
    }

    fn live_nodes(&self) -> impl Iterator<Item = (usize, &MemNode)> {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, node)| node.as_ref().map(|n| (idx, n)))
    }

    fn live_edges(&self) -> impl Iterator<Item = (usize, &MemEdge)> {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(idx, edge)| edge.as_ref().map(|e| (idx, e)))
    }

    fn node(&self, idx: usize) -> Option<&MemNode> {
        self.nodes.get(idx).and_then(Option::as_ref)
    }

    fn node_id_matches(&self, idx: usize, id: &str) -> bool {
        self.node(idx).is_some_and(|n| n.has_id(id))
    }

    fn nodes_with_id<'a>(&'a self, id: &'a str) -> impl Iterator<Item = usize> + 'a {
        self.live_nodes()
            .filter(move |(_, n)| n.has_id(id))
            .map(|(idx, _)| idx)
    }

    fn node_prop(&self, idx: usize, key: &str) -> Value {
        self.node(idx).map(|n| n.prop(key)).unwrap_or(Value::Null)
    }

    fn directed_edges<'a>(
        &'a self,
        id1: &'a str,
        id2: &'a str,
        rel_type: &'a str,
    ) -> impl Iterator<Item = usize> + 'a {
        self.live_edges()
            .filter(move |(_, e)| {
                e.rel_type == rel_type
                    && self.node_id_matches(e.src, id1)
                    && self.node_id_matches(e.dst, id2)
            })
            .map(|(idx, _)| idx)
    }

    fn execute(&mut self, query: &Query) -> Result<Vec<Row>, SessionError> {
        let rows = match query.statement() {
            Statement::AllIds => self
                .live_nodes()
                .filter_map(|(_, n)| n.props.get("ID").cloned())
                .filter(|v| !v.is_null())
                .map(|v| Row::new().with("ID", v))
                .collect(),
            Statement::NodeNames { node_type } => distinct(
                "name",
                self.live_nodes()
                    .filter(|(_, n)| n.labels.iter().any(|l| l == node_type))
                    .map(|(_, n)| n.prop("name")),
            ),
            Statement::NodeIds { node_type, name } => distinct(
                "ID",
                self.live_nodes()
                    .filter(|(_, n)| n.labels.iter().any(|l| l == node_type) && n.has_name(name))
                    .map(|(_, n)| n.prop("ID")),
            ),
            Statement::NodePropertyNames { id } => distinct(
                "key",
                self.live_nodes()
                    .filter(|(_, n)| n.has_id(id))
                    .flat_map(|(_, n)| n.props.keys().cloned().map(Value::String)),
            ),
            Statement::NodePropertyValue { id, property } => distinct(
                "value",
                self.live_nodes()
                    .filter(|(_, n)| n.has_id(id))
                    .map(|(_, n)| n.prop(property)),
            ),
            Statement::NodeName { id } => self
                .live_nodes()
                .filter(|(_, n)| n.has_id(id))
                .map(|(_, n)| Row::new().with("name", n.prop("name")))
                .collect(),
            Statement::RelationshipPropertyValue {
                id1,
                id2,
                rel_type,
                property,
            } => distinct(
                "value",
                self.live_edges()
                    .filter(|(_, e)| {
                        e.rel_type == *rel_type
                            && ((self.node_id_matches(e.src, id1)
                                && self.node_id_matches(e.dst, id2))
                                || (self.node_id_matches(e.src, id2)
                                    && self.node_id_matches(e.dst, id1)))
                    })
                    .map(|(_, e)| e.props.get(property).cloned().unwrap_or(Value::Null)),
            ),
            Statement::PeerNames { id, rel_type } => distinct(
                "name",
                self.live_edges()
                    .filter(|(_, e)| e.rel_type == *rel_type && self.node_id_matches(e.src, id))
                    .map(|(_, e)| self.node_prop(e.dst, "name")),
            ),
            Statement::PeerIds { id, rel_type, name } => distinct(
                "ID",
                self.live_edges()
                    .filter(|(_, e)| {
                        e.rel_type == *rel_type
                            && self.node_id_matches(e.src, id)
                            && self.node(e.dst).is_some_and(|n| n.has_name(name))
                    })
                    .map(|(_, e)| self.node_prop(e.dst, "ID")),
            ),
            Statement::OneHop { id } => {
                let mut rows = Vec::new();
                for center in self.nodes_with_id(id) {
                    for (_, edge) in self.live_edges() {
                        if let Some(peer) = edge.other(center) {
                            rows.push(
                                Row::new()
                                    .with("peer_id", self.node_prop(peer, "ID"))
                                    .with("peer_name", self.node_prop(peer, "name"))
                                    .with("rel_type", edge.rel_type.clone()),
                            );
                        }
                    }
                }
                rows
            }
            Statement::TwoHop { id } => {
                let mut rows = Vec::new();
                for center in self.nodes_with_id(id) {
                    for (first_idx, first) in self.live_edges() {
                        let Some(mid) = first.other(center) else {
                            continue;
                        };
                        for (second_idx, second) in self.live_edges() {
                            if second_idx == first_idx {
                                continue;
                            }
                            if let Some(end) = second.other(mid) {
                                rows.push(
                                    Row::new()
                                        .with("mid_id", self.node_prop(mid, "ID"))
                                        .with("mid_name", self.node_prop(mid, "name"))
                                        .with("end_id", self.node_prop(end, "ID"))
                                        .with("end_name", self.node_prop(end, "name"))
                                        .with("rel_type", second.rel_type.clone()),
                                );
                            }
                        }
                    }
                }
                rows
            }
            Statement::AllNodes => self
                .live_nodes()
                .map(|(_, n)| {
                    let labels = n.labels.iter().cloned().map(Value::String).collect();
                    Row::new()
                        .with("id", n.prop("ID"))
                        .with("name", n.prop("name"))
                        .with("labels", Value::List(labels))
                })
                .collect(),
            Statement::AllRelationships => self
                .live_edges()
                .map(|(_, e)| {
                    Row::new()
                        .with("source_id", self.node_prop(e.src, "ID"))
                        .with("target_id", self.node_prop(e.dst, "ID"))
                        .with("rel_type", e.rel_type.clone())
                })
                .collect(),
            Statement::OutgoingCount { id } => {
                let degree = self
                    .live_edges()
                    .filter(|(_, e)| self.node_id_matches(e.src, id))
                    .count();
                vec![Row::new().with("degree", degree as i64)]
            }
            Statement::IncomingCount { id } => {
                let degree = self
                    .live_edges()
                    .filter(|(_, e)| self.node_id_matches(e.dst, id))
                    .count();
                vec![Row::new().with("degree", degree as i64)]
            }
            Statement::CreateNode {
                node_type,
                properties,
            } => {
                let mut props = BTreeMap::new();
                assign(&mut props, properties);
                self.nodes.push(Some(MemNode {
                    labels: vec![node_type.clone()],
                    props,
                }));
                Vec::new()
            }
            Statement::CreateRelationship {
                id1,
                id2,
                rel_type,
                properties,
            } => {
                let sources: Vec<usize> = self.nodes_with_id(id1).collect();
                let targets: Vec<usize> = self.nodes_with_id(id2).collect();
                for &src in &sources {
                    for &dst in &targets {
                        let mut props = BTreeMap::new();
                        assign(&mut props, properties);
                        self.edges.push(Some(MemEdge {
                            src,
                            dst,
                            rel_type: rel_type.clone(),
                            props,
                        }));
                    }
                }
                Vec::new()
            }
            Statement::SetNodeProperties { id, properties } => {
                let targets: Vec<usize> = self.nodes_with_id(id).collect();
                for idx in targets {
                    if let Some(Some(node)) = self.nodes.get_mut(idx) {
                        assign(&mut node.props, properties);
                    }
                }
                Vec::new()
            }
            Statement::SetRelationshipProperties {
                id1,
                id2,
                rel_type,
                properties,
            } => {
                let targets: Vec<usize> = self.directed_edges(id1, id2, rel_type).collect();
                for idx in targets {
                    if let Some(Some(edge)) = self.edges.get_mut(idx) {
                        assign(&mut edge.props, properties);
                    }
                }
                Vec::new()
            }
            Statement::DeleteNode { id } => {
                let targets: Vec<usize> = self.nodes_with_id(id).collect();
                let attached = self
                    .live_edges()
                    .any(|(_, e)| targets.contains(&e.src) || targets.contains(&e.dst));
                if attached {
                    return Err(SessionError::execution(
                        query,
                        "cannot delete a node that still has relationships",
                    ));
                }
                for idx in targets {
                    self.nodes[idx] = None;
                }
                Vec::new()
            }
            Statement::DeleteRelationship { id1, id2, rel_type } => {
                let targets: Vec<usize> = self.directed_edges(id1, id2, rel_type).collect();
                for idx in targets {
                    self.edges[idx] = None;
                }
                Vec::new()
            }
        };
        Ok(rows)
    }
}

/// `SET x.k = null` removes the key.
fn assign(props: &mut BTreeMap<String, Value>, assignments: &Assignments) {
    for (key, value) in assignments {
        if value.is_null() {
            props.remove(key);
        } else {
            props.insert(key.clone(), value.clone());
        }
    }
}

fn distinct(column: &str, values: impl Iterator<Item = Value>) -> Vec<Row> {
    let mut seen: Vec<Value> = Vec::new();
    for value in values {
        if !seen.contains(&value) {
            seen.push(value);
        }
    }
    seen.into_iter()
        .map(|value| Row::new().with(column, value))
        .collect()
}

impl GraphSession for MemoryGraph {
    fn run(&mut self, query: &Query) -> Result<Vec<Row>, SessionError> {
        debug!(statement = query.text(), "session.memory.run");
        self.statements += 1;
        if let Some(captured) = self.captured.as_mut() {
            captured.push(query.clone());
        }
        match self.failure.take() {
            Some((0, reason)) => return Err(SessionError::execution(query, reason)),
            Some((n, reason)) => self.failure = Some((n - 1, reason)),
            None => {}
        }
        self.execute(query)
    }
}

/// Handle shared between a connector and the sessions it hands out.
pub type SharedGraph = Rc<RefCell<MemoryGraph>>;

struct MemorySession {
    graph: SharedGraph,
}

impl GraphSession for MemorySession {
    fn run(&mut self, query: &Query) -> Result<Vec<Row>, SessionError> {
        self.graph.borrow_mut().run(query)
    }
}

/// Hands out sessions over one in-memory graph per target URI. Graphs outlive
/// sessions, so reconnecting to a URI sees earlier writes.
#[derive(Default)]
pub struct MemoryConnector {
    graphs: HashMap<String, SharedGraph>,
    require_credentials: bool,
    capture: bool,
}

impl MemoryConnector {
    /// Connector that accepts any credentials.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects connections made with empty credentials, like a store with
    /// authentication enabled.
    pub fn requiring_credentials(mut self) -> Self {
        self.require_credentials = true;
        self
    }

    /// Graphs created from now on keep a copy of every query.
    pub fn capturing(mut self) -> Self {
        self.capture = true;
        self
    }

    /// Graph behind `uri`, created on first use.
    pub fn graph(&mut self, uri: &str) -> SharedGraph {
        let capture = self.capture;
        self.graphs
            .entry(uri.to_owned())
            .or_insert_with(|| {
                let graph = if capture {
                    MemoryGraph::capturing()
                } else {
                    MemoryGraph::new()
                };
                Rc::new(RefCell::new(graph))
            })
            .clone()
    }
}

impl Connector for MemoryConnector {
    fn connect(
        &mut self,
        target: &DatabaseTarget,
        credentials: &Credentials,
    ) -> Result<Box<dyn GraphSession>, SessionError> {
        if self.require_credentials && credentials.is_empty() {
            return Err(SessionError::Connect {
                target: target.uri.clone(),
                reason: "authentication required".into(),
            });
        }
        let graph = self.graph(&target.uri);
        Ok(Box::new(MemorySession { graph }))
    }
}
