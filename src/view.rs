//! Neighborhood and whole-graph fetches, and the [`GraphView`] hand-off value
//! consumed by renderers.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::model::{EdgeRecord, NeighborRow, NodeRecord, TwoHopRow};
use crate::query::{builder, decode, Query, Value};
use crate::session::GraphSession;

/// Nodes within two hops of a center node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Neighborhood {
    /// Center node ID.
    pub center_id: String,
    /// Center node name.
    pub center_name: String,
    /// Direct peers.
    pub one_hop: Vec<NeighborRow>,
    /// Relationships one hop further out.
    pub two_hop: Vec<TwoHopRow>,
}

/// Whole node and relationship population.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WholeGraph {
    /// Every node.
    pub nodes: Vec<NodeRecord>,
    /// Every relationship.
    pub relationships: Vec<EdgeRecord>,
}

fn fetch(session: &mut dyn GraphSession, query: &Query) -> Result<Vec<Value>> {
    debug!(statement = query.text(), "view.fetch");
    let rows = session.run(query)?;
    Ok(decode::flatten(&rows, query.columns())?)
}

/// Fetches the 1-hop and 2-hop neighborhood of node `id`. A placeholder ID
/// yields an empty neighborhood without contacting the store.
pub fn neighborhood(session: &mut dyn GraphSession, id: &str) -> Result<Neighborhood> {
    let (Some(name_query), Some(one_query), Some(two_query)) = (
        builder::node_name(id),
        builder::one_hop(id),
        builder::two_hop(id),
    ) else {
        return Ok(Neighborhood::default());
    };
    let center_name = fetch(session, &name_query)?
        .first()
        .map(|v| v.to_text().trim().to_owned())
        .unwrap_or_default();
    let one_hop = decode::one_hop(&fetch(session, &one_query)?)?;
    let two_hop = decode::two_hop(&fetch(session, &two_query)?)?;
    Ok(Neighborhood {
        center_id: id.to_owned(),
        center_name,
        one_hop,
        two_hop,
    })
}

/// Fetches every node and relationship.
pub fn whole_graph(session: &mut dyn GraphSession) -> Result<WholeGraph> {
    let nodes = decode::nodes(&fetch(session, &builder::all_nodes())?)?;
    let relationships =
        decode::relationships(&fetch(session, &builder::all_relationships())?)?;
    Ok(WholeGraph {
        nodes,
        relationships,
    })
}

/// A renderable node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewNode {
    /// Node ID.
    pub id: String,
    /// Display label: the node name, or the ID when unnamed.
    pub label: String,
    /// Node type, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// A renderable edge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ViewEdge {
    /// Source node ID.
    pub source_id: String,
    /// Target node ID.
    pub target_id: String,
    /// Relationship type.
    pub label: String,
}

/// Nodes and edges ready for a renderer. Node IDs are unique; an edge between
/// the same two nodes with the same label appears once regardless of
/// direction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct GraphView {
    /// Nodes in first-seen order.
    pub nodes: Vec<ViewNode>,
    /// Edges in first-seen order.
    pub edges: Vec<ViewEdge>,
    #[serde(skip)]
    seen_nodes: BTreeSet<String>,
    #[serde(skip)]
    seen_edges: BTreeSet<(String, String, String)>,
}

impl GraphView {
    /// Empty view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node unless its ID is already present or empty.
    pub fn add_node(&mut self, id: &str, name: &str, group: Option<&str>) {
        if id.is_empty() || !self.seen_nodes.insert(id.to_owned()) {
            return;
        }
        let label = if name.is_empty() { id } else { name };
        self.nodes.push(ViewNode {
            id: id.to_owned(),
            label: label.to_owned(),
            group: group.filter(|g| !g.is_empty()).map(str::to_owned),
        });
    }

    /// Adds an edge unless an equivalent one is already present.
    pub fn add_edge(&mut self, source_id: &str, target_id: &str, label: &str) {
        if source_id.is_empty() || target_id.is_empty() {
            return;
        }
        let (a, b) = if source_id <= target_id {
            (source_id, target_id)
        } else {
            (target_id, source_id)
        };
        if !self
            .seen_edges
            .insert((a.to_owned(), b.to_owned(), label.to_owned()))
        {
            return;
        }
        self.edges.push(ViewEdge {
            source_id: source_id.to_owned(),
            target_id: target_id.to_owned(),
            label: label.to_owned(),
        });
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

impl From<&Neighborhood> for GraphView {
    fn from(hood: &Neighborhood) -> Self {
        let mut view = GraphView::new();
        view.add_node(&hood.center_id, &hood.center_name, None);
        for row in &hood.one_hop {
            view.add_node(&row.peer_id, &row.peer_name, None);
            view.add_edge(&hood.center_id, &row.peer_id, &row.rel_type);
        }
        for row in &hood.two_hop {
            view.add_node(&row.mid_id, &row.mid_name, None);
            view.add_node(&row.end_id, &row.end_name, None);
            view.add_edge(&row.mid_id, &row.end_id, &row.rel_type);
        }
        view
    }
}

impl From<&WholeGraph> for GraphView {
    fn from(graph: &WholeGraph) -> Self {
        let mut view = GraphView::new();
        for node in &graph.nodes {
            view.add_node(&node.id, &node.name, Some(&node.label));
        }
        for rel in &graph.relationships {
            view.add_edge(&rel.source_id, &rel.target_id, &rel.rel_type);
        }
        view
    }
}
