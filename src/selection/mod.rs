#![forbid(unsafe_code)]

//! Cascading selection state.
//!
//! Every control of the editor is a [`Field`] with a candidate list and a
//! current selection. Fields depend on earlier fields (see [`Field::deps`]);
//! the declaration order of [`Field`] is a topological order of that graph,
//! so one forward pass recomputes everything downstream of a change.
//!
//! Transitions never mutate in place: [`SelectionState::select`] and
//! [`SelectionState::refresh`] return a new state and leave the receiver
//! untouched when the store fails midway.

use serde::Serialize;
use tracing::debug;

use crate::browse::Browser;
use crate::error::{GraphFormError, Result};
use crate::model::{is_placeholder, Candidates, PLACEHOLDER};

/// Number of selection fields.
pub const FIELD_COUNT: usize = 18;

/// One selection control, in dependency order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Field {
    /// Type of the current node.
    NodeType,
    /// Name of the current node.
    NodeName,
    /// ID of the current node.
    NodeId,
    /// Property of the current node.
    Property,
    /// Value of that property.
    PropertyValue,
    /// Existing relationship type from the current node.
    Relationship,
    /// Property of that relationship type.
    RelationshipProperty,
    /// Target type of that relationship.
    Node2Type,
    /// Name of the relationship's target node.
    Node2Name,
    /// ID of the relationship's target node.
    Node2Id,
    /// Value of the selected relationship property.
    RelationshipValue,
    /// Relationship type to create from the current node.
    CreateRelationship,
    /// Property of the relationship being created.
    CreateRelationshipProperty,
    /// Target type of the relationship being created.
    CreateNode2Type,
    /// Target name of the relationship being created.
    CreateNode2Name,
    /// Target ID of the relationship being created.
    CreateNode2Id,
    /// Type of the node being created.
    NewNodeType,
    /// Property of the node being created.
    NewNodeProperty,
}

impl Field {
    /// All fields in dependency order.
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::NodeType,
        Field::NodeName,
        Field::NodeId,
        Field::Property,
        Field::PropertyValue,
        Field::Relationship,
        Field::RelationshipProperty,
        Field::Node2Type,
        Field::Node2Name,
        Field::Node2Id,
        Field::RelationshipValue,
        Field::CreateRelationship,
        Field::CreateRelationshipProperty,
        Field::CreateNode2Type,
        Field::CreateNode2Name,
        Field::CreateNode2Id,
        Field::NewNodeType,
        Field::NewNodeProperty,
    ];

    /// Position in [`Field::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Fields this one is derived from. Empty means schema only.
    pub fn deps(self) -> &'static [Field] {
        use Field::*;
        match self {
            NodeType | NewNodeType => &[],
            NodeName | Relationship | CreateRelationship => &[NodeType],
            NodeId => &[NodeType, NodeName],
            Property => &[NodeId],
            PropertyValue => &[NodeId, Property],
            RelationshipProperty | Node2Type => &[Relationship],
            Node2Name => &[NodeId, Relationship],
            Node2Id => &[NodeId, Relationship, Node2Name],
            RelationshipValue => &[NodeId, Node2Id, Relationship, RelationshipProperty],
            CreateRelationshipProperty | CreateNode2Type => &[CreateRelationship],
            CreateNode2Name => &[CreateNode2Type],
            CreateNode2Id => &[CreateNode2Type, CreateNode2Name],
            NewNodeProperty => &[NewNodeType],
        }
    }

    /// Human-readable name used in errors and logs.
    pub fn name(self) -> &'static str {
        use Field::*;
        match self {
            NodeType => "node type",
            NodeName => "node name",
            NodeId => "node ID",
            Property => "property",
            PropertyValue => "property value",
            Relationship => "relationship",
            RelationshipProperty => "relationship property",
            Node2Type => "node 2 type",
            Node2Name => "node 2 name",
            Node2Id => "node 2 ID",
            RelationshipValue => "relationship value",
            CreateRelationship => "new relationship type",
            CreateRelationshipProperty => "new relationship property",
            CreateNode2Type => "new relationship target type",
            CreateNode2Name => "new relationship target name",
            CreateNode2Id => "new relationship target ID",
            NewNodeType => "new node type",
            NewNodeProperty => "new node property",
        }
    }
}

/// Produces the candidate list of a field from the selections it depends on.
pub trait CandidateSource {
    /// Candidates for `field` given the (already updated) upstream selections
    /// in `state`.
    fn derive(&mut self, field: Field, state: &SelectionState) -> Result<Candidates>;
}

impl CandidateSource for Browser<'_> {
    fn derive(&mut self, field: Field, state: &SelectionState) -> Result<Candidates> {
        use Field::*;
        let s = move |f: Field| state.selected(f);
        match field {
            NodeType | NewNodeType => Ok(self.node_types()),
            NodeName => self.node_names(s(NodeType)),
            NodeId => self.node_ids(s(NodeType), s(NodeName)),
            Property => self.property_names(s(NodeId)),
            PropertyValue => self.property_value(s(Property), s(NodeId)),
            Relationship | CreateRelationship => Ok(self.relationship_types(s(NodeType))),
            RelationshipProperty => Ok(self.relationship_property_names(s(Relationship))),
            Node2Type => Ok(self.node2_types(s(Relationship))),
            Node2Name => self.node2_names(s(NodeId), s(Relationship)),
            Node2Id => self.node2_ids(s(NodeId), s(Relationship), s(Node2Name)),
            RelationshipValue => self.relationship_property_value(
                s(NodeId),
                s(Node2Id),
                s(Relationship),
                s(RelationshipProperty),
            ),
            CreateRelationshipProperty => {
                Ok(self.relationship_property_names(s(CreateRelationship)))
            }
            CreateNode2Type => Ok(self.node2_types(s(CreateRelationship))),
            CreateNode2Name => self.node_names(s(CreateNode2Type)),
            CreateNode2Id => self.node_ids(s(CreateNode2Type), s(CreateNode2Name)),
            NewNodeProperty => Ok(self.schema().property_types(s(NewNodeType))),
        }
    }
}

/// Candidate list and current choice of one field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Slot {
    /// Offered values; never empty.
    pub candidates: Candidates,
    /// Current choice: a candidate or the placeholder.
    pub selected: String,
}

impl Default for Slot {
    fn default() -> Self {
        Self {
            candidates: Candidates::placeholder(),
            selected: PLACEHOLDER.to_owned(),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Retain {
    /// Dependents jump to their first candidate.
    First,
    /// Dependents keep their choice while it is still offered.
    Current,
}

/// Consistent snapshot of every field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectionState {
    slots: Vec<Slot>,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            slots: vec![Slot::default(); FIELD_COUNT],
        }
    }
}

impl SelectionState {
    /// Derives every field from scratch, selecting first candidates.
    pub fn initial(source: &mut dyn CandidateSource) -> Result<Self> {
        let mut state = Self::default();
        for field in Field::ALL {
            let candidates = source.derive(field, &state)?;
            let selected = candidates.first().to_owned();
            state.slots[field.index()] = Slot {
                candidates,
                selected,
            };
        }
        debug!("selection.initialized");
        Ok(state)
    }

    /// Current choice of `field`.
    pub fn selected(&self, field: Field) -> &str {
        &self.slots[field.index()].selected
    }

    /// Candidate list of `field`.
    pub fn candidates(&self, field: Field) -> &Candidates {
        &self.slots[field.index()].candidates
    }

    /// Slot of `field`.
    pub fn slot(&self, field: Field) -> &Slot {
        &self.slots[field.index()]
    }

    /// Returns `true` if `field` currently holds the placeholder.
    pub fn is_unset(&self, field: Field) -> bool {
        is_placeholder(self.selected(field))
    }

    /// Selects `value` for `field` and recomputes every dependent field,
    /// each falling back to its first candidate.
    ///
    /// `value` must be one of the field's candidates or the placeholder.
    pub fn select(
        &self,
        field: Field,
        value: &str,
        source: &mut dyn CandidateSource,
    ) -> Result<Self> {
        if !is_placeholder(value) && !self.candidates(field).contains(value) {
            return Err(GraphFormError::InvalidSelection {
                field: field.name(),
                value: value.to_owned(),
            });
        }
        let mut next = self.clone();
        next.slots[field.index()].selected = value.to_owned();
        debug!(field = field.name(), value, "selection.changed");
        next.cascade(field, false, Retain::First, source)
    }

    /// Re-derives `field` and its dependents after the store changed. Each
    /// keeps its choice while that is still a candidate.
    pub fn refresh(&self, field: Field, source: &mut dyn CandidateSource) -> Result<Self> {
        self.clone().cascade(field, true, Retain::Current, source)
    }

    fn cascade(
        mut self,
        from: Field,
        include_from: bool,
        retain: Retain,
        source: &mut dyn CandidateSource,
    ) -> Result<Self> {
        let mut dirty = [false; FIELD_COUNT];
        dirty[from.index()] = true;
        for field in &Field::ALL[from.index()..] {
            let field = *field;
            let stale = (include_from && field == from)
                || field.deps().iter().any(|dep| dirty[dep.index()]);
            if !stale {
                continue;
            }
            let candidates = source.derive(field, &self)?;
            let slot = &mut self.slots[field.index()];
            let keep = retain == Retain::Current && candidates.contains(&slot.selected);
            let selected = if keep {
                slot.selected.clone()
            } else {
                candidates.first().to_owned()
            };
            *slot = Slot {
                candidates,
                selected,
            };
            dirty[field.index()] = true;
        }
        Ok(self)
    }
}
