//! One interactive editing session against one database.
//!
//! [`Workspace`] owns the open gateway session, the schema snapshot, the ID
//! allocator, the selection state and the two staged edit lists, and
//! sequences them for each user action. Every completed action leaves one
//! line in the [`StatusLog`].

use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::browse::Browser;
use crate::config::{EditorConfig, SchemaFiles};
use crate::error::{GraphFormError, Result};
use crate::ids::IdAllocator;
use crate::import::{self, ImportSummary};
use crate::model::is_placeholder;
use crate::query::{builder, Query, Value};
use crate::schema::{load_folder, SchemaSnapshot};
use crate::selection::{Field, SelectionState};
use crate::session::{Connector, Credentials, DatabaseTarget, GraphSession, Row, SessionError};
use crate::staging::{CommitTarget, EditKind, PendingEdits, PropertyEditor};
use crate::status::{StatusLog, StatusSink};
use crate::view::{self, GraphView, Neighborhood};

/// Stand-in while no store is connected.
struct Disconnected;

impl GraphSession for Disconnected {
    fn run(&mut self, _query: &Query) -> std::result::Result<Vec<Row>, SessionError> {
        Err(SessionError::Connect {
            target: String::new(),
            reason: "no database open".into(),
        })
    }
}

/// Which node of the selection a property edit applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeSlot {
    /// The current node (`NodeType`/`NodeId`).
    Current,
    /// Target of the viewed relationship (`Node2Type`/`Node2Id`).
    Node2,
    /// Target of the relationship being created
    /// (`CreateNode2Type`/`CreateNode2Id`).
    CreateNode2,
}

impl NodeSlot {
    fn fields(self) -> (Field, Field) {
        match self {
            NodeSlot::Current => (Field::NodeType, Field::NodeId),
            NodeSlot::Node2 => (Field::Node2Type, Field::Node2Id),
            NodeSlot::CreateNode2 => (Field::CreateNode2Type, Field::CreateNode2Id),
        }
    }
}

/// Editing session state for one database.
pub struct Workspace {
    session: Box<dyn GraphSession>,
    target: DatabaseTarget,
    files: SchemaFiles,
    schema: Arc<SchemaSnapshot>,
    ids: IdAllocator,
    selection: SelectionState,
    node_edits: PendingEdits,
    relationship_edits: PendingEdits,
    status: StatusLog,
}

impl Workspace {
    /// Connects to `target`, loads its schema, seeds the ID allocator and
    /// builds the initial selection state.
    pub fn open(
        connector: &mut dyn Connector,
        target: DatabaseTarget,
        credentials: &Credentials,
        files: SchemaFiles,
    ) -> Result<Self> {
        let mut workspace = Self {
            session: Box::new(Disconnected),
            target: target.clone(),
            files,
            schema: Arc::default(),
            ids: IdAllocator::new(),
            selection: SelectionState::default(),
            node_edits: PendingEdits::new(),
            relationship_edits: PendingEdits::new(),
            status: StatusLog::new(),
        };
        workspace.switch(connector, target, credentials)?;
        Ok(workspace)
    }

    /// Opens `folder` using the URI, credential file and schema file names
    /// from `config`.
    pub fn open_with_config(
        connector: &mut dyn Connector,
        config: &EditorConfig,
        folder: &Path,
    ) -> Result<Self> {
        let credentials = match config.credentials_path() {
            Some(path) => Credentials::load(path)?,
            None => Credentials::default(),
        };
        Self::open(
            connector,
            config.target(folder),
            &credentials,
            config.schema_files().clone(),
        )
    }

    /// Switches to another database. The current session is dropped before
    /// the new one is connected; staged edits are discarded.
    pub fn switch(
        &mut self,
        connector: &mut dyn Connector,
        target: DatabaseTarget,
        credentials: &Credentials,
    ) -> Result<()> {
        self.session = Box::new(Disconnected);
        self.node_edits.clear();
        self.relationship_edits.clear();

        let mut session = connector.connect(&target, credentials)?;
        let schema = Arc::new(load_folder(&target.folder, &self.files)?);
        let ids = IdAllocator::seed(&session.run(&builder::all_ids())?);
        let selection = SelectionState::initial(&mut Browser::new(&schema, session.as_mut()))?;

        info!(uri = %target.uri, ids = ids.len(), "workspace.opened");
        self.status
            .append(format!("Opened database {}", target.folder.display()));
        self.session = session;
        self.schema = schema;
        self.ids = ids;
        self.selection = selection;
        self.target = target;
        Ok(())
    }

    /// Current target.
    pub fn target(&self) -> &DatabaseTarget {
        &self.target
    }

    /// Current schema snapshot.
    pub fn schema(&self) -> &SchemaSnapshot {
        &self.schema
    }

    /// Shared handle to the current schema snapshot.
    pub fn shared_schema(&self) -> Arc<SchemaSnapshot> {
        Arc::clone(&self.schema)
    }

    /// Current selection state.
    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    /// ID allocator.
    pub fn ids(&self) -> &IdAllocator {
        &self.ids
    }

    /// Staged edits for the node being created.
    pub fn node_edits(&self) -> &PendingEdits {
        &self.node_edits
    }

    /// Staged edits for the relationship being created.
    pub fn relationship_edits(&self) -> &PendingEdits {
        &self.relationship_edits
    }

    /// Status log.
    pub fn status(&self) -> &StatusLog {
        &self.status
    }

    /// The open session.
    pub fn session(&mut self) -> &mut dyn GraphSession {
        self.session.as_mut()
    }

    /// Selects `value` for `field` and recomputes its dependents.
    pub fn select(&mut self, field: Field, value: &str) -> Result<()> {
        let mut browser = Browser::new(&self.schema, self.session.as_mut());
        self.selection = self.selection.select(field, value, &mut browser)?;
        Ok(())
    }

    /// Re-derives `field` and its dependents, keeping choices still offered.
    pub fn refresh(&mut self, field: Field) -> Result<()> {
        let mut browser = Browser::new(&self.schema, self.session.as_mut());
        self.selection = self.selection.refresh(field, &mut browser)?;
        Ok(())
    }

    fn selected(&self, field: Field) -> String {
        self.selection.selected(field).to_owned()
    }

    /// Re-derives the selection after a write the store already accepted. A
    /// failure here is reported on the status log; the write stands.
    fn refresh_after_write(&mut self) {
        if let Err(err) = self.refresh(Field::NodeType) {
            warn!(error = %err, "workspace.refresh.failed");
            self.status
                .append(format!("Write applied, but reloading the selection failed: {err}"));
        }
    }

    /// Stages a property for the node being created. A property the schema
    /// does not declare for the new node's type is added to a new snapshot.
    pub fn stage_node_edit(&mut self, property: &str, value: &str) -> Result<()> {
        self.node_edits.add_edit(property, value)?;
        let node_type = self.selected(Field::NewNodeType);
        if !is_placeholder(&node_type) && !self.schema.property_types(&node_type).contains(property)
        {
            self.schema = Arc::new(self.schema.with_node_property(&node_type, property));
            info!(node_type = %node_type, property, "workspace.schema.extended");
            self.refresh(Field::NewNodeProperty)?;
        }
        Ok(())
    }

    /// Stages a property for the relationship being created.
    pub fn stage_relationship_edit(&mut self, property: &str, value: &str) -> Result<()> {
        self.relationship_edits.add_edit(property, value)?;
        let rel_type = self.selected(Field::CreateRelationship);
        if !is_placeholder(&rel_type)
            && !self.schema.relationship_properties(&rel_type).contains(property)
        {
            self.schema = Arc::new(self.schema.with_relationship_property(&rel_type, property));
            info!(rel_type = %rel_type, property, "workspace.schema.extended");
            self.refresh(Field::RelationshipProperty)?;
            self.refresh(Field::CreateRelationshipProperty)?;
        }
        Ok(())
    }

    /// Opens `editor` over every declared property of the new node's type.
    /// Returns `false` if the user cancelled.
    pub fn stage_all_node_edits(&mut self, editor: &mut dyn PropertyEditor) -> bool {
        let node_type = self.selected(Field::NewNodeType);
        let properties = self.schema.property_types(&node_type);
        self.node_edits
            .add_all_edits(EditKind::Node, &node_type, properties.as_slice(), editor)
    }

    /// Relationship counterpart of [`Workspace::stage_all_node_edits`].
    pub fn stage_all_relationship_edits(&mut self, editor: &mut dyn PropertyEditor) -> bool {
        let rel_type = self.selected(Field::CreateRelationship);
        let properties = self.schema.relationship_properties(&rel_type);
        self.relationship_edits.add_all_edits(
            EditKind::Relationship,
            &rel_type,
            properties.as_slice(),
            editor,
        )
    }

    /// Drops the node edits.
    pub fn clear_node_edits(&mut self) {
        self.node_edits.clear();
    }

    /// Drops the relationship edits.
    pub fn clear_relationship_edits(&mut self) {
        self.relationship_edits.clear();
    }

    /// Creates a node of the selected new-node type from the staged edits.
    /// Returns the allocated ID.
    pub fn create_node(&mut self) -> Result<String> {
        let node_type = self.selected(Field::NewNodeType);
        let committed = self.node_edits.commit(
            &CommitTarget::NewNode {
                node_type: node_type.clone(),
            },
            self.session.as_mut(),
            &mut self.ids,
        )?;
        let id = committed.node_id.unwrap_or_default();
        info!(node_type = %node_type, id = %id, "workspace.node.created");
        self.status.append(format!("Created node: {}", committed.query));
        self.refresh_after_write();
        Ok(id)
    }

    /// Creates a relationship from the current node to the selected target
    /// of the creation chain, using the staged relationship edits.
    pub fn create_relationship(&mut self) -> Result<()> {
        let target = CommitTarget::NewRelationship {
            id1: self.selected(Field::NodeId),
            id2: self.selected(Field::CreateNode2Id),
            rel_type: self.selected(Field::CreateRelationship),
        };
        let committed =
            self.relationship_edits
                .commit(&target, self.session.as_mut(), &mut self.ids)?;
        info!("workspace.relationship.created");
        self.status
            .append(format!("Created relationship: {}", committed.query));
        self.refresh_after_write();
        Ok(())
    }

    /// Sets one property on the current node.
    pub fn set_node_property(&mut self, property: &str, value: &str) -> Result<()> {
        let mut edits = PendingEdits::new();
        edits.add_edit(property, value)?;
        let target = CommitTarget::ExistingNode {
            id: self.selected(Field::NodeId),
        };
        let committed = edits.commit(&target, self.session.as_mut(), &mut self.ids)?;
        self.status
            .append(format!("Updated node property: {}", committed.query));
        self.refresh_after_write();
        Ok(())
    }

    /// Opens `editor` over the properties of the node in `slot` (declared
    /// ones first, then any others present) with their current values, and
    /// writes every returned value back as one SET. An emptied field removes
    /// its property. Returns `false` if the user cancelled.
    pub fn edit_node_properties(
        &mut self,
        slot: NodeSlot,
        editor: &mut dyn PropertyEditor,
    ) -> Result<bool> {
        let (type_field, id_field) = slot.fields();
        let id = self.selected(id_field);
        if is_placeholder(&id) {
            return Err(GraphFormError::no_selection(id_field.name()));
        }
        let node_type = self.selected(type_field);
        let mut properties: Vec<String> = self
            .schema
            .property_types(&node_type)
            .iter()
            .filter(|p| !is_placeholder(p))
            .cloned()
            .collect();
        let mut edits = PendingEdits::new();
        {
            let mut browser = Browser::new(&self.schema, self.session.as_mut());
            for present in browser.property_names(&id)?.iter() {
                if !is_placeholder(present) && !properties.contains(present) {
                    properties.push(present.clone());
                }
            }
            for property in &properties {
                let current = browser.property_value(property, &id)?;
                if !current.is_placeholder() {
                    edits.add_edit(property, current.first())?;
                }
            }
        }
        if !edits.replace_all_edits(EditKind::Node, &node_type, &properties, editor) {
            return Ok(false);
        }
        if edits.is_empty() {
            self.status
                .append(format!("No properties to update on node {id}"));
            return Ok(true);
        }
        let committed = edits.commit(
            &CommitTarget::ExistingNode { id },
            self.session.as_mut(),
            &mut self.ids,
        )?;
        self.status
            .append(format!("Updated node properties: {}", committed.query));
        self.refresh_after_write();
        Ok(true)
    }

    /// Opens `editor` over the declared properties of the current
    /// relationship with their current values, and writes every returned
    /// value back as one SET. Returns `false` if the user cancelled.
    pub fn edit_relationship_properties(
        &mut self,
        editor: &mut dyn PropertyEditor,
    ) -> Result<bool> {
        let id1 = self.selected(Field::NodeId);
        let id2 = self.selected(Field::Node2Id);
        let rel_type = self.selected(Field::Relationship);
        for (field, value) in [
            (Field::NodeId, &id1),
            (Field::Node2Id, &id2),
            (Field::Relationship, &rel_type),
        ] {
            if is_placeholder(value) {
                return Err(GraphFormError::no_selection(field.name()));
            }
        }
        let properties: Vec<String> = self
            .schema
            .relationship_properties(&rel_type)
            .iter()
            .filter(|p| !is_placeholder(p))
            .cloned()
            .collect();
        let mut edits = PendingEdits::new();
        {
            let mut browser = Browser::new(&self.schema, self.session.as_mut());
            for property in &properties {
                let current = browser.relationship_property_value(&id1, &id2, &rel_type, property)?;
                if !current.is_placeholder() {
                    edits.add_edit(property, current.first())?;
                }
            }
        }
        if !edits.replace_all_edits(EditKind::Relationship, &rel_type, &properties, editor) {
            return Ok(false);
        }
        if edits.is_empty() {
            self.status.append(format!(
                "No properties to update on relationship {id1} -[{rel_type}]-> {id2}"
            ));
            return Ok(true);
        }
        let committed = edits.commit(
            &CommitTarget::ExistingRelationship { id1, id2, rel_type },
            self.session.as_mut(),
            &mut self.ids,
        )?;
        self.status
            .append(format!("Updated relationship properties: {}", committed.query));
        self.refresh_after_write();
        Ok(true)
    }

    fn count(&mut self, query: Query) -> Result<u64> {
        let rows = self.session.run(&query)?;
        Ok(rows
            .first()
            .and_then(|row| row.get("degree"))
            .and_then(Value::as_int)
            .map_or(0, |n| n.max(0) as u64))
    }

    /// Deletes the current node. Refused while it has any incoming or
    /// outgoing relationship.
    pub fn delete_node(&mut self) -> Result<()> {
        let id = self.selected(Field::NodeId);
        let outgoing = self.count(builder::outgoing_count(&id)?)?;
        let incoming = self.count(builder::incoming_count(&id)?)?;
        if outgoing > 0 || incoming > 0 {
            self.status.append(format!(
                "Cannot delete node {id}: remove its {outgoing} outgoing and {incoming} incoming relationships first"
            ));
            return Err(GraphFormError::DeleteBlocked {
                id,
                outgoing,
                incoming,
            });
        }
        let query = builder::delete_node(&id)?;
        self.session.run(&query)?;
        info!(id = %id, "workspace.node.deleted");
        self.status.append(format!("Deleted node: {query}"));
        self.refresh_after_write();
        Ok(())
    }

    /// Deletes the current relationship: current node to node 2 over the
    /// selected relationship type.
    pub fn delete_relationship(&mut self) -> Result<()> {
        let query = builder::delete_relationship(
            self.selection.selected(Field::NodeId),
            self.selection.selected(Field::Node2Id),
            self.selection.selected(Field::Relationship),
        )?;
        self.session.run(&query)?;
        info!("workspace.relationship.deleted");
        self.status.append(format!("Deleted relationship: {query}"));
        self.refresh_after_write();
        Ok(())
    }

    /// Neighborhood of the current node.
    pub fn neighborhood(&mut self) -> Result<Neighborhood> {
        let id = self.selected(Field::NodeId);
        view::neighborhood(self.session.as_mut(), &id)
    }

    /// Renderable neighborhood of the current node.
    pub fn neighborhood_view(&mut self) -> Result<GraphView> {
        Ok(GraphView::from(&self.neighborhood()?))
    }

    /// Renderable whole graph.
    pub fn whole_graph_view(&mut self) -> Result<GraphView> {
        Ok(GraphView::from(&view::whole_graph(self.session.as_mut())?))
    }

    /// Bulk-imports nodes from `path`.
    pub fn import_nodes(&mut self, path: &Path) -> Result<ImportSummary> {
        let summary = import::import_nodes(path, self.session.as_mut(), &mut self.ids)?;
        self.status.append(format!(
            "Imported {} nodes from {} ({} rows skipped)",
            summary.imported,
            path.display(),
            summary.skipped
        ));
        self.refresh_after_write();
        Ok(summary)
    }

    /// Bulk-imports relationships from `path`.
    pub fn import_relationships(&mut self, path: &Path) -> Result<ImportSummary> {
        let summary = import::import_relationships(path, self.session.as_mut())?;
        self.status.append(format!(
            "Imported {} relationships from {} ({} rows skipped)",
            summary.imported,
            path.display(),
            summary.skipped
        ));
        self.refresh_after_write();
        Ok(summary)
    }
}
