use std::fs;
use std::sync::Once;

use graphform::config::SchemaFiles;
use graphform::query::{builder, Statement, Value};
use graphform::session::{Credentials, DatabaseTarget, MemoryConnector, SharedGraph};
use graphform::staging::{EditKind, PropertyEditor};
use graphform::workspace::NodeSlot;
use graphform::{Field, GraphFormError, GraphSession, Workspace, PLACEHOLDER};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("graphform=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_ansi(false)
            .try_init();
    });
}

struct Fixture {
    _dir: tempfile::TempDir,
    connector: MemoryConnector,
    target: DatabaseTarget,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("NodeProperties.csv"), "Person,name,age\n").expect("write");
        fs::write(dir.path().join("RelationshipProperties.csv"), "KNOWS,since\n").expect("write");
        fs::write(dir.path().join("NodeRelationships.csv"), "Person,KNOWS\n").expect("write");
        fs::write(dir.path().join("RelationshipNodes.csv"), "KNOWS,Person\n").expect("write");
        Self {
            target: DatabaseTarget::from_folder(dir.path()),
            _dir: dir,
            connector: MemoryConnector::new().capturing(),
        }
    }

    fn open(&mut self) -> Workspace {
        Workspace::open(
            &mut self.connector,
            self.target.clone(),
            &Credentials::default(),
            SchemaFiles::default(),
        )
        .expect("open")
    }

    fn graph(&mut self) -> SharedGraph {
        self.connector.graph(&self.target.uri)
    }
}

/// Answers every dialog with fixed values.
struct Answer(Option<Vec<&'static str>>, Vec<(String, String)>);

impl PropertyEditor for Answer {
    fn edit(
        &mut self,
        _kind: EditKind,
        _type_name: &str,
        fields: &[(String, String)],
    ) -> Option<Vec<String>> {
        self.1 = fields.to_vec();
        self.0
            .as_ref()
            .map(|values| values.iter().map(|v| v.to_string()).collect())
    }
}

fn create_person(ws: &mut Workspace, name: &str) -> String {
    ws.stage_node_edit("name", name).expect("stage");
    ws.create_node().expect("create")
}

#[test]
fn create_node_allocates_and_echoes() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    ws.stage_node_edit("name", "Alice").expect("stage");
    let id = ws.create_node().expect("create");
    assert_eq!(id, "1");
    assert!(ws.node_edits().is_empty());

    let graph = fx.graph();
    let graph = graph.borrow();
    let creates: Vec<_> = graph
        .executed()
        .iter()
        .filter(|q| matches!(q.statement(), Statement::CreateNode { .. }))
        .collect();
    assert_eq!(creates.len(), 1);
    let echo = creates[0].to_string();
    assert!(echo.contains("ID: '1'"), "{echo}");
    assert!(echo.contains("name: 'Alice'"), "{echo}");
    assert!(!creates[0].text().contains("Alice"));

    let status = ws.status().last().expect("status");
    assert!(status.starts_with("Created node"), "{status}");
}

#[test]
fn created_node_is_browsable() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    create_person(&mut ws, "Alice");
    assert_eq!(ws.selection().selected(Field::NodeName), "Alice");
    assert_eq!(ws.selection().selected(Field::NodeId), "1");
    assert_eq!(create_person(&mut ws, "Bob"), "2");
}

#[test]
fn staged_unknown_property_extends_schema_and_round_trips() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    let before = ws.shared_schema();
    ws.stage_node_edit("email", "a@example.org").expect("stage");
    assert!(ws.schema().property_types("Person").contains("email"));
    assert!(!before.property_types("Person").contains("email"));
    assert!(ws
        .selection()
        .candidates(Field::NewNodeProperty)
        .contains("email"));

    ws.stage_node_edit("name", "Alice").expect("stage");
    let id = ws.create_node().expect("create");
    ws.select(Field::Property, "email").expect("property");
    assert_eq!(ws.selection().selected(Field::NodeId), id);
    assert_eq!(ws.selection().selected(Field::PropertyValue), "a@example.org");
}

#[test]
fn node_creation_refused_on_non_numeric_ids() {
    let mut fx = Fixture::new();
    {
        let graph = fx.graph();
        let q = builder::create_node(
            "Person",
            vec![("ID".into(), "abc".into()), ("name".into(), "Odd".into())],
        )
        .expect("node");
        graph.borrow_mut().run(&q).expect("run");
    }
    let mut ws = fx.open();
    ws.stage_node_edit("name", "Alice").expect("stage");
    let err = ws.create_node().unwrap_err();
    assert!(matches!(err, GraphFormError::InvalidIdFormat { ref id } if id == "abc"));
    assert_eq!(ws.node_edits().edits().len(), 1);
    assert_eq!(fx.graph().borrow().node_count(), 1);
}

#[test]
fn relationship_lifecycle() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    create_person(&mut ws, "Alice");
    create_person(&mut ws, "Bob");

    ws.select(Field::NodeName, "Alice").expect("alice");
    ws.select(Field::CreateNode2Name, "Bob").expect("bob");
    ws.stage_relationship_edit("since", "2020").expect("stage");
    ws.create_relationship().expect("relate");
    assert!(ws.relationship_edits().is_empty());
    assert_eq!(fx.graph().borrow().relationship_count(), 1);

    ws.select(Field::NodeName, "Alice").expect("alice");
    assert_eq!(ws.selection().selected(Field::Node2Id), "2");
    assert_eq!(ws.selection().selected(Field::RelationshipValue), "2020");

    let err = ws.delete_node().unwrap_err();
    assert!(matches!(
        err,
        GraphFormError::DeleteBlocked { outgoing: 1, incoming: 0, .. }
    ));
    ws.select(Field::NodeName, "Bob").expect("bob");
    let err = ws.delete_node().unwrap_err();
    assert!(matches!(
        err,
        GraphFormError::DeleteBlocked { outgoing: 0, incoming: 1, .. }
    ));
    assert_eq!(fx.graph().borrow().node_count(), 2);

    ws.select(Field::NodeName, "Alice").expect("alice");
    ws.delete_relationship().expect("unrelate");
    assert_eq!(fx.graph().borrow().relationship_count(), 0);
    ws.delete_node().expect("delete");
    assert_eq!(fx.graph().borrow().node_count(), 1);
    assert_eq!(ws.selection().selected(Field::NodeName), "Bob");
}

#[test]
fn relationship_delete_requires_selection() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    create_person(&mut ws, "Alice");
    assert_eq!(ws.selection().selected(Field::Node2Id), PLACEHOLDER);
    let err = ws.delete_relationship().unwrap_err();
    assert_eq!(err.code(), "NoSelection");
}

#[test]
fn editing_existing_node_properties() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    create_person(&mut ws, "Alice");

    let mut cancel = Answer(None, Vec::new());
    assert!(!ws.edit_node_properties(NodeSlot::Current, &mut cancel).expect("cancel"));
    assert_eq!(
        cancel.1,
        vec![
            ("name".to_string(), "Alice".to_string()),
            ("age".to_string(), String::new()),
        ]
    );

    let before = fx.graph().borrow().statements_executed();
    let mut answer = Answer(Some(vec!["Alicia", "36"]), Vec::new());
    assert!(ws.edit_node_properties(NodeSlot::Current, &mut answer).expect("edit"));
    let graph = fx.graph();
    let sets: Vec<_> = graph.borrow().executed()[before..]
        .iter()
        .filter(|q| matches!(q.statement(), Statement::SetNodeProperties { .. }))
        .cloned()
        .collect();
    assert_eq!(sets.len(), 1);
    assert_eq!(sets[0].param("p1"), Some(&Value::from("36")));

    ws.select(Field::NodeName, "Alicia").expect("renamed");
    ws.select(Field::Property, "age").expect("age");
    assert_eq!(ws.selection().selected(Field::PropertyValue), "36");
}

#[test]
fn editing_existing_relationship_properties() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    create_person(&mut ws, "Alice");
    create_person(&mut ws, "Bob");
    ws.select(Field::NodeName, "Alice").expect("alice");
    ws.select(Field::CreateNode2Name, "Bob").expect("bob");
    ws.create_relationship().expect("relate");
    ws.select(Field::NodeName, "Alice").expect("alice");

    let mut answer = Answer(Some(vec!["1999"]), Vec::new());
    assert!(ws.edit_relationship_properties(&mut answer).expect("edit"));
    assert_eq!(answer.1, vec![("since".to_string(), String::new())]);
    assert_eq!(ws.selection().selected(Field::RelationshipValue), "1999");
}

fn relate(ws: &mut Workspace, from: &str, to: &str) {
    ws.select(Field::NodeName, from).expect("from");
    ws.select(Field::CreateNode2Name, to).expect("to");
    ws.create_relationship().expect("relate");
}

#[test]
fn emptied_dialog_field_removes_property() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    create_person(&mut ws, "Alice");
    ws.set_node_property("age", "30").expect("set");

    let mut answer = Answer(Some(vec!["Alice", ""]), Vec::new());
    assert!(ws
        .edit_node_properties(NodeSlot::Current, &mut answer)
        .expect("edit"));
    assert_eq!(
        answer.1,
        vec![
            ("name".to_string(), "Alice".to_string()),
            ("age".to_string(), "30".to_string()),
        ]
    );
    assert_eq!(ws.selection().selected(Field::NodeName), "Alice");
    assert!(!ws.selection().candidates(Field::Property).contains("age"));
}

#[test]
fn unchanged_and_blank_dialogs_are_accepted() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    create_person(&mut ws, "Alice");
    create_person(&mut ws, "Bob");
    relate(&mut ws, "Alice", "Bob");
    ws.select(Field::NodeName, "Alice").expect("alice");

    let mut same = Answer(Some(vec!["Alice", ""]), Vec::new());
    assert!(ws
        .edit_node_properties(NodeSlot::Current, &mut same)
        .expect("unchanged"));
    assert_eq!(ws.selection().selected(Field::NodeName), "Alice");

    let mut blank = Answer(Some(vec![""]), Vec::new());
    assert!(ws.edit_relationship_properties(&mut blank).expect("blank"));
    assert_eq!(blank.1, vec![("since".to_string(), String::new())]);
    assert_eq!(ws.selection().selected(Field::RelationshipValue), PLACEHOLDER);
    assert_eq!(fx.graph().borrow().relationship_count(), 1);
}

#[test]
fn editing_the_related_node() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    create_person(&mut ws, "Alice");
    create_person(&mut ws, "Bob");
    relate(&mut ws, "Alice", "Bob");
    ws.select(Field::NodeName, "Alice").expect("alice");
    assert_eq!(ws.selection().selected(Field::Node2Id), "2");

    let mut answer = Answer(Some(vec!["Robert", "52"]), Vec::new());
    assert!(ws
        .edit_node_properties(NodeSlot::Node2, &mut answer)
        .expect("edit"));
    assert_eq!(
        answer.1,
        vec![
            ("name".to_string(), "Bob".to_string()),
            ("age".to_string(), String::new()),
        ]
    );
    assert_eq!(ws.selection().selected(Field::NodeName), "Alice");
    assert_eq!(ws.selection().selected(Field::Node2Name), "Robert");

    ws.select(Field::NodeName, "Robert").expect("robert");
    ws.select(Field::Property, "age").expect("age");
    assert_eq!(ws.selection().selected(Field::PropertyValue), "52");
}

#[test]
fn editing_the_creation_target() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    create_person(&mut ws, "Alice");
    create_person(&mut ws, "Bob");
    ws.select(Field::NodeName, "Alice").expect("alice");
    ws.select(Field::CreateNode2Name, "Bob").expect("bob");
    assert_eq!(ws.selection().selected(Field::CreateNode2Id), "2");

    let mut answer = Answer(Some(vec!["Bob", "29"]), Vec::new());
    assert!(ws
        .edit_node_properties(NodeSlot::CreateNode2, &mut answer)
        .expect("edit"));
    assert_eq!(answer.1[0], ("name".to_string(), "Bob".to_string()));

    ws.select(Field::NodeName, "Bob").expect("bob");
    ws.select(Field::Property, "age").expect("age");
    assert_eq!(ws.selection().selected(Field::PropertyValue), "29");
}

#[test]
fn editing_an_unset_slot_is_refused() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    create_person(&mut ws, "Alice");
    let mut answer = Answer(Some(vec!["x"]), Vec::new());
    let err = ws
        .edit_node_properties(NodeSlot::Node2, &mut answer)
        .unwrap_err();
    assert_eq!(err.code(), "NoSelection");
    let err = ws.edit_relationship_properties(&mut answer).unwrap_err();
    assert_eq!(err.code(), "NoSelection");
    assert!(answer.1.is_empty());
}

#[test]
fn write_stands_when_reload_fails() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    ws.stage_node_edit("name", "Alice").expect("stage");
    fx.graph().borrow_mut().fail_after(1, "connection reset");

    assert_eq!(ws.create_node().expect("create"), "1");
    assert_eq!(fx.graph().borrow().node_count(), 1);
    assert!(ws.ids().contains("1"));
    assert!(ws.node_edits().is_empty());
    let status = ws.status().last().expect("status");
    assert!(status.contains("reloading the selection failed"), "{status}");

    ws.refresh(Field::NodeType).expect("refresh");
    assert_eq!(ws.selection().selected(Field::NodeName), "Alice");
}

#[test]
fn set_single_property() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    create_person(&mut ws, "Alice");
    ws.set_node_property("age", "41").expect("set");
    ws.select(Field::Property, "age").expect("age");
    assert_eq!(ws.selection().selected(Field::PropertyValue), "41");
}

#[test]
fn neighborhood_view_of_current_node() {
    let mut fx = Fixture::new();
    let mut ws = fx.open();
    for name in ["Alice", "Bob", "Carol"] {
        create_person(&mut ws, name);
    }
    for (from, to) in [("Alice", "Bob"), ("Bob", "Carol")] {
        ws.select(Field::NodeName, from).expect("from");
        ws.select(Field::CreateNode2Name, to).expect("to");
        ws.create_relationship().expect("relate");
    }
    ws.select(Field::NodeName, "Alice").expect("alice");
    let view = ws.neighborhood_view().expect("view");
    assert_eq!(view.node_count(), 3);
    assert_eq!(view.edge_count(), 2);

    let whole = ws.whole_graph_view().expect("whole");
    assert_eq!(whole.node_count(), 3);
    assert_eq!(whole.edge_count(), 2);
}

#[test]
fn authenticated_store_rejects_missing_credentials() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut connector = MemoryConnector::new().requiring_credentials();
    let result = Workspace::open(
        &mut connector,
        DatabaseTarget::from_folder(dir.path()),
        &Credentials::default(),
        SchemaFiles::default(),
    );
    let err = result.err().expect("must fail");
    assert_eq!(err.code(), "QueryExecutionFailure");

    let auth = dir.path().join("auth.txt");
    fs::write(&auth, "editor\nsecret\n").expect("write");
    let credentials = Credentials::load(&auth).expect("load");
    Workspace::open(
        &mut connector,
        DatabaseTarget::from_folder(dir.path()),
        &credentials,
        SchemaFiles::default(),
    )
    .expect("open with credentials");
}
