use std::fs;

use graphform::config::SchemaFiles;
use graphform::query::builder;
use graphform::session::{Credentials, DatabaseTarget, GraphSession, MemoryConnector};
use graphform::{Field, Workspace, PLACEHOLDER};

struct Fixture {
    _dir: tempfile::TempDir,
    connector: MemoryConnector,
    target: DatabaseTarget,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let write = |name: &str, contents: &str| {
        fs::write(dir.path().join(name), contents).expect("write");
    };
    write("NodeProperties.csv", "Person,name,age\nCity,name\n");
    write("RelationshipProperties.csv", "KNOWS,since\nLIVES_IN,from\n");
    write("NodeRelationships.csv", "Person,KNOWS,LIVES_IN\n");
    write("RelationshipNodes.csv", "KNOWS,Person\nLIVES_IN,City\n");

    let target = DatabaseTarget::from_folder(dir.path());
    let mut connector = MemoryConnector::new();
    let graph = connector.graph(&target.uri);
    {
        let mut graph = graph.borrow_mut();
        for (id, name, ty) in [
            ("1", "Alice", "Person"),
            ("2", "Bob", "Person"),
            ("3", "Carol", "Person"),
            ("10", "Leeds", "City"),
        ] {
            let q = builder::create_node(
                ty,
                vec![("ID".into(), id.into()), ("name".into(), name.into())],
            )
            .expect("node");
            graph.run(&q).expect("run");
        }
        for (a, b, rel, prop) in [
            ("1", "2", "KNOWS", ("since", "2019")),
            ("1", "3", "KNOWS", ("since", "2021")),
            ("1", "10", "LIVES_IN", ("from", "2015")),
        ] {
            let q = builder::create_relationship(
                a,
                b,
                rel,
                vec![(prop.0.into(), prop.1.into())],
            )
            .expect("rel");
            graph.run(&q).expect("run");
        }
    }
    Fixture {
        _dir: dir,
        connector,
        target,
    }
}

fn open(fx: &mut Fixture) -> Workspace {
    Workspace::open(
        &mut fx.connector,
        fx.target.clone(),
        &Credentials::default(),
        SchemaFiles::default(),
    )
    .expect("open")
}

#[test]
fn initial_state_is_consistent() {
    let mut fx = fixture();
    let ws = open(&mut fx);
    let state = ws.selection();
    for field in Field::ALL {
        let selected = state.selected(field);
        assert!(
            selected == PLACEHOLDER || state.candidates(field).contains(selected),
            "{field:?} selected {selected:?} outside {:?}",
            state.candidates(field)
        );
    }
    assert_eq!(state.selected(Field::NodeType), "City");
    assert_eq!(state.selected(Field::NodeName), "Leeds");
}

#[test]
fn walking_the_relationship_chain() {
    let mut fx = fixture();
    let mut ws = open(&mut fx);
    ws.select(Field::NodeType, "Person").expect("type");
    assert_eq!(
        ws.selection().candidates(Field::NodeName).as_slice(),
        ["Alice", "Bob", "Carol"]
    );
    assert_eq!(ws.selection().selected(Field::NodeId), "1");
    assert_eq!(ws.selection().selected(Field::Relationship), "KNOWS");
    assert_eq!(
        ws.selection().candidates(Field::Node2Name).as_slice(),
        ["Bob", "Carol"]
    );

    ws.select(Field::Node2Name, "Carol").expect("node2");
    assert_eq!(ws.selection().selected(Field::Node2Id), "3");
    assert_eq!(ws.selection().selected(Field::RelationshipValue), "2021");

    ws.select(Field::Relationship, "LIVES_IN").expect("rel");
    assert_eq!(ws.selection().selected(Field::Node2Type), "City");
    assert_eq!(ws.selection().selected(Field::Node2Name), "Leeds");
    assert_eq!(ws.selection().selected(Field::RelationshipProperty), "from");
    assert_eq!(ws.selection().selected(Field::RelationshipValue), "2015");
}

#[test]
fn property_chain_excludes_id() {
    let mut fx = fixture();
    let mut ws = open(&mut fx);
    ws.select(Field::NodeType, "Person").expect("type");
    assert_eq!(ws.selection().candidates(Field::Property).as_slice(), ["name"]);
    assert_eq!(ws.selection().selected(Field::PropertyValue), "Alice");
}

#[test]
fn creation_chain_tracks_node_type() {
    let mut fx = fixture();
    let mut ws = open(&mut fx);
    ws.select(Field::NodeType, "Person").expect("type");
    ws.select(Field::CreateRelationship, "LIVES_IN").expect("create rel");
    assert_eq!(ws.selection().selected(Field::CreateNode2Type), "City");
    assert_eq!(ws.selection().selected(Field::CreateNode2Name), "Leeds");
    assert_eq!(ws.selection().selected(Field::CreateNode2Id), "10");
    assert_eq!(
        ws.selection().selected(Field::CreateRelationshipProperty),
        "from"
    );
}

#[test]
fn placeholder_upstream_clears_downstream_without_queries() {
    let mut fx = fixture();
    let mut ws = open(&mut fx);
    let graph = fx.connector.graph(&fx.target.uri);
    let before = graph.borrow().statements_executed();

    ws.select(Field::NodeType, PLACEHOLDER).expect("clear");
    assert_eq!(graph.borrow().statements_executed(), before);
    for field in [
        Field::NodeName,
        Field::NodeId,
        Field::Relationship,
        Field::Node2Id,
        Field::CreateNode2Id,
    ] {
        assert!(ws.selection().is_unset(field), "{field:?}");
    }
    assert_eq!(ws.selection().selected(Field::NewNodeType), "City");
}

#[test]
fn invalid_selection_keeps_state() {
    let mut fx = fixture();
    let mut ws = open(&mut fx);
    let before = ws.selection().clone();
    let err = ws.select(Field::NodeType, "Robot").unwrap_err();
    assert_eq!(err.code(), "InvalidSelection");
    assert_eq!(ws.selection(), &before);
}

#[test]
fn store_failure_keeps_state() {
    let mut fx = fixture();
    let mut ws = open(&mut fx);
    let before = ws.selection().clone();
    fx.connector.graph(&fx.target.uri).borrow_mut().fail_next("gone");
    let err = ws.select(Field::NodeType, "Person").unwrap_err();
    assert_eq!(err.code(), "QueryExecutionFailure");
    assert_eq!(ws.selection(), &before);
}
