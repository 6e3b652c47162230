use std::fs;
use std::path::PathBuf;

use graphform::config::SchemaFiles;
use graphform::import::ImportSummary;
use graphform::session::{Credentials, DatabaseTarget, MemoryConnector};
use graphform::{Field, Workspace};

fn folder_with(files: &[(&str, &str)]) -> (tempfile::TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("NodeProperties.csv"), "Person,name\nCity,name\n").expect("write");
    fs::write(dir.path().join("RelationshipProperties.csv"), "LIVES_IN,from\n").expect("write");
    fs::write(dir.path().join("NodeRelationships.csv"), "Person,LIVES_IN\n").expect("write");
    fs::write(dir.path().join("RelationshipNodes.csv"), "LIVES_IN,City\n").expect("write");
    let paths = files
        .iter()
        .map(|(name, contents)| {
            let path = dir.path().join(name);
            fs::write(&path, contents).expect("write");
            path
        })
        .collect();
    (dir, paths)
}

fn open(dir: &tempfile::TempDir, connector: &mut MemoryConnector) -> Workspace {
    Workspace::open(
        connector,
        DatabaseTarget::from_folder(dir.path()),
        &Credentials::default(),
        SchemaFiles::default(),
    )
    .expect("open")
}

#[test]
fn imports_nodes_then_relationships() {
    let (dir, paths) = folder_with(&[
        (
            "people.csv",
            "1,Person,name,Alice\n2,Person,name,Bob,age,40\n7,City,name,Leeds\n",
        ),
        ("links.csv", "1,7,LIVES_IN,from,2015\n2,7,LIVES_IN\n"),
    ]);
    let mut connector = MemoryConnector::new();
    let mut ws = open(&dir, &mut connector);

    let nodes = ws.import_nodes(&paths[0]).expect("nodes");
    assert_eq!(nodes, ImportSummary { imported: 3, skipped: 0 });
    let rels = ws.import_relationships(&paths[1]).expect("relationships");
    assert_eq!(rels, ImportSummary { imported: 2, skipped: 0 });

    ws.select(Field::NodeType, "Person").expect("type");
    assert_eq!(
        ws.selection().candidates(Field::NodeName).as_slice(),
        ["Alice", "Bob"]
    );
    assert_eq!(ws.selection().selected(Field::Node2Name), "Leeds");
    assert_eq!(ws.selection().selected(Field::RelationshipValue), "2015");
}

#[test]
fn imported_ids_feed_allocation() {
    let (dir, paths) = folder_with(&[("people.csv", "1,Person,name,Alice\n12,Person,name,Bob\n")]);
    let mut connector = MemoryConnector::new();
    let mut ws = open(&dir, &mut connector);
    ws.import_nodes(&paths[0]).expect("nodes");
    assert!(ws.ids().contains("12"));

    ws.stage_node_edit("name", "Carol").expect("stage");
    assert_eq!(ws.create_node().expect("create"), "13");
}

#[test]
fn malformed_rows_are_skipped_and_counted() {
    let (dir, paths) = folder_with(&[
        ("people.csv", "1,Person,name,Alice\n2,Person\n\n3,Person,name\n4\n"),
        ("links.csv", "1,3,LIVES_IN\n1,3\n"),
    ]);
    let mut connector = MemoryConnector::new();
    let mut ws = open(&dir, &mut connector);

    let nodes = ws.import_nodes(&paths[0]).expect("nodes");
    assert_eq!(nodes.imported, 1);
    assert_eq!(nodes.skipped, 3);
    let rels = ws.import_relationships(&paths[1]).expect("relationships");
    assert_eq!(rels.skipped, 1);

    let last = ws.status().last().expect("status");
    assert!(last.contains("1 rows skipped"), "{last}");
}

#[test]
fn missing_import_file_is_io_error() {
    let (dir, _) = folder_with(&[]);
    let mut connector = MemoryConnector::new();
    let mut ws = open(&dir, &mut connector);
    let err = ws.import_nodes(&dir.path().join("absent.csv")).unwrap_err();
    assert_eq!(err.code(), "IoError");
}
