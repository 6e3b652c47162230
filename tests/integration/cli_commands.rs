#![allow(missing_docs)]

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

fn database() -> TempDir {
    let dir = TempDir::new().expect("tempdir");
    let write = |name: &str, contents: &str| {
        fs::write(dir.path().join(name), contents).expect("write");
    };
    write("NodeProperties.csv", "Person,name,age\nCity,name\n");
    write("RelationshipProperties.csv", "LIVES_IN,from\n");
    write("NodeRelationships.csv", "Person,KNOWS,LIVES_IN\n");
    write("RelationshipNodes.csv", "KNOWS,Person\nLIVES_IN,City\n");
    write("nodes.csv", "1,Person,name,Alice\n2,Person,name,Bob\n3,Person,name,Carol\n9,City,name,Leeds\n");
    write("links.csv", "1,2,KNOWS\n2,3,KNOWS\n1,9,LIVES_IN,from,2015\n");
    dir
}

fn json_stdout(args: &[&str], folder: &Path) -> Value {
    let output = cargo_bin_cmd!("graphform")
        .env("GRAPHFORM_CONFIG", folder.join("no-config.toml"))
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("json output")
}

#[test]
fn schema_command_prints_mappings() {
    let db = database();
    let folder = db.path().to_str().expect("utf8 path");
    let json = json_stdout(&["schema", folder], db.path());
    assert_eq!(json["node_properties"]["Person"][1], "age");
    assert_eq!(json["relationship_nodes"]["LIVES_IN"][0], "City");
}

#[test]
fn view_command_prints_whole_graph() {
    let db = database();
    let folder = db.path().to_str().expect("utf8 path");
    let nodes = db.path().join("nodes.csv");
    let links = db.path().join("links.csv");
    let json = json_stdout(
        &[
            "view",
            folder,
            "--nodes",
            nodes.to_str().expect("utf8"),
            "--relationships",
            links.to_str().expect("utf8"),
        ],
        db.path(),
    );
    assert_eq!(json["nodes"].as_array().map(Vec::len), Some(4));
    assert_eq!(json["edges"].as_array().map(Vec::len), Some(3));
    assert_eq!(json["nodes"][3]["group"], "City");
}

#[test]
fn view_command_limits_to_neighborhood() {
    let db = database();
    let folder = db.path().to_str().expect("utf8 path");
    let nodes = db.path().join("nodes.csv");
    let links = db.path().join("links.csv");
    let json = json_stdout(
        &[
            "view",
            folder,
            "--nodes",
            nodes.to_str().expect("utf8"),
            "--relationships",
            links.to_str().expect("utf8"),
            "--node",
            "3",
        ],
        db.path(),
    );
    let labels: Vec<&str> = json["nodes"]
        .as_array()
        .expect("nodes")
        .iter()
        .filter_map(|n| n["label"].as_str())
        .collect();
    assert_eq!(labels, ["Carol", "Bob", "Alice"]);
}

#[test]
fn missing_folder_argument_fails() {
    let db = database();
    cargo_bin_cmd!("graphform")
        .env("GRAPHFORM_CONFIG", db.path().join("no-config.toml"))
        .arg("schema")
        .assert()
        .failure();
}
