use std::fs;
use std::path::Path;

use graphform::config::{EditorConfig, SchemaFiles};
use graphform::schema::{load_folder, load_folder_strict};
use graphform::PLACEHOLDER;

fn write(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).expect("write schema file");
}

fn movie_folder() -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "NodeProperties.csv", "Person,name,age\nMovie,title,released\nTag\n");
    write(dir.path(), "RelationshipProperties.csv", "ACTED_IN,role\nLIKES\n");
    write(dir.path(), "NodeRelationships.csv", "Person,ACTED_IN,LIKES\n");
    write(dir.path(), "RelationshipNodes.csv", "ACTED_IN,Movie\nLIKES,Movie,Person\n");
    dir
}

#[test]
fn loads_all_four_mappings() {
    let dir = movie_folder();
    let schema = load_folder(dir.path(), &SchemaFiles::default()).expect("load");

    assert_eq!(schema.property_types("Person").as_slice(), ["name", "age"]);
    assert_eq!(schema.node_types().as_slice(), ["Movie", "Person", "Tag"]);
    assert_eq!(schema.relationship_types("Person").as_slice(), ["ACTED_IN", "LIKES"]);
    assert_eq!(schema.relationship_properties("ACTED_IN").as_slice(), ["role"]);
    assert_eq!(schema.node2_types("LIKES").as_slice(), ["Movie", "Person"]);
}

#[test]
fn key_only_rows_and_absent_keys_use_placeholder() {
    let dir = movie_folder();
    let schema = load_folder(dir.path(), &SchemaFiles::default()).expect("load");

    assert_eq!(schema.property_types("Tag").as_slice(), [PLACEHOLDER, PLACEHOLDER]);
    assert_eq!(schema.relationship_properties("LIKES").len(), 2);
    assert_eq!(schema.relationship_types("Movie").as_slice(), [PLACEHOLDER]);
    assert!(schema.node2_types("DIRECTED").is_placeholder());
}

#[test]
fn missing_resources_are_not_fatal() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "NodeProperties.csv", "Person,name\n");

    let schema = load_folder(dir.path(), &SchemaFiles::default()).expect("lenient load");
    assert_eq!(schema.node_types().as_slice(), ["Person"]);
    assert!(schema.relationship_types("Person").is_placeholder());

    let err = load_folder_strict(dir.path(), &SchemaFiles::default()).unwrap_err();
    assert_eq!(err.code(), "SchemaFileMissing");
}

#[test]
fn file_names_come_from_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "nodes.csv", "Robot,serial\n");
    let config = EditorConfig::from_toml(
        r#"
        [schema]
        node_properties = "nodes.csv"
        "#,
    )
    .expect("config");

    let schema = load_folder(dir.path(), config.schema_files()).expect("load");
    assert_eq!(schema.property_types("Robot").as_slice(), ["serial"]);
}
