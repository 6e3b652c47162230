//! Reads `key, value1, value2, …` rows from the schema CSV resources.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use csv::{ReaderBuilder, Trim};
use tracing::{debug, warn};

use super::{SchemaMapping, SchemaSnapshot};
use crate::config::SchemaFiles;
use crate::error::{GraphFormError, Result};
use crate::model::PLACEHOLDER;

/// Parses one mapping from any reader. Rows without a key are skipped; a key
/// with no values maps to two placeholders; a repeated key replaces the
/// earlier row.
pub fn parse_mapping<R: Read>(reader: R) -> Result<SchemaMapping> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let mut mapping = SchemaMapping::new();
    for record in reader.records() {
        let record = record?;
        let mut cells = record.iter().filter(|cell| !cell.is_empty());
        let Some(key) = cells.next() else {
            continue;
        };
        let mut values: Vec<String> = cells.map(str::to_owned).collect();
        if values.is_empty() {
            values = vec![PLACEHOLDER.to_owned(), PLACEHOLDER.to_owned()];
        }
        mapping.insert(key.to_owned(), values);
    }
    Ok(mapping)
}

/// Loads one mapping; a missing file is logged and yields an empty mapping.
pub fn load_mapping(path: &Path) -> Result<SchemaMapping> {
    match load_mapping_strict(path) {
        Err(GraphFormError::SchemaFileMissing(path)) => {
            warn!(path = %path.display(), "schema.file.missing");
            Ok(SchemaMapping::new())
        }
        other => other,
    }
}

fn load_mapping_strict(path: &Path) -> Result<SchemaMapping> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(GraphFormError::SchemaFileMissing(path.to_path_buf()));
        }
        Err(err) => return Err(err.into()),
    };
    let mapping = parse_mapping(file)?;
    debug!(path = %path.display(), keys = mapping.len(), "schema.file.loaded");
    Ok(mapping)
}

/// Loads the four resources of `folder`. Missing resources become empty
/// mappings.
pub fn load_folder(folder: &Path, files: &SchemaFiles) -> Result<SchemaSnapshot> {
    Ok(SchemaSnapshot::new(
        load_mapping(&folder.join(&files.node_properties))?,
        load_mapping(&folder.join(&files.relationship_properties))?,
        load_mapping(&folder.join(&files.node_relationships))?,
        load_mapping(&folder.join(&files.relationship_nodes))?,
    ))
}

/// Like [`load_folder`] but fails with
/// [`GraphFormError::SchemaFileMissing`] on the first absent resource.
pub fn load_folder_strict(folder: &Path, files: &SchemaFiles) -> Result<SchemaSnapshot> {
    Ok(SchemaSnapshot::new(
        load_mapping_strict(&folder.join(&files.node_properties))?,
        load_mapping_strict(&folder.join(&files.relationship_properties))?,
        load_mapping_strict(&folder.join(&files.node_relationships))?,
        load_mapping_strict(&folder.join(&files.relationship_nodes))?,
    ))
}
