//! Bulk loading of nodes and relationships from headerless CSV files.
//!
//! Node rows are `ID, type, key1, value1, key2, value2, …` and need at least
//! four cells. Relationship rows are `ID1, ID2, type, key1, value1, …` and
//! need at least three. Rows that do not fit are skipped with a warning; each
//! accepted row becomes one create statement.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{info, warn};

use crate::error::Result;
use crate::ids::IdAllocator;
use crate::query::ast::Assignments;
use crate::query::{builder, Value};
use crate::session::GraphSession;

const MIN_NODE_CELLS: usize = 4;
const MIN_RELATIONSHIP_CELLS: usize = 3;

/// Counts from one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Rows turned into create statements.
    pub imported: u64,
    /// Rows skipped as malformed.
    pub skipped: u64,
}

/// Imports nodes from `path`; every imported ID is registered with `ids`.
pub fn import_nodes(
    path: &Path,
    session: &mut dyn GraphSession,
    ids: &mut IdAllocator,
) -> Result<ImportSummary> {
    let summary = import_nodes_from(File::open(path)?, session, ids)?;
    info!(
        path = %path.display(),
        imported = summary.imported,
        skipped = summary.skipped,
        "import.nodes.finished"
    );
    Ok(summary)
}

/// Imports relationships from `path`.
pub fn import_relationships(
    path: &Path,
    session: &mut dyn GraphSession,
) -> Result<ImportSummary> {
    let summary = import_relationships_from(File::open(path)?, session)?;
    info!(
        path = %path.display(),
        imported = summary.imported,
        skipped = summary.skipped,
        "import.relationships.finished"
    );
    Ok(summary)
}

/// Reader form of [`import_nodes`].
pub fn import_nodes_from<R: Read>(
    reader: R,
    session: &mut dyn GraphSession,
    ids: &mut IdAllocator,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for (line, record) in records(reader).enumerate() {
        let cells = cells(&record?);
        if cells.len() < MIN_NODE_CELLS || cells[0].is_empty() || cells[1].is_empty() {
            warn!(line = line + 1, cells = cells.len(), "import.nodes.row_skipped");
            summary.skipped += 1;
            continue;
        }
        let id = cells[0].clone();
        let mut properties: Assignments = vec![("ID".to_owned(), Value::from(id.as_str()))];
        properties.extend(pairs(&cells[2..], line).filter(|(key, _)| key != "ID"));
        let query = builder::create_node(&cells[1], properties)?;
        session.run(&query)?;
        ids.register(id);
        summary.imported += 1;
    }
    Ok(summary)
}

/// Reader form of [`import_relationships`].
pub fn import_relationships_from<R: Read>(
    reader: R,
    session: &mut dyn GraphSession,
) -> Result<ImportSummary> {
    let mut summary = ImportSummary::default();
    for (line, record) in records(reader).enumerate() {
        let cells = cells(&record?);
        if cells.len() < MIN_RELATIONSHIP_CELLS || cells[..3].iter().any(String::is_empty) {
            warn!(
                line = line + 1,
                cells = cells.len(),
                "import.relationships.row_skipped"
            );
            summary.skipped += 1;
            continue;
        }
        let properties: Assignments = pairs(&cells[3..], line).collect();
        let query = builder::create_relationship(&cells[0], &cells[1], &cells[2], properties)?;
        session.run(&query)?;
        summary.imported += 1;
    }
    Ok(summary)
}

fn records<R: Read>(reader: R) -> csv::StringRecordsIntoIter<R> {
    ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader)
        .into_records()
}

/// Trailing empty cells are dropped; interior ones are kept so key/value
/// positions stay aligned.
fn cells(record: &StringRecord) -> Vec<String> {
    let mut cells: Vec<String> = record.iter().map(str::to_owned).collect();
    while cells.last().is_some_and(String::is_empty) {
        cells.pop();
    }
    cells
}

fn pairs(cells: &[String], line: usize) -> impl Iterator<Item = (String, Value)> + '_ {
    if cells.len() % 2 == 1 {
        warn!(line = line + 1, key = %cells[cells.len() - 1], "import.dangling_key");
    }
    cells
        .chunks_exact(2)
        .filter(|pair| !pair[0].is_empty())
        .map(|pair| (pair[0].clone(), Value::from(pair[1].as_str())))
}
