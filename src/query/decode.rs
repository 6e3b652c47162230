//! Fixed-width row decoding for neighborhood and whole-graph results.
//!
//! Rows are first flattened into one value stream in declared column order
//! and then regrouped by the declared width. A stream whose length is not a
//! multiple of the width means the statement and the result shape disagree;
//! that is a decode failure, never a truncated result.

use thiserror::Error;

use crate::model::{EdgeRecord, NeighborRow, NodeRecord, TwoHopRow};
use crate::query::Value;
use crate::session::Row;

/// Width of a 1-hop row: peer ID, peer name, relationship type.
pub const ONE_HOP_WIDTH: usize = 3;
/// Width of a 2-hop row: mid ID, mid name, end ID, end name, relationship type.
pub const TWO_HOP_WIDTH: usize = 5;
/// Width of a node row: ID, name, labels.
pub const NODE_WIDTH: usize = 3;
/// Width of a relationship row: source ID, target ID, type.
pub const RELATIONSHIP_WIDTH: usize = 3;

/// Result-shape violations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Stream length is not a multiple of the row width.
    #[error("result stream of {len} values is not a multiple of row width {width}")]
    RaggedStream {
        /// Number of values in the stream.
        len: usize,
        /// Declared row width.
        width: usize,
    },
    /// A row lacked one of the declared columns.
    #[error("row {row} is missing column '{column}'")]
    MissingColumn {
        /// Zero-based row index.
        row: usize,
        /// Missing column key.
        column: String,
    },
}

/// Flattens rows into one stream, reading columns by key in `columns` order.
pub fn flatten(rows: &[Row], columns: &[&str]) -> Result<Vec<Value>, DecodeError> {
    let mut stream = Vec::with_capacity(rows.len() * columns.len());
    for (idx, row) in rows.iter().enumerate() {
        for column in columns {
            let value = row.get(column).ok_or_else(|| DecodeError::MissingColumn {
                row: idx,
                column: (*column).to_owned(),
            })?;
            stream.push(value.clone());
        }
    }
    Ok(stream)
}

/// Splits a stream into rows of `width` values.
pub fn regroup(stream: &[Value], width: usize) -> Result<Vec<&[Value]>, DecodeError> {
    if width == 0 || stream.len() % width != 0 {
        return Err(DecodeError::RaggedStream {
            len: stream.len(),
            width,
        });
    }
    Ok(stream.chunks_exact(width).collect())
}

fn text(value: &Value) -> String {
    value.to_text().trim().to_owned()
}

/// Decodes a 1-hop stream.
pub fn one_hop(stream: &[Value]) -> Result<Vec<NeighborRow>, DecodeError> {
    Ok(regroup(stream, ONE_HOP_WIDTH)?
        .into_iter()
        .map(|chunk| NeighborRow {
            peer_id: text(&chunk[0]),
            peer_name: text(&chunk[1]),
            rel_type: text(&chunk[2]),
        })
        .collect())
}

/// Decodes a 2-hop stream.
pub fn two_hop(stream: &[Value]) -> Result<Vec<TwoHopRow>, DecodeError> {
    Ok(regroup(stream, TWO_HOP_WIDTH)?
        .into_iter()
        .map(|chunk| TwoHopRow {
            mid_id: text(&chunk[0]),
            mid_name: text(&chunk[1]),
            end_id: text(&chunk[2]),
            end_name: text(&chunk[3]),
            rel_type: text(&chunk[4]),
        })
        .collect())
}

/// Decodes a whole-graph node stream.
pub fn nodes(stream: &[Value]) -> Result<Vec<NodeRecord>, DecodeError> {
    Ok(regroup(stream, NODE_WIDTH)?
        .into_iter()
        .map(|chunk| NodeRecord {
            id: text(&chunk[0]),
            name: text(&chunk[1]),
            label: text(&chunk[2]),
        })
        .collect())
}

/// Decodes a whole-graph relationship stream.
pub fn relationships(stream: &[Value]) -> Result<Vec<EdgeRecord>, DecodeError> {
    Ok(regroup(stream, RELATIONSHIP_WIDTH)?
        .into_iter()
        .map(|chunk| EdgeRecord {
            source_id: text(&chunk[0]),
            target_id: text(&chunk[1]),
            rel_type: text(&chunk[2]),
        })
        .collect())
}
