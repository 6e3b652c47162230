use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::query::decode::DecodeError;
use crate::session::SessionError;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, GraphFormError>;

/// Errors raised by the editor core.
#[derive(Debug, Error)]
pub enum GraphFormError {
    /// A schema resource was not present in the database folder.
    #[error("schema file not found: {}", .0.display())]
    SchemaFileMissing(PathBuf),
    /// An existing node ID could not be parsed as a non-negative integer.
    #[error("node ID '{id}' is not a decimal integer; cannot allocate a new ID")]
    InvalidIdFormat {
        /// The offending identifier.
        id: String,
    },
    /// A mutating operation was asked to act on the placeholder.
    #[error("nothing selected for {what}")]
    NoSelection {
        /// Which input was unset.
        what: &'static str,
    },
    /// The node still has incident relationships.
    #[error(
        "cannot delete node {id}: {outgoing} outgoing and {incoming} incoming relationships remain"
    )]
    DeleteBlocked {
        /// Node ID the delete targeted.
        id: String,
        /// Relationships leaving the node.
        outgoing: u64,
        /// Relationships arriving at the node.
        incoming: u64,
    },
    /// A value was selected that is not in the field's candidate list.
    #[error("'{value}' is not a candidate for {field}")]
    InvalidSelection {
        /// Field name.
        field: &'static str,
        /// Rejected value.
        value: String,
    },
    /// The session gateway failed to execute a statement.
    #[error(transparent)]
    Query(#[from] SessionError),
    /// A result stream violated its declared row shape.
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// Configuration could not be read or parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// CSV parsing error.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl GraphFormError {
    /// Returns a machine-readable code for the error variant.
    pub fn code(&self) -> &'static str {
        match self {
            GraphFormError::SchemaFileMissing(_) => "SchemaFileMissing",
            GraphFormError::InvalidIdFormat { .. } => "InvalidIDFormat",
            GraphFormError::NoSelection { .. } => "NoSelection",
            GraphFormError::DeleteBlocked { .. } => "DeleteBlockedByExistingRelationships",
            GraphFormError::InvalidSelection { .. } => "InvalidSelection",
            GraphFormError::Query(_) => "QueryExecutionFailure",
            GraphFormError::Decode(_) => "DecodeFailure",
            GraphFormError::Config(_) => "ConfigError",
            GraphFormError::Csv(_) => "CsvError",
            GraphFormError::Io(_) => "IoError",
        }
    }

    pub(crate) fn no_selection(what: &'static str) -> Self {
        GraphFormError::NoSelection { what }
    }
}
