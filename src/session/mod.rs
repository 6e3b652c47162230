#![forbid(unsafe_code)]

//! Database session gateway.
//!
//! The backing graph store is an external service. The editor only needs
//! one capability from it: run a [`Query`] and return ordered key/value rows.
//! [`GraphSession`] captures that seam; [`Connector`] opens sessions for a
//! database target. [`MemoryGraph`] is a self-contained gateway used by the
//! CLI and the test suite.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::error::Result;
use crate::query::{Query, Value};

/// In-memory gateway.
pub mod memory;

pub use memory::{MemoryConnector, MemoryGraph, SharedGraph};

/// Failures reported by a gateway.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The store could not be reached or refused the credentials.
    #[error("failed to connect to {target}: {reason}")]
    Connect {
        /// Target URI.
        target: String,
        /// Gateway-supplied reason.
        reason: String,
    },
    /// The store rejected or failed a statement.
    #[error("statement failed: {reason} [{statement}]")]
    Execution {
        /// Statement text.
        statement: String,
        /// Gateway-supplied reason.
        reason: String,
    },
}

impl SessionError {
    /// Builds an [`SessionError::Execution`] for a query.
    pub fn execution(query: &Query, reason: impl Into<String>) -> Self {
        SessionError::Execution {
            statement: query.text().to_owned(),
            reason: reason.into(),
        }
    }
}

/// One result row: column keys in the order the statement returned them.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    /// Empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style append.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(key, value);
        self
    }

    /// Appends a column.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((key.into(), value.into()));
    }

    /// Value of the column named `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Column keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(k, _)| k.as_str())
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns `true` if the row has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// Executes statements against a graph store. Calls block until the store
/// answers; there are no retries or timeouts at this layer.
pub trait GraphSession {
    /// Runs one statement and returns its rows.
    fn run(&mut self, query: &Query) -> std::result::Result<Vec<Row>, SessionError>;
}

impl<S: GraphSession + ?Sized> GraphSession for Box<S> {
    fn run(&mut self, query: &Query) -> std::result::Result<Vec<Row>, SessionError> {
        (**self).run(query)
    }
}

impl<S: GraphSession + ?Sized> GraphSession for &mut S {
    fn run(&mut self, query: &Query) -> std::result::Result<Vec<Row>, SessionError> {
        (**self).run(query)
    }
}

/// Where a database lives: the store URI and the folder holding its schema
/// files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatabaseTarget {
    /// Store URI handed to the connector.
    pub uri: String,
    /// Folder containing the four schema CSV files.
    pub folder: PathBuf,
}

impl DatabaseTarget {
    /// Target whose URI is the folder path, as the legacy editor used.
    pub fn from_folder(folder: impl Into<PathBuf>) -> Self {
        let folder = folder.into();
        Self {
            uri: folder.display().to_string(),
            folder,
        }
    }
}

/// Opens sessions. Each call yields a fresh session; the caller drops the
/// previous one before connecting again.
pub trait Connector {
    /// Connects to `target`.
    fn connect(
        &mut self,
        target: &DatabaseTarget,
        credentials: &Credentials,
    ) -> std::result::Result<Box<dyn GraphSession>, SessionError>;
}

/// Principal and secret read from a two-line credential file.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// First line of the file.
    pub principal: String,
    /// Second line of the file.
    pub secret: String,
}

impl Credentials {
    /// Reads `path`. A missing file is not an error: it yields empty
    /// credentials and the later connection attempt fails instead.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "session.credentials.missing");
                return Ok(Self::default());
            }
            Err(err) => return Err(err.into()),
        };
        let mut lines = contents.lines();
        let principal = lines.next().unwrap_or_default().trim().to_owned();
        let secret = lines.next().unwrap_or_default().trim().to_owned();
        Ok(Self { principal, secret })
    }

    /// Returns `true` when neither line was present.
    pub fn is_empty(&self) -> bool {
        self.principal.is_empty() && self.secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("principal", &self.principal)
            .field("secret", &"<redacted>")
            .finish()
    }
}
