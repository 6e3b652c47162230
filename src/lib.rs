//! Schema-driven query construction and selection synchronization for a
//! property-graph editor.
//!
//! The crate loads a loose type schema from CSV files, turns form selections
//! into parameter-bound graph queries, keeps a chain of dependent selections
//! consistent, allocates node identifiers, and stages property edits until a
//! single create/update statement commits them.

#![warn(missing_docs)]

pub mod browse;
pub mod config;
pub mod error;
pub mod ids;
pub mod import;
pub mod model;
pub mod query;
pub mod schema;
pub mod selection;
pub mod session;
pub mod staging;
pub mod status;
pub mod view;
pub mod workspace;

pub use error::{GraphFormError, Result};
pub use model::{is_placeholder, Candidates, PLACEHOLDER};
pub use query::{Query, Value};
pub use schema::SchemaSnapshot;
pub use selection::{Field, SelectionState};
pub use session::{GraphSession, MemoryGraph, Row};
pub use workspace::{NodeSlot, Workspace};
