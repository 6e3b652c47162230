//! Editor configuration read from a TOML file.
//!
//! ```toml
//! [database]
//! default = "/data/movies"
//! uri = "bolt://localhost:7687"
//! credentials = "/home/me/.graphform/auth.txt"
//!
//! [schema]
//! node_properties = "NodeProperties.csv"
//! ```
//!
//! Every key is optional. A missing file yields the defaults.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::DatabaseTarget;

/// Default schema resource names inside a database folder.
pub const NODE_PROPERTIES_FILE: &str = "NodeProperties.csv";
/// See [`NODE_PROPERTIES_FILE`].
pub const RELATIONSHIP_PROPERTIES_FILE: &str = "RelationshipProperties.csv";
/// See [`NODE_PROPERTIES_FILE`].
pub const NODE_RELATIONSHIPS_FILE: &str = "NodeRelationships.csv";
/// See [`NODE_PROPERTIES_FILE`].
pub const RELATIONSHIP_NODES_FILE: &str = "RelationshipNodes.csv";

/// Loaded editor configuration.
#[derive(Debug, Default)]
pub struct EditorConfig {
    path: Option<PathBuf>,
    data: RawConfig,
}

impl EditorConfig {
    /// Loads `explicit`, or the default location when `None`.
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => RawConfig::default(),
        };
        Ok(Self { path, data })
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let data = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        Ok(Self { path: None, data })
    }

    /// Path the configuration was (or would be) read from.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Folder opened when no database is named explicitly.
    pub fn default_database(&self) -> Option<&Path> {
        self.data.database.default_path.as_deref()
    }

    /// Remembers `folder` as the default database.
    pub fn set_default_database(&mut self, folder: impl Into<PathBuf>) {
        self.data.database.default_path = Some(folder.into());
    }

    /// Credential file location, if configured.
    pub fn credentials_path(&self) -> Option<&Path> {
        self.data.database.credentials.as_deref()
    }

    /// Schema resource names.
    pub fn schema_files(&self) -> &SchemaFiles {
        &self.data.schema
    }

    /// Builds the connection target for `folder`, using the configured URI
    /// when one is set.
    pub fn target(&self, folder: impl Into<PathBuf>) -> DatabaseTarget {
        let mut target = DatabaseTarget::from_folder(folder);
        if let Some(uri) = &self.data.database.uri {
            target.uri = uri.clone();
        }
        target
    }

    /// Writes the configuration back to its path, creating parent folders.
    pub fn persist(&self) -> Result<PathBuf, ConfigError> {
        let target = match &self.path {
            Some(path) => path.clone(),
            None => default_config_path().ok_or(ConfigError::NoConfigPath)?,
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let serialized = toml::to_string_pretty(&self.data)
            .map_err(|source| ConfigError::Serialize { source })?;
        fs::write(&target, serialized).map_err(|source| ConfigError::Write {
            path: target.clone(),
            source,
        })?;
        Ok(target)
    }
}

/// File names of the four schema resources, relative to the database folder.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaFiles {
    /// Node type → property names.
    pub node_properties: String,
    /// Relationship type → property names.
    pub relationship_properties: String,
    /// Node type → outgoing relationship types.
    pub node_relationships: String,
    /// Relationship type → target node types.
    pub relationship_nodes: String,
}

impl Default for SchemaFiles {
    fn default() -> Self {
        Self {
            node_properties: NODE_PROPERTIES_FILE.into(),
            relationship_properties: RELATIONSHIP_PROPERTIES_FILE.into(),
            node_relationships: NODE_RELATIONSHIPS_FILE.into(),
            relationship_nodes: RELATIONSHIP_NODES_FILE.into(),
        }
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct RawConfig {
    #[serde(default)]
    database: DatabaseSection,
    #[serde(default)]
    schema: SchemaFiles,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct DatabaseSection {
    #[serde(rename = "default")]
    default_path: Option<PathBuf>,
    uri: Option<String>,
    credentials: Option<PathBuf>,
}

/// Configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config {path}: {source}")]
    Read {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for this schema.
    #[error("failed to parse config {path}: {source}")]
    Parse {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        source: toml::de::Error,
    },
    /// Serialization failed while persisting.
    #[error("failed to serialize config: {source}")]
    Serialize {
        /// Underlying error.
        source: toml::ser::Error,
    },
    /// Writing the file failed.
    #[error("failed to write config {path}: {source}")]
    Write {
        /// Config path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// Creating the parent folder failed.
    #[error("failed to create config directory {path}: {source}")]
    CreateDir {
        /// Directory path.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },
    /// No explicit path and no platform config directory.
    #[error("no config directory found; pass --config or set GRAPHFORM_CONFIG")]
    NoConfigPath,
}

/// `<config dir>/graphform/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("graphform").join("config.toml"))
}
