//! Error types for teamsync.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ProjectName, ProviderTypeId};

/// Status reported by a repository server when it rejects or fails a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub code: i32,
    pub message: String,
}

impl ServerStatus {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (code {})", self.message, self.code)
    }
}

/// All errors that can arise from teamsync operations.
#[derive(Debug, Error)]
pub enum TeamError {
    /// The server rejected or failed a command. Never retried.
    #[error("server reported an error: {status}")]
    ServerProtocol { status: ServerStatus },

    /// A command succeeded but no content materialized for the target.
    #[error("no contents received from server for {location}")]
    ContentUnavailable { location: String },

    /// A cooperative cancel was observed.
    #[error("operation cancelled")]
    Cancelled,

    /// The session layer failed locally (connection, encoding, ...).
    #[error("client error: {0}")]
    Client(String),

    /// No provider type registered under the given id.
    #[error("unknown provider type '{0}'")]
    UnknownProviderType(ProviderTypeId),

    /// Provider configuration failed; the mapping was rolled back.
    #[error("failed to configure provider for project {project}: {source}")]
    Configure {
        project: ProjectName,
        #[source]
        source: Box<TeamError>,
    },

    /// Underlying I/O failure, annotated with the path involved.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML parse error on config load, with the offending file.
    #[error("failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// YAML serialization error.
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error (sync entry store).
    #[error("sync entry JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl TeamError {
    /// `true` for [`TeamError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TeamError::Cancelled)
    }
}

/// Convenience constructor for [`TeamError::Io`].
pub fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> TeamError {
    TeamError::Io {
        path: path.into(),
        source,
    }
}
