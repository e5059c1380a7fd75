//! Error types for teamsync-patch.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while matching a patch against the workspace.
#[derive(Debug, Error)]
pub enum PatchError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The target file is not valid UTF-8 text.
    #[error("target file {path} is not UTF-8 text")]
    NotText { path: PathBuf },
}

/// Convenience constructor for [`PatchError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> PatchError {
    PatchError::Io {
        path: path.into(),
        source,
    }
}
