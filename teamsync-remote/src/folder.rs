//! Remote folder handles.

use std::fmt;

use teamsync_core::{ProgressMonitor, RepositoryLocation, TeamError};
use tracing::debug;

use crate::revision::RemoteRevision;
use crate::session::{open_session, CommandKind, CommandRequest, ResponseItem, SessionFactory};
use crate::sync_info::{ResourceSyncInfo, Tag};

/// A folder in the repository, addressed by its repository-relative path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteFolder {
    repository: RepositoryLocation,
    /// Repository-relative path without leading or trailing `/`.
    path: String,
    tag: Option<Tag>,
}

/// A direct member of a [`RemoteFolder`].
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteMember {
    File(RemoteRevision),
    Folder(RemoteFolder),
}

impl RemoteFolder {
    pub fn new(repository: RepositoryLocation, path: impl AsRef<str>, tag: Option<Tag>) -> Self {
        Self {
            repository,
            path: path.as_ref().trim_matches('/').to_string(),
            tag,
        }
    }

    pub fn repository(&self) -> &RepositoryLocation {
        &self.repository
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.tag.as_ref()
    }

    /// Last path segment; empty for the repository root.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or_default()
    }

    pub fn repository_relative_path(&self) -> &str {
        &self.path
    }

    /// `<repository>/<path>`.
    pub fn remote_location(&self) -> String {
        if self.path.is_empty() {
            self.repository.to_string()
        } else {
            format!("{}/{}", self.repository, self.path)
        }
    }

    /// Path of this folder below `ancestor`, or the repository-relative path
    /// when `ancestor` is not above it.
    pub fn relative_path(&self, ancestor: &RemoteFolder) -> String {
        relative_to(&self.path, ancestor)
    }

    /// Child folder handle carrying the same repository and tag.
    pub fn child_folder(&self, name: &str) -> RemoteFolder {
        RemoteFolder::new(self.repository.clone(), join(&self.path, name), self.tag.clone())
    }

    /// List the folder's direct members with a `list` command.
    pub fn members(
        &self,
        sessions: &dyn SessionFactory,
        progress: &dyn ProgressMonitor,
    ) -> Result<Vec<RemoteMember>, TeamError> {
        let mut request = CommandRequest::new(CommandKind::List).argument(".");
        if let Some(tag) = &self.tag {
            request = request.local(crate::session::LocalOption::Tag(tag.clone()));
        }

        let mut session = open_session(sessions, &self.repository, self, progress)?;
        let items = session.execute(&request, progress)?.into_items()?;
        session.close()?;

        let parent = std::sync::Arc::new(self.clone());
        let mut members = Vec::new();
        for item in items {
            match item {
                ResponseItem::Entry {
                    name,
                    is_folder: true,
                    ..
                } => members.push(RemoteMember::Folder(self.child_folder(&name))),
                ResponseItem::Entry {
                    name,
                    is_folder: false,
                    revision,
                } => {
                    let info = ResourceSyncInfo::new(name, revision.unwrap_or_default());
                    members.push(RemoteMember::File(RemoteRevision::from_sync_info(
                        parent.clone(),
                        info,
                    )));
                }
                other => debug!(folder = %self, item = ?other, "ignoring list response item"),
            }
        }
        Ok(members)
    }
}

impl fmt::Display for RemoteFolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.remote_location())
    }
}

pub(crate) fn join(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

pub(crate) fn relative_to(path: &str, ancestor: &RemoteFolder) -> String {
    let base = ancestor.repository_relative_path();
    if base.is_empty() {
        return path.to_string();
    }
    match path.strip_prefix(base) {
        Some("") => ".".to_string(),
        Some(rest) if rest.starts_with('/') => rest.trim_start_matches('/').to_string(),
        _ => path.to_string(),
    }
}
