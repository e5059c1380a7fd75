//! A file at a specific repository revision, with lazily fetched contents.

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use teamsync_core::{ProgressMonitor, RepositoryLocation, TeamError};
use tracing::{debug, info};

use crate::folder::{join, relative_to, RemoteFolder};
use crate::log::LogEntry;
use crate::session::{open_session, CommandKind, CommandRequest, LocalOption, ResponseItem, SessionFactory};
use crate::sync_info::{ResourceSyncInfo, Tag};

/// Independent reader over cached content.
pub type ContentReader = Cursor<Arc<[u8]>>;

/// How the local workspace copy relates to this revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkspaceState {
    #[default]
    None,
    Added,
    Deleted,
    Modified,
}

/// Handle to one file at one revision.
///
/// Starts unfetched. [`RemoteRevision::contents`] fetches and caches the
/// bytes; [`RemoteRevision::clear_contents`] drops them again.
#[derive(Debug, Clone)]
pub struct RemoteRevision {
    parent: Arc<RemoteFolder>,
    info: ResourceSyncInfo,
    workspace_state: WorkspaceState,
    contents: Option<Arc<[u8]>>,
}

impl RemoteRevision {
    pub fn new(
        parent: Arc<RemoteFolder>,
        name: impl Into<String>,
        revision: impl Into<String>,
        tag: Option<Tag>,
    ) -> Self {
        let mut info = ResourceSyncInfo::new(name, revision);
        info.tag = tag;
        Self::from_sync_info(parent, info)
    }

    pub fn from_sync_info(parent: Arc<RemoteFolder>, info: ResourceSyncInfo) -> Self {
        Self {
            parent,
            info,
            workspace_state: WorkspaceState::None,
            contents: None,
        }
    }

    pub fn with_workspace_state(mut self, state: WorkspaceState) -> Self {
        self.workspace_state = state;
        self
    }

    /// Handle for the revision the workspace was last synced to. `None` for
    /// entries added locally and never committed.
    pub fn base(parent: Arc<RemoteFolder>, info: Option<&ResourceSyncInfo>) -> Option<Self> {
        let info = info?;
        if info.is_added() {
            return None;
        }
        Some(Self::from_sync_info(parent, info.clone()))
    }

    /// Ask the server for the latest revision of a managed file on `tag`.
    ///
    /// Returns `None` when the file is added-only or the server reports it
    /// removed. The returned handle is unfetched.
    pub fn latest(
        parent: Arc<RemoteFolder>,
        info: &ResourceSyncInfo,
        tag: Option<&Tag>,
        sessions: &dyn SessionFactory,
        progress: &dyn ProgressMonitor,
    ) -> Result<Option<Self>, TeamError> {
        if info.is_added() {
            return Ok(None);
        }

        let mut request = CommandRequest::new(CommandKind::Update)
            .global(crate::session::GlobalOption::DoNotChangeFiles)
            .argument(info.name.clone());
        if let Some(tag) = tag {
            request = request.local(LocalOption::Tag(tag.clone()));
        }

        let mut session = open_session(sessions, parent.repository(), &parent, progress)?;
        let items = session.execute(&request, progress)?.into_items()?;
        session.close()?;

        let mut revision = None;
        for item in items {
            match item {
                ResponseItem::Removed { name } if name == info.name => {
                    debug!(file = %name, "file removed on server");
                    return Ok(None);
                }
                ResponseItem::Revision { name, revision: rev } if name == info.name => {
                    revision = Some(rev)
                }
                _ => {}
            }
        }

        let Some(revision) = revision else {
            return Ok(None);
        };
        let mut latest = Self::from_sync_info(parent, info.with_revision(revision));
        latest.info.tag = tag.cloned();
        latest.clear_contents();
        Ok(Some(latest))
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn name(&self) -> &str {
        &self.info.name
    }

    pub fn revision(&self) -> &str {
        &self.info.revision
    }

    pub fn tag(&self) -> Option<&Tag> {
        self.info.tag.as_ref()
    }

    pub fn parent(&self) -> &Arc<RemoteFolder> {
        &self.parent
    }

    pub fn sync_info(&self) -> &ResourceSyncInfo {
        &self.info
    }

    pub fn workspace_state(&self) -> WorkspaceState {
        self.workspace_state
    }

    pub fn repository(&self) -> &RepositoryLocation {
        self.parent.repository()
    }

    pub fn repository_relative_path(&self) -> String {
        join(self.parent.repository_relative_path(), self.name())
    }

    pub fn relative_path(&self, ancestor: &RemoteFolder) -> String {
        relative_to(&self.repository_relative_path(), ancestor)
    }

    pub fn remote_location(&self) -> String {
        format!("{}/{}", self.parent.remote_location(), self.name())
    }

    /// Remote handles always count as modified relative to the workspace.
    pub fn is_modified(&self) -> bool {
        true
    }

    /// Remote handles are never dirty.
    pub fn is_dirty(&self) -> bool {
        false
    }

    pub fn is_fetched(&self) -> bool {
        self.contents.is_some()
    }

    /// Cached length, or 0 when unfetched.
    pub fn size(&self) -> u64 {
        self.contents.as_ref().map_or(0, |c| c.len() as u64)
    }

    // -----------------------------------------------------------------------
    // Contents
    // -----------------------------------------------------------------------

    /// Contents of this revision, fetching them on first use.
    ///
    /// A server error leaves the handle unfetched.
    pub fn contents(
        &mut self,
        sessions: &dyn SessionFactory,
        progress: &dyn ProgressMonitor,
    ) -> Result<ContentReader, TeamError> {
        if let Some(bytes) = &self.contents {
            return Ok(Cursor::new(bytes.clone()));
        }

        let request = CommandRequest::new(CommandKind::Update)
            .local(LocalOption::Tag(Tag::version(self.revision())))
            .local(LocalOption::IgnoreLocalChanges)
            .argument(self.name().to_string());

        let mut session = open_session(sessions, self.parent.repository(), &self.parent, progress)?;
        let items = session.execute(&request, progress)?.into_items()?;
        session.close()?;

        for item in items {
            if let ResponseItem::Contents { name, bytes } = item {
                if name == self.info.name {
                    self.set_content(bytes);
                }
            }
        }

        match &self.contents {
            Some(bytes) => {
                info!(file = %self.remote_location(), revision = %self.revision(), size = bytes.len(), "fetched remote contents");
                Ok(Cursor::new(bytes.clone()))
            }
            None => Err(TeamError::ContentUnavailable {
                location: self.remote_location(),
            }),
        }
    }

    /// History of the file, in server order.
    pub fn log_entries(
        &self,
        sessions: &dyn SessionFactory,
        progress: &dyn ProgressMonitor,
    ) -> Result<Vec<LogEntry>, TeamError> {
        let request = CommandRequest::new(CommandKind::Log).argument(self.name().to_string());

        let mut session = open_session(sessions, self.parent.repository(), &self.parent, progress)?;
        let items = session.execute(&request, progress)?.into_items()?;
        session.close()?;

        Ok(items
            .filter_map(|item| match item {
                ResponseItem::Log(entry) => Some(entry),
                _ => None,
            })
            .collect())
    }

    /// Same file at another revision. `self` is left untouched.
    pub fn to_revision(&self, revision: impl Into<String>) -> Self {
        let parent = Arc::new(RemoteFolder::new(
            self.parent.repository().clone(),
            self.parent.repository_relative_path(),
            self.parent.tag().cloned(),
        ));
        Self {
            parent,
            info: ResourceSyncInfo::new(self.name(), revision),
            workspace_state: self.workspace_state,
            contents: None,
        }
    }

    /// Store fetched contents. `None` marks an existing but empty file unless
    /// contents are already cached.
    pub fn set_content(&mut self, bytes: Option<Vec<u8>>) {
        match bytes {
            Some(bytes) => self.contents = Some(Arc::from(bytes)),
            None if self.contents.is_none() => self.contents = Some(Arc::from(Vec::new())),
            None => {}
        }
    }

    pub fn clear_contents(&mut self) {
        self.contents = None;
    }
}

impl PartialEq for RemoteRevision {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent
            && self.info.name == other.info.name
            && self.info.revision == other.info.revision
    }
}

impl Eq for RemoteRevision {}

impl fmt::Display for RemoteRevision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.remote_location(), self.revision())
    }
}
