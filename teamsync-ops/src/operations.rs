//! Concrete provider operations: update, commit and tag.
//!
//! Each batch opens one session rooted at the provider's root folder and
//! issues a single command over the batch's resources.

use std::sync::Arc;

use teamsync_core::{ProgressMonitor, ProviderHandle, Resource, SubProgress, TeamError};
use teamsync_remote::{
    open_session, CommandKind, CommandRequest, LocalOption, RemoteFolder, ResponseItem,
    SessionFactory, Tag,
};
use tracing::{debug, info};

use crate::arguments::{local_options, string_arguments};
use crate::dispatch::ProviderOperation;
use crate::refresh::{refresh_after_update, RemoteStateCache};

const COMMAND_UNITS: u64 = 100;

/// Root folder a provider's sessions are opened on.
pub fn provider_root(provider: &ProviderHandle, tag: Option<&Tag>) -> RemoteFolder {
    RemoteFolder::new(provider.location().clone(), provider.root_path(), tag.cloned())
}

/// Run `request` for `provider` and return the successful response items.
fn run_command(
    sessions: &dyn SessionFactory,
    provider: &ProviderHandle,
    request: &CommandRequest,
    progress: &dyn ProgressMonitor,
) -> Result<Vec<ResponseItem>, TeamError> {
    let root = provider_root(provider, None);
    let mut session = open_session(sessions, provider.location(), &root, progress)?;
    let items = session.execute(request, progress)?.into_items()?;
    session.close()?;
    Ok(items.collect())
}

fn log_messages(provider: &ProviderHandle, items: &[ResponseItem]) {
    for item in items {
        if let ResponseItem::Message(message) = item {
            debug!(provider = %provider, message = %message, "server message");
        }
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// Bring workspace resources up to date with the server.
pub struct UpdateOperation {
    sessions: Arc<dyn SessionFactory>,
    cache: Option<Arc<dyn RemoteStateCache>>,
    tag: Option<Tag>,
    ignore_local_changes: bool,
}

impl UpdateOperation {
    pub fn new(sessions: Arc<dyn SessionFactory>) -> Self {
        Self {
            sessions,
            cache: None,
            tag: None,
            ignore_local_changes: false,
        }
    }

    /// Refresh this cache for the updated folders after each batch.
    pub fn with_cache(mut self, cache: Arc<dyn RemoteStateCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Overwrite local modifications with server contents.
    pub fn ignoring_local_changes(mut self) -> Self {
        self.ignore_local_changes = true;
        self
    }
}

impl ProviderOperation for UpdateOperation {
    fn name(&self) -> &str {
        "update"
    }

    fn task_name(&self, provider: &ProviderHandle) -> String {
        format!("Updating {}", provider.project())
    }

    fn execute_batch(
        &self,
        provider: &ProviderHandle,
        resources: &[Resource],
        recurse: bool,
        progress: &dyn ProgressMonitor,
    ) -> Result<(), TeamError> {
        progress.begin_task("", COMMAND_UNITS * 2);

        let mut request = CommandRequest::new(CommandKind::Update).locals(local_options(recurse));
        if let Some(tag) = &self.tag {
            request = request.local(LocalOption::Tag(tag.clone()));
        }
        if self.ignore_local_changes {
            request = request.local(LocalOption::IgnoreLocalChanges);
        }
        let request = request.arguments(string_arguments(resources));

        let command_progress = SubProgress::new(progress, COMMAND_UNITS);
        let items = run_command(self.sessions.as_ref(), provider, &request, &command_progress);
        command_progress.done();
        let items = items?;
        log_messages(provider, &items);

        let updated = items
            .iter()
            .filter(|i| matches!(i, ResponseItem::Revision { .. } | ResponseItem::Removed { .. }))
            .count();
        info!(provider = %provider, resources = resources.len(), recurse, updated, "update finished");

        let refresh_progress = SubProgress::new(progress, COMMAND_UNITS);
        if let Some(cache) = &self.cache {
            refresh_after_update(cache.as_ref(), provider, resources, &refresh_progress);
        }
        refresh_progress.done();
        progress.done();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Send local changes to the server with a log message.
pub struct CommitOperation {
    sessions: Arc<dyn SessionFactory>,
    message: String,
}

impl CommitOperation {
    pub fn new(sessions: Arc<dyn SessionFactory>, message: impl Into<String>) -> Self {
        Self {
            sessions,
            message: message.into(),
        }
    }
}

impl ProviderOperation for CommitOperation {
    fn name(&self) -> &str {
        "commit"
    }

    fn task_name(&self, provider: &ProviderHandle) -> String {
        format!("Committing {}", provider.project())
    }

    fn execute_batch(
        &self,
        provider: &ProviderHandle,
        resources: &[Resource],
        recurse: bool,
        progress: &dyn ProgressMonitor,
    ) -> Result<(), TeamError> {
        progress.begin_task("", COMMAND_UNITS);
        let request = CommandRequest::new(CommandKind::Commit)
            .locals(local_options(recurse))
            .local(LocalOption::Message(self.message.clone()))
            .arguments(string_arguments(resources));

        let items = run_command(self.sessions.as_ref(), provider, &request, progress)?;
        log_messages(provider, &items);
        let committed = items
            .iter()
            .filter(|i| matches!(i, ResponseItem::Revision { .. }))
            .count();
        info!(provider = %provider, committed, "commit finished");
        progress.done();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tag
// ---------------------------------------------------------------------------

/// Apply a tag to the server revisions the workspace is based on.
pub struct TagOperation {
    sessions: Arc<dyn SessionFactory>,
    tag: Tag,
}

impl TagOperation {
    pub fn new(sessions: Arc<dyn SessionFactory>, tag: Tag) -> Self {
        Self { sessions, tag }
    }
}

impl ProviderOperation for TagOperation {
    fn name(&self) -> &str {
        "tag"
    }

    fn task_name(&self, provider: &ProviderHandle) -> String {
        format!("Tagging {} as {}", provider.project(), self.tag)
    }

    fn execute_batch(
        &self,
        provider: &ProviderHandle,
        resources: &[Resource],
        recurse: bool,
        progress: &dyn ProgressMonitor,
    ) -> Result<(), TeamError> {
        progress.begin_task("", COMMAND_UNITS);
        let request = CommandRequest::new(CommandKind::Tag)
            .locals(local_options(recurse))
            .argument(self.tag.name.clone())
            .arguments(string_arguments(resources));

        let items = run_command(self.sessions.as_ref(), provider, &request, progress)?;
        log_messages(provider, &items);
        info!(provider = %provider, tag = %self.tag, "tag applied");
        progress.done();
        Ok(())
    }
}
