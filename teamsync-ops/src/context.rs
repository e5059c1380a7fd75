//! Contexts that tell a traversal what differs from the server.

use std::sync::Arc;

use teamsync_core::{ProgressMonitor, Resource, Subscriber, SyncKind, TeamError};
use teamsync_remote::ContentReader;

/// Answers questions a model traversal asks about remote state.
pub trait ResourceMappingContext {
    /// `true` if the local resource differs from its remote counterpart.
    fn content_differs(&self, resource: &Resource) -> Result<bool, TeamError>;

    /// Remote contents of a file, when the context can supply them.
    fn fetch_contents(
        &self,
        resource: &Resource,
        progress: &dyn ProgressMonitor,
    ) -> Result<Option<ContentReader>, TeamError>;

    /// Remote members of a folder, when the context can supply them.
    fn fetch_members(
        &self,
        folder: &Resource,
        progress: &dyn ProgressMonitor,
    ) -> Result<Option<Vec<Resource>>, TeamError>;
}

/// Context backed by a subscriber's sync state.
pub struct SubscriberTraversalContext {
    subscriber: Arc<dyn Subscriber>,
}

impl SubscriberTraversalContext {
    pub fn new(subscriber: Arc<dyn Subscriber>) -> Self {
        Self { subscriber }
    }

    pub fn subscriber(&self) -> &Arc<dyn Subscriber> {
        &self.subscriber
    }
}

impl ResourceMappingContext for SubscriberTraversalContext {
    fn content_differs(&self, resource: &Resource) -> Result<bool, TeamError> {
        let kind = self.subscriber.sync_kind(resource)?;
        Ok(kind.is_some_and(|k| k != SyncKind::InSync))
    }

    fn fetch_contents(
        &self,
        _resource: &Resource,
        _progress: &dyn ProgressMonitor,
    ) -> Result<Option<ContentReader>, TeamError> {
        Ok(None)
    }

    fn fetch_members(
        &self,
        _folder: &Resource,
        _progress: &dyn ProgressMonitor,
    ) -> Result<Option<Vec<Resource>>, TeamError> {
        Ok(None)
    }
}
