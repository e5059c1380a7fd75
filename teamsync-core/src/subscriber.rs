//! Synchronization subscribers and the deltas announced when they appear.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::TeamError;
use crate::types::Resource;

/// Qualified subscriber name: `<qualifier>:<local_name>`.
///
/// The qualifier names the provider family able to create the subscriber.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriberId {
    pub qualifier: String,
    pub local_name: String,
}

impl SubscriberId {
    pub fn new(qualifier: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            qualifier: qualifier.into(),
            local_name: local_name.into(),
        }
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.qualifier, self.local_name)
    }
}

/// Synchronization state of a local resource relative to its remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncKind {
    InSync,
    Outgoing,
    Incoming,
    Conflicting,
}

/// Source of synchronization state for a set of resources.
pub trait Subscriber: Send + Sync {
    fn id(&self) -> SubscriberId;

    /// Sync state of `resource`, or `None` when the subscriber does not
    /// manage it.
    fn sync_kind(&self, resource: &Resource) -> Result<Option<SyncKind>, TeamError>;
}

/// Lazily builds a subscriber for an id whose qualifier it serves.
pub trait SubscriberFactory: Send + Sync {
    fn create(&self, id: &SubscriberId) -> Result<Option<Arc<dyn Subscriber>>, TeamError>;
}

/// What happened to a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    SubscriberCreated,
}

/// Change notification fanned out to registry listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamDelta {
    pub subscriber: SubscriberId,
    pub kind: DeltaKind,
}
