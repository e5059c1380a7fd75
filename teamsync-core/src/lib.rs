//! teamsync core library: domain types, errors, registry, progress, locks.
//!
//! Public API surface:
//! - [`types`]: newtypes, resources, traversals
//! - [`error`]: [`TeamError`]
//! - [`registry`]: [`ProviderRegistry`] (providers, subscribers, listeners)
//! - [`progress`]: [`ProgressMonitor`], sub-monitors, cancellation
//! - [`lock`]: scope-keyed mutual exclusion
//! - [`config`]: [`DispatchConfig`]

pub mod config;
pub mod error;
pub mod lock;
pub mod progress;
pub mod provider;
pub mod registry;
pub mod subscriber;
pub mod telemetry;
pub mod types;

pub use config::DispatchConfig;
pub use error::{ServerStatus, TeamError};
pub use lock::{ScopeGuard, ScopeKey, ScopeLocks};
pub use progress::{
    check_cancelled, CancellationToken, NullProgress, ProgressMonitor, ProgressRecord,
    RecordingProgress, SubProgress,
};
pub use provider::{ProviderHandle, ProviderType};
pub use registry::{ListenerId, ProviderRegistry};
pub use subscriber::{DeltaKind, Subscriber, SubscriberFactory, SubscriberId, SyncKind, TeamDelta};
pub use types::{
    Depth, ProjectName, ProviderTypeId, RepositoryLocation, Resource, ResourceKind,
    ResourceTraversal,
};
