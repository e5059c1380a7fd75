//! Provider and subscriber registry.
//!
//! One [`ProviderRegistry`] is created per process or session and shared via
//! `Arc` with every component that needs provider lookup. It holds:
//!
//! - registered provider types, keyed by [`ProviderTypeId`]
//! - project → provider mappings
//! - subscribers (created lazily through factories) and the listeners told
//!   about new subscribers

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::error::TeamError;
use crate::provider::{ProviderHandle, ProviderType};
use crate::subscriber::{DeltaKind, Subscriber, SubscriberFactory, SubscriberId, TeamDelta};
use crate::types::{ProjectName, ProviderTypeId, RepositoryLocation, Resource};

/// Handle returned by [`ProviderRegistry::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&[TeamDelta]) + Send + Sync>;

#[derive(Default)]
pub struct ProviderRegistry {
    types: RwLock<HashMap<ProviderTypeId, Arc<dyn ProviderType>>>,
    mappings: RwLock<HashMap<ProjectName, ProviderHandle>>,
    factories: RwLock<HashMap<String, Arc<dyn SubscriberFactory>>>,
    subscribers: RwLock<HashMap<SubscriberId, Arc<dyn Subscriber>>>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener: AtomicU64,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // 1. Provider types
    // -----------------------------------------------------------------------

    /// Register a provider type under its own id, replacing any previous one.
    pub fn register_type(&self, provider_type: Arc<dyn ProviderType>) {
        let id = provider_type.id();
        tracing::debug!(provider_type = %id, "registering provider type");
        write(&self.types).insert(id, provider_type);
    }

    pub fn provider_type(&self, id: &ProviderTypeId) -> Option<Arc<dyn ProviderType>> {
        read(&self.types).get(id).cloned()
    }

    // -----------------------------------------------------------------------
    // 2. Project mappings
    // -----------------------------------------------------------------------

    /// Map `project` to a provider of type `type_id`.
    ///
    /// The provider type's `configure_project` hook runs after the mapping is
    /// recorded; if it fails the mapping is removed again and a
    /// [`TeamError::Configure`] is returned.
    pub fn map(
        &self,
        project: ProjectName,
        type_id: &ProviderTypeId,
        location: RepositoryLocation,
        root_path: impl Into<String>,
    ) -> Result<ProviderHandle, TeamError> {
        let provider_type = self
            .provider_type(type_id)
            .ok_or_else(|| TeamError::UnknownProviderType(type_id.clone()))?;

        let handle = ProviderHandle::new(type_id.clone(), project.clone(), location, root_path);
        let previous = write(&self.mappings).insert(project.clone(), handle.clone());

        if let Err(source) = provider_type.configure_project(&handle) {
            let mut mappings = write(&self.mappings);
            match previous {
                Some(previous) => mappings.insert(project.clone(), previous),
                None => mappings.remove(&project),
            };
            tracing::warn!(project = %project, error = %source, "provider configuration failed");
            return Err(TeamError::Configure {
                project,
                source: Box::new(source),
            });
        }

        tracing::info!(provider = %handle, "project mapped");
        Ok(handle)
    }

    /// Remove the mapping for `project`, returning the old provider.
    pub fn unmap(&self, project: &ProjectName) -> Option<ProviderHandle> {
        write(&self.mappings).remove(project)
    }

    /// Provider mapped to `project`, whatever its type.
    pub fn provider_for(&self, project: &ProjectName) -> Option<ProviderHandle> {
        read(&self.mappings).get(project).cloned()
    }

    /// Provider mapped to `project` only if it is of type `type_id`.
    pub fn provider_of_type(
        &self,
        project: &ProjectName,
        type_id: &ProviderTypeId,
    ) -> Option<ProviderHandle> {
        self.provider_for(project)
            .filter(|provider| provider.type_id() == type_id)
    }

    /// Owning provider of `resource`, if its project is mapped.
    pub fn resolve(&self, resource: &Resource) -> Option<ProviderHandle> {
        self.provider_for(&resource.project)
    }

    /// Mapped projects, sorted by name.
    pub fn projects(&self) -> Vec<ProjectName> {
        let mut projects: Vec<_> = read(&self.mappings).keys().cloned().collect();
        projects.sort();
        projects
    }

    // -----------------------------------------------------------------------
    // 3. Subscribers
    // -----------------------------------------------------------------------

    /// Register a factory able to create subscribers whose id carries
    /// `qualifier`.
    pub fn register_subscriber_factory(
        &self,
        qualifier: impl Into<String>,
        factory: Arc<dyn SubscriberFactory>,
    ) {
        write(&self.factories).insert(qualifier.into(), factory);
    }

    /// Register `subscriber` and announce it to listeners.
    pub fn register_subscriber(&self, subscriber: Arc<dyn Subscriber>) {
        let id = subscriber.id();
        write(&self.subscribers).insert(id.clone(), subscriber);
        self.fire(&[TeamDelta {
            subscriber: id,
            kind: DeltaKind::SubscriberCreated,
        }]);
    }

    /// Look up a subscriber, creating and registering it through the factory
    /// for its qualifier on first use.
    ///
    /// Factory failures are logged and reported as absence.
    pub fn subscriber(&self, id: &SubscriberId) -> Option<Arc<dyn Subscriber>> {
        if let Some(existing) = read(&self.subscribers).get(id).cloned() {
            return Some(existing);
        }

        let factory = read(&self.factories).get(&id.qualifier).cloned()?;
        match factory.create(id) {
            Ok(Some(subscriber)) => {
                self.register_subscriber(Arc::clone(&subscriber));
                Some(subscriber)
            }
            Ok(None) => None,
            Err(err) => {
                tracing::error!(subscriber = %id, error = %err, "subscriber factory failed");
                None
            }
        }
    }

    /// All registered subscribers, sorted by id.
    pub fn subscribers(&self) -> Vec<Arc<dyn Subscriber>> {
        let mut all: Vec<_> = read(&self.subscribers)
            .iter()
            .map(|(id, s)| (id.clone(), Arc::clone(s)))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all.into_iter().map(|(_, s)| s).collect()
    }

    // -----------------------------------------------------------------------
    // 4. Listeners
    // -----------------------------------------------------------------------

    pub fn add_listener<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&[TeamDelta]) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(listener)));
        id
    }

    /// Returns `true` if the listener was registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    fn fire(&self, deltas: &[TeamDelta]) {
        // Snapshot so listeners may add or remove listeners re-entrantly.
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();
        for listener in listeners {
            listener(deltas);
        }
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("projects", &self.projects())
            .finish_non_exhaustive()
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
