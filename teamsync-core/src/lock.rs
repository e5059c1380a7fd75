//! Scope-keyed mutual exclusion.
//!
//! A scope (by default a provider's project) may be held by one operation at a
//! time. Waiters poll the caller's monitor for cancellation while blocked.
//! Scopes are not re-entrant: acquiring a scope already held by the current
//! thread blocks until the caller cancels.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::TeamError;
use crate::progress::{check_cancelled, ProgressMonitor};
use crate::types::ProjectName;

/// Default interval at which a blocked waiter re-checks cancellation.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Key identifying a mutual-exclusion scope.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScopeKey(pub String);

impl fmt::Display for ScopeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&ProjectName> for ScopeKey {
    fn from(project: &ProjectName) -> Self {
        Self(format!("project:{project}"))
    }
}

impl From<&str> for ScopeKey {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Table of currently held scopes.
#[derive(Debug)]
pub struct ScopeLocks {
    held: Mutex<HashSet<ScopeKey>>,
    released: Condvar,
    poll_interval: Duration,
}

impl Default for ScopeLocks {
    fn default() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }
}

impl ScopeLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            held: Mutex::new(HashSet::new()),
            released: Condvar::new(),
            poll_interval,
        }
    }

    /// Block until `scope` is free, then hold it until the guard drops.
    ///
    /// Returns [`TeamError::Cancelled`] if `progress` is cancelled before the
    /// scope becomes available.
    pub fn acquire(
        &self,
        scope: ScopeKey,
        progress: &dyn ProgressMonitor,
    ) -> Result<ScopeGuard<'_>, TeamError> {
        let mut held = self.table();
        loop {
            check_cancelled(progress)?;
            if held.insert(scope.clone()) {
                tracing::trace!(scope = %scope, "scope acquired");
                return Ok(ScopeGuard { locks: self, scope });
            }
            let (guard, _) = self
                .released
                .wait_timeout(held, self.poll_interval)
                .unwrap_or_else(PoisonError::into_inner);
            held = guard;
        }
    }

    /// `true` while some guard holds `scope`.
    pub fn is_held(&self, scope: &ScopeKey) -> bool {
        self.table().contains(scope)
    }

    fn release(&self, scope: &ScopeKey) {
        self.table().remove(scope);
        self.released.notify_all();
        tracing::trace!(scope = %scope, "scope released");
    }

    // The set stays consistent even if a holder panicked, so poisoning is
    // ignored.
    fn table(&self) -> MutexGuard<'_, HashSet<ScopeKey>> {
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds a scope; releases it on drop.
#[derive(Debug)]
pub struct ScopeGuard<'a> {
    locks: &'a ScopeLocks,
    scope: ScopeKey,
}

impl ScopeGuard<'_> {
    pub fn scope(&self) -> &ScopeKey {
        &self.scope
    }
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.locks.release(&self.scope);
    }
}
