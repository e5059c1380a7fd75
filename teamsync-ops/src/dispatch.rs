//! Runs a provider operation once per provider, under that provider's scope
//! lock, with weighted progress and cooperative cancellation.

use std::sync::Arc;

use teamsync_core::{
    check_cancelled, DispatchConfig, ProgressMonitor, ProviderHandle, ProviderRegistry, Resource,
    ResourceTraversal, ScopeKey, ScopeLocks, SubProgress, TeamError,
};
use tracing::{debug, info};

use crate::traversal::{build_provider_traversals, ProviderTraversal};

/// A repository operation that can be applied to a batch of one provider's
/// resources.
pub trait ProviderOperation: Send + Sync {
    /// Short name of the whole operation, e.g. `update`.
    fn name(&self) -> &str;

    /// Progress label while working on `provider`.
    fn task_name(&self, provider: &ProviderHandle) -> String;

    /// Scope locked while `provider` is processed.
    fn scheduling_scope(&self, provider: &ProviderHandle) -> ScopeKey {
        provider.project_scope()
    }

    fn execute_batch(
        &self,
        provider: &ProviderHandle,
        resources: &[Resource],
        recurse: bool,
        progress: &dyn ProgressMonitor,
    ) -> Result<(), TeamError>;

    /// Folders that were requested at item depth. Ignored unless overridden.
    fn handle_nontraversed_folders(
        &self,
        _provider: &ProviderHandle,
        _folders: &[Resource],
        _progress: &dyn ProgressMonitor,
    ) -> Result<(), TeamError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Deep,
    Shallow,
    NonTraversed,
}

/// A batch that ran to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRecord {
    pub kind: BatchKind,
    pub resources: Vec<Resource>,
    pub units: u64,
}

/// Everything that ran for one provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRun {
    pub provider: ProviderHandle,
    pub batches: Vec<BatchRecord>,
}

impl ProviderRun {
    pub fn units(&self) -> u64 {
        self.batches.iter().map(|b| b.units).sum()
    }
}

/// What a dispatch did, in provider order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub runs: Vec<ProviderRun>,
}

impl DispatchReport {
    /// Batch units charged across all providers.
    pub fn units_charged(&self) -> u64 {
        self.runs.iter().map(ProviderRun::units).sum()
    }

    pub fn run_for(&self, provider: &ProviderHandle) -> Option<&ProviderRun> {
        self.runs.iter().find(|r| &r.provider == provider)
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct Dispatcher {
    registry: Arc<ProviderRegistry>,
    locks: Arc<ScopeLocks>,
    config: DispatchConfig,
}

impl Dispatcher {
    pub fn new(registry: Arc<ProviderRegistry>, locks: Arc<ScopeLocks>) -> Self {
        Self {
            registry,
            locks,
            config: DispatchConfig::default(),
        }
    }

    /// Dispatcher with its own lock table polling at the configured interval.
    pub fn from_config(registry: Arc<ProviderRegistry>, config: DispatchConfig) -> Self {
        let locks = Arc::new(ScopeLocks::with_poll_interval(config.lock_poll_interval()));
        Self {
            registry,
            locks,
            config,
        }
    }

    pub fn locks(&self) -> &Arc<ScopeLocks> {
        &self.locks
    }

    /// Replace the weights and budget. The lock table is shared with other
    /// dispatchers, so it keeps its own poll interval; use
    /// [`Dispatcher::from_config`] for a table polling at
    /// `lock_poll_interval_ms`.
    pub fn with_config(mut self, config: DispatchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Apply `operation` to every provider owning a resource in `traversals`.
    ///
    /// Stops at the first failing provider; providers already processed are
    /// not rolled back.
    pub fn execute(
        &self,
        operation: &dyn ProviderOperation,
        traversals: &[ResourceTraversal],
        progress: &dyn ProgressMonitor,
    ) -> Result<DispatchReport, TeamError> {
        let groups = build_provider_traversals(&self.registry, traversals);
        info!(
            operation = operation.name(),
            providers = groups.len(),
            "dispatching operation"
        );

        progress.begin_task(
            operation.name(),
            groups.len() as u64 * self.config.provider_budget,
        );
        let mut report = DispatchReport::default();
        let result = groups.iter().try_for_each(|(provider, group)| {
            check_cancelled(progress)?;
            let sub = SubProgress::new(progress, self.config.provider_budget);
            let run = self.execute_provider(operation, provider, group, &sub);
            sub.done();
            report.runs.push(run?);
            Ok(())
        });
        progress.done();

        result.map(|()| report)
    }

    fn execute_provider(
        &self,
        operation: &dyn ProviderOperation,
        provider: &ProviderHandle,
        group: &ProviderTraversal,
        progress: &dyn ProgressMonitor,
    ) -> Result<ProviderRun, TeamError> {
        let deep = group.deep_resources();
        let shallow = group.shallow_resources();
        let nontraversed = group.nontraversed_folders();

        let batch = self.config.batch_units;
        let units = [
            (!deep.is_empty(), batch),
            (!shallow.is_empty(), batch),
            (!nontraversed.is_empty(), self.config.nontraversed_units),
        ]
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, units)| units)
        .sum();
        let task_name = operation.task_name(provider);
        progress.begin_task(&task_name, units);
        progress.set_task_name(&task_name);

        let guard = self.locks.acquire(operation.scheduling_scope(provider), progress)?;
        debug!(
            provider = %provider,
            deep = deep.len(),
            shallow = shallow.len(),
            nontraversed = nontraversed.len(),
            "provider scope acquired"
        );

        let result = self.run_batches(operation, provider, [deep, shallow, nontraversed], progress);
        drop(guard);
        progress.done();
        result
    }

    /// Deep, shallow and non-traversed batches, in that order. Runs while the
    /// provider's scope is held.
    fn run_batches(
        &self,
        operation: &dyn ProviderOperation,
        provider: &ProviderHandle,
        [deep, shallow, nontraversed]: [Vec<Resource>; 3],
        progress: &dyn ProgressMonitor,
    ) -> Result<ProviderRun, TeamError> {
        let batch = self.config.batch_units;
        let mut run = ProviderRun {
            provider: provider.clone(),
            batches: Vec::new(),
        };

        if !deep.is_empty() {
            run_batch(progress, batch, |sub| {
                operation.execute_batch(provider, &deep, true, sub)
            })?;
            run.batches.push(BatchRecord {
                kind: BatchKind::Deep,
                resources: deep,
                units: batch,
            });
        }
        if !shallow.is_empty() {
            run_batch(progress, batch, |sub| {
                operation.execute_batch(provider, &shallow, false, sub)
            })?;
            run.batches.push(BatchRecord {
                kind: BatchKind::Shallow,
                resources: shallow,
                units: batch,
            });
        }
        if !nontraversed.is_empty() {
            let units = self.config.nontraversed_units;
            run_batch(progress, units, |sub| {
                operation.handle_nontraversed_folders(provider, &nontraversed, sub)
            })?;
            run.batches.push(BatchRecord {
                kind: BatchKind::NonTraversed,
                resources: nontraversed,
                units,
            });
        }
        Ok(run)
    }
}

/// Run one batch on a sub-monitor of `units`, checking cancellation first.
fn run_batch<F>(progress: &dyn ProgressMonitor, units: u64, f: F) -> Result<(), TeamError>
where
    F: FnOnce(&dyn ProgressMonitor) -> Result<(), TeamError>,
{
    check_cancelled(progress)?;
    let sub = SubProgress::new(progress, units);
    let result = f(&sub);
    sub.done();
    result
}
