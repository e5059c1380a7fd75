//! Invalidating cached remote state after an update.

use teamsync_core::{ProgressMonitor, ProviderHandle, Resource, SubProgress, TeamError};
use tracing::warn;

/// Units charged per resource of an updated batch.
pub const REFRESH_UNITS: u64 = 100;

/// Workspace-wide cache of what the server holds.
pub trait RemoteStateCache: Send + Sync {
    fn refresh(
        &self,
        provider: &ProviderHandle,
        folder: &Resource,
        deep: bool,
        progress: &dyn ProgressMonitor,
    ) -> Result<(), TeamError>;
}

/// Refresh every updated folder, always deeply.
///
/// Stale remote state can sit at any depth below an updated folder, so the
/// batch's own recursion flag is not consulted. Failures are logged and
/// swallowed; files are only charged.
pub fn refresh_after_update(
    cache: &dyn RemoteStateCache,
    provider: &ProviderHandle,
    resources: &[Resource],
    progress: &dyn ProgressMonitor,
) {
    progress.begin_task("", REFRESH_UNITS * resources.len() as u64);
    for resource in resources {
        if !resource.is_container() {
            progress.worked(REFRESH_UNITS);
            continue;
        }
        let sub = SubProgress::new(progress, REFRESH_UNITS);
        if let Err(e) = cache.refresh(provider, resource, true, &sub) {
            warn!(provider = %provider, folder = %resource, error = %e, "remote state refresh failed");
        }
        sub.done();
    }
    progress.done();
}
