//! Edits the user made to proposed file contents but has not applied yet.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::diff::FileDiff;

/// Holds hand-edited contents per diff target until the patch is applied.
#[derive(Debug, Default)]
pub struct Patcher {
    cached: Mutex<HashMap<PathBuf, String>>,
}

impl Patcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache_contents(&self, diff: &FileDiff, contents: impl Into<String>) {
        let Some(path) = diff.target_path() else {
            return;
        };
        debug!(file = %path.display(), "caching edited contents");
        self.table().insert(path.to_path_buf(), contents.into());
    }

    pub fn has_cached_contents(&self, diff: &FileDiff) -> bool {
        diff.target_path()
            .is_some_and(|path| self.table().contains_key(path))
    }

    pub fn cached_contents(&self, diff: &FileDiff) -> Option<String> {
        let path = diff.target_path()?;
        self.table().get(path).cloned()
    }

    /// Forget the edits for one diff. Returns `true` if any were cached.
    pub fn clear_cached_contents(&self, diff: &FileDiff) -> bool {
        diff.target_path()
            .is_some_and(|path| self.table().remove(path).is_some())
    }

    pub fn clear_all(&self) {
        self.table().clear();
    }

    pub fn cached_paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.table().keys().cloned().collect();
        paths.sort();
        paths
    }

    fn table(&self) -> MutexGuard<'_, HashMap<PathBuf, String>> {
        self.cached.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_is_keyed_by_target() {
        let patcher = Patcher::new();
        let a = FileDiff::from_contents("a.txt", Some("1\n"), Some("2\n"));
        let b = FileDiff::from_contents("b.txt", Some("1\n"), Some("2\n"));

        patcher.cache_contents(&a, "edited");
        assert!(patcher.has_cached_contents(&a));
        assert!(!patcher.has_cached_contents(&b));
        assert_eq!(patcher.cached_contents(&a).as_deref(), Some("edited"));

        assert!(patcher.clear_cached_contents(&a));
        assert!(!patcher.clear_cached_contents(&a));
        assert!(patcher.cached_paths().is_empty());
    }
}
