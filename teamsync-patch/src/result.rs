//! Matching a [`FileDiff`] against the workspace.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::diff::{FileDiff, Hunk};
use crate::error::{io_err, PatchError};

/// How a patch is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PatchConfiguration {
    /// Apply the patch backwards.
    pub reversed: bool,
}

impl PatchConfiguration {
    pub fn reversed() -> Self {
        Self { reversed: true }
    }
}

/// A file diff together with which of its hunks match the target.
#[derive(Debug, Clone)]
pub struct FileDiffResult {
    diff: Arc<FileDiff>,
    config: PatchConfiguration,
    matched: Vec<bool>,
    target: Option<PathBuf>,
}

impl FileDiffResult {
    /// Result with explicit per-hunk match flags.
    pub fn new(diff: Arc<FileDiff>, config: PatchConfiguration, matched: Vec<bool>) -> Self {
        let target = diff.target_path().map(Path::to_path_buf);
        Self {
            diff,
            config,
            matched,
            target,
        }
    }

    /// Match every hunk against `target` text. `None` means the target file
    /// does not exist.
    pub fn against_contents(
        diff: Arc<FileDiff>,
        config: PatchConfiguration,
        target: Option<&str>,
    ) -> Self {
        let lines: Vec<&str> = target.map(|t| t.lines().collect()).unwrap_or_default();
        let matched = diff
            .hunks()
            .iter()
            .map(|h| hunk_matches(h, &lines, config.reversed, target.is_some()))
            .collect();
        Self::new(diff, config, matched)
    }

    /// Match against the file at `path` on disk.
    pub fn against_file(
        diff: Arc<FileDiff>,
        config: PatchConfiguration,
        path: &Path,
    ) -> Result<Self, PatchError> {
        let contents = match fs::read(path) {
            Ok(bytes) => Some(String::from_utf8(bytes).map_err(|_| PatchError::NotText {
                path: path.to_path_buf(),
            })?),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(io_err(path, e)),
        };
        let mut result = Self::against_contents(diff, config, contents.as_deref());
        result.target = Some(path.to_path_buf());
        debug!(
            file = %path.display(),
            matched = result.matched_count(),
            hunks = result.matched.len(),
            "matched patch against file"
        );
        Ok(result)
    }

    pub fn diff(&self) -> &Arc<FileDiff> {
        &self.diff
    }

    pub fn config(&self) -> PatchConfiguration {
        self.config
    }

    pub fn target_path(&self) -> Option<&Path> {
        self.target.as_deref()
    }

    pub fn is_hunk_matched(&self, index: usize) -> bool {
        self.matched.get(index).copied().unwrap_or(false)
    }

    pub fn matched_count(&self) -> usize {
        self.matched.iter().filter(|m| **m).count()
    }

    /// `true` if at least one hunk applies.
    pub fn has_matches(&self) -> bool {
        self.matched_count() > 0
    }
}

fn hunk_matches(hunk: &Hunk, target: &[&str], reversed: bool, exists: bool) -> bool {
    let expected = hunk.expected_lines(reversed);
    if expected.is_empty() {
        return !exists || target.is_empty();
    }
    target.windows(expected.len()).any(|w| w == expected.as_slice())
}
