//! File diffs and their hunks.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use similar::{ChangeTag, TextDiff};

/// Structural kind of a file diff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffType {
    Addition,
    Deletion,
    Change,
    /// Binary or otherwise opaque diff; classified as a change.
    Opaque,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Context,
    Removed,
    Added,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HunkLine {
    pub kind: LineKind,
    pub text: String,
}

/// A contiguous block of changes with surrounding context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// 1-based first line in the old text.
    pub old_start: usize,
    /// 1-based first line in the new text.
    pub new_start: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    pub fn old_lines(&self) -> Vec<&str> {
        self.side(LineKind::Removed)
    }

    pub fn new_lines(&self) -> Vec<&str> {
        self.side(LineKind::Added)
    }

    /// Lines the target must contain for the hunk to apply.
    pub fn expected_lines(&self, reversed: bool) -> Vec<&str> {
        if reversed {
            self.new_lines()
        } else {
            self.old_lines()
        }
    }

    fn side(&self, changed: LineKind) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| l.kind == LineKind::Context || l.kind == changed)
            .map(|l| l.text.as_str())
            .collect()
    }

    /// `@@ -a,b +c,d @@` followed by the hunk lines.
    pub fn unified(&self) -> String {
        let mut out = format!(
            "@@ -{},{} +{},{} @@\n",
            self.old_start,
            self.old_lines().len(),
            self.new_start,
            self.new_lines().len()
        );
        for line in &self.lines {
            let sign = match line.kind {
                LineKind::Context => ' ',
                LineKind::Removed => '-',
                LineKind::Added => '+',
            };
            let _ = writeln!(out, "{sign}{}", line.text);
        }
        out
    }
}

/// The changes a patch makes to one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    old_path: Option<PathBuf>,
    new_path: Option<PathBuf>,
    opaque: bool,
    hunks: Vec<Hunk>,
}

impl FileDiff {
    /// A missing `old_path` makes the diff an addition, a missing `new_path`
    /// a deletion.
    pub fn new(old_path: Option<PathBuf>, new_path: Option<PathBuf>, hunks: Vec<Hunk>) -> Self {
        Self {
            old_path,
            new_path,
            opaque: false,
            hunks,
        }
    }

    /// Diff whose content cannot be inspected (binary files).
    pub fn opaque(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            old_path: Some(path.clone()),
            new_path: Some(path),
            opaque: true,
            hunks: Vec::new(),
        }
    }

    /// Diff between two versions of the file at `path`. `None` means the file
    /// does not exist on that side.
    pub fn from_contents(path: impl Into<PathBuf>, old: Option<&str>, new: Option<&str>) -> Self {
        let path = path.into();
        let text = TextDiff::from_lines(old.unwrap_or_default(), new.unwrap_or_default());

        let mut hunks = Vec::new();
        for group in text.grouped_ops(3) {
            let Some(first) = group.first() else {
                continue;
            };
            let mut lines = Vec::new();
            for op in &group {
                for change in text.iter_changes(op) {
                    let kind = match change.tag() {
                        ChangeTag::Equal => LineKind::Context,
                        ChangeTag::Delete => LineKind::Removed,
                        ChangeTag::Insert => LineKind::Added,
                    };
                    lines.push(HunkLine {
                        kind,
                        text: change
                            .value()
                            .trim_end_matches(|c| c == '\n' || c == '\r')
                            .to_string(),
                    });
                }
            }
            hunks.push(Hunk {
                old_start: first.old_range().start + 1,
                new_start: first.new_range().start + 1,
                lines,
            });
        }

        Self::new(old.map(|_| path.clone()), new.map(|_| path), hunks)
    }

    pub fn hunks(&self) -> &[Hunk] {
        &self.hunks
    }

    /// Structural type as seen from the configured direction. Reversal swaps
    /// additions and deletions.
    pub fn diff_type(&self, reversed: bool) -> DiffType {
        if self.opaque {
            return DiffType::Opaque;
        }
        let forward = match (&self.old_path, &self.new_path) {
            (None, Some(_)) => DiffType::Addition,
            (Some(_), None) => DiffType::Deletion,
            _ => DiffType::Change,
        };
        match (forward, reversed) {
            (DiffType::Addition, true) => DiffType::Deletion,
            (DiffType::Deletion, true) => DiffType::Addition,
            (kind, _) => kind,
        }
    }

    /// Path of the file the patch is applied to.
    pub fn target_path(&self) -> Option<&Path> {
        self.new_path.as_deref().or(self.old_path.as_deref())
    }
}
