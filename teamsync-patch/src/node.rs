//! Classification of one file in a patch, kept current under hunk edits.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tracing::debug;

use crate::diff::DiffType;
use crate::hunk::HunkNode;
use crate::notifier::{ContentChangeListener, ContentChangeNotifier};
use crate::patcher::Patcher;
use crate::result::FileDiffResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffKind {
    NoChange,
    Addition,
    Deletion,
    Change,
}

impl From<DiffType> for DiffKind {
    fn from(diff_type: DiffType) -> Self {
        match diff_type {
            DiffType::Addition => DiffKind::Addition,
            DiffType::Deletion => DiffKind::Deletion,
            DiffType::Change | DiffType::Opaque => DiffKind::Change,
        }
    }
}

/// Which side of the comparison the change applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Applying the patch changes the workspace.
    Incoming,
    /// The workspace already holds the change; the patch would undo it.
    Outgoing,
}

impl Direction {
    pub fn from_reversed(reversed: bool) -> Self {
        if reversed {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Classification {
    pub kind: DiffKind,
    pub direction: Direction,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({:?})", self.kind, self.direction)
    }
}

/// Diff node for one file of a patch.
///
/// The kind is recomputed on every [`PatchFileDiffNode::kind`] call. Edits to
/// unmatched hunks only re-fire this node's change notifier.
pub struct PatchFileDiffNode {
    result: FileDiffResult,
    patcher: Arc<Patcher>,
    children: Mutex<Vec<HunkNode>>,
    changes: ContentChangeNotifier,
    me: Weak<PatchFileDiffNode>,
}

impl PatchFileDiffNode {
    pub fn new(result: FileDiffResult, patcher: Arc<Patcher>) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            result,
            patcher,
            children: Mutex::new(Vec::new()),
            changes: ContentChangeNotifier::new(),
            me: me.clone(),
        })
    }

    /// Node with one hunk node per hunk of the diff. Matched hunks are plain;
    /// unmatched ones are editable.
    pub fn with_hunks(result: FileDiffResult, patcher: Arc<Patcher>) -> Arc<Self> {
        let hunks: Vec<HunkNode> = result
            .diff()
            .hunks()
            .iter()
            .enumerate()
            .map(|(i, hunk)| {
                if result.is_hunk_matched(i) {
                    HunkNode::new(hunk.clone(), true)
                } else {
                    HunkNode::editable(hunk.clone())
                }
            })
            .collect();
        let node = Self::new(result, patcher);
        for hunk in hunks {
            node.add(hunk);
        }
        node
    }

    pub fn result(&self) -> &FileDiffResult {
        &self.result
    }

    /// Classification without the edit override.
    pub fn base_kind(&self) -> DiffKind {
        if !self.result.has_matches() {
            return DiffKind::NoChange;
        }
        let reversed = self.result.config().reversed;
        DiffKind::from(self.result.diff().diff_type(reversed))
    }

    /// Current classification.
    ///
    /// A diff with no applicable hunks still counts as a change while the
    /// patcher holds hand-edited contents for it.
    pub fn kind(&self) -> Classification {
        let mut kind = self.base_kind();
        if kind == DiffKind::NoChange && self.patcher.has_cached_contents(self.result.diff()) {
            kind = DiffKind::Change;
        }
        Classification {
            kind,
            direction: Direction::from_reversed(self.result.config().reversed),
        }
    }

    /// Attach a hunk. Edits to an unmatched hunk's editable side re-fire this
    /// node's change notifier.
    pub fn add(&self, hunk: HunkNode) {
        if !hunk.is_matched() {
            if let (Some(notifier), Some(me)) = (hunk.change_notifier(), self.me.upgrade()) {
                let listener: Arc<dyn ContentChangeListener> = me;
                notifier.subscribe(&listener);
            }
        }
        self.children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(hunk);
    }

    pub fn children(&self) -> Vec<HunkNode> {
        self.children
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Channel fired when an attached hunk is edited.
    pub fn change_notifier(&self) -> &ContentChangeNotifier {
        &self.changes
    }

    /// `true` when the patch target exists on disk as a file.
    pub fn file_exists(&self) -> bool {
        self.result.target_path().is_some_and(|p| p.is_file())
    }
}

impl ContentChangeListener for PatchFileDiffNode {
    fn content_changed(&self, _source: &ContentChangeNotifier) {
        debug!(
            file = ?self.result.target_path(),
            "hunk edited, firing input change"
        );
        self.changes.notify();
    }
}

impl fmt::Debug for PatchFileDiffNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PatchFileDiffNode")
            .field("target", &self.result.target_path())
            .field("kind", &self.kind())
            .finish()
    }
}
