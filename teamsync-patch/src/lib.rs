//! Patch preview model: file diffs, hunk edits and change classification.

pub mod diff;
pub mod error;
pub mod hunk;
pub mod node;
pub mod notifier;
pub mod patcher;
pub mod result;

pub use diff::{DiffType, FileDiff, Hunk, HunkLine, LineKind};
pub use error::PatchError;
pub use hunk::{HunkEditor, HunkNode};
pub use node::{Classification, DiffKind, Direction, PatchFileDiffNode};
pub use notifier::{ContentChangeListener, ContentChangeNotifier};
pub use patcher::Patcher;
pub use result::{FileDiffResult, PatchConfiguration};
