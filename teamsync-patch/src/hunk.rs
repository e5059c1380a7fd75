//! Hunk nodes: one patch hunk plus its editable side.

use std::sync::{Arc, Mutex, PoisonError};

use crate::diff::Hunk;
use crate::notifier::ContentChangeNotifier;

/// Text of a hunk that the user can edit in place.
#[derive(Debug)]
pub struct HunkEditor {
    text: Mutex<String>,
    notifier: ContentChangeNotifier,
}

impl HunkEditor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
            notifier: ContentChangeNotifier::new(),
        }
    }

    pub fn text(&self) -> String {
        self.text
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the text and notify subscribers.
    pub fn set_text(&self, text: impl Into<String>) {
        *self.text.lock().unwrap_or_else(PoisonError::into_inner) = text.into();
        self.notifier.notify();
    }

    pub fn notifier(&self) -> &ContentChangeNotifier {
        &self.notifier
    }
}

/// A hunk attached to a file diff node.
#[derive(Debug, Clone)]
pub struct HunkNode {
    hunk: Hunk,
    matched: bool,
    editor: Option<Arc<HunkEditor>>,
}

impl HunkNode {
    pub fn new(hunk: Hunk, matched: bool) -> Self {
        Self {
            hunk,
            matched,
            editor: None,
        }
    }

    /// Unmatched hunk whose text can be edited by hand.
    pub fn editable(hunk: Hunk) -> Self {
        Self::with_editor(hunk, false)
    }

    /// Hunk with an editable side seeded from its unified text.
    pub fn with_editor(hunk: Hunk, matched: bool) -> Self {
        let editor = Arc::new(HunkEditor::new(hunk.unified()));
        Self {
            hunk,
            matched,
            editor: Some(editor),
        }
    }

    pub fn hunk(&self) -> &Hunk {
        &self.hunk
    }

    pub fn is_matched(&self) -> bool {
        self.matched
    }

    pub fn editor(&self) -> Option<&Arc<HunkEditor>> {
        self.editor.as_ref()
    }

    /// Change channel of the editable side, if there is one.
    pub fn change_notifier(&self) -> Option<&ContentChangeNotifier> {
        self.editor.as_deref().map(HunkEditor::notifier)
    }
}
