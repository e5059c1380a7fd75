//! Tags and per-file sync information.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Revision reserved for entries added locally but never committed.
pub const ADDED_REVISION: &str = "0";

/// Keyword substitution mode used when the server decides.
pub const USE_SERVER_MODE: &str = "";

/// What a [`Tag`] name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    #[default]
    Head,
    Branch,
    Version,
    Date,
}

/// A symbolic or numeric point in repository history.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub kind: TagKind,
}

impl Tag {
    pub fn head() -> Self {
        Self {
            name: "HEAD".to_string(),
            kind: TagKind::Head,
        }
    }

    pub fn branch(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TagKind::Branch,
        }
    }

    /// A version tag; revision numbers are addressed this way.
    pub fn version(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TagKind::Version,
        }
    }

    pub fn is_head(&self) -> bool {
        self.kind == TagKind::Head
    }
}

impl Default for Tag {
    fn default() -> Self {
        Self::head()
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.name.fmt(f)
    }
}

/// Sync bookkeeping the workspace keeps for a managed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSyncInfo {
    pub name: String,
    pub revision: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    pub keyword_mode: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
}

impl ResourceSyncInfo {
    pub fn new(name: impl Into<String>, revision: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            revision: revision.into(),
            timestamp: None,
            keyword_mode: USE_SERVER_MODE.to_string(),
            tag: None,
        }
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = Some(tag);
        self
    }

    /// `true` for an entry added locally and not yet committed.
    pub fn is_added(&self) -> bool {
        self.revision == ADDED_REVISION
    }

    /// Copy of this info pointing at another revision.
    pub fn with_revision(&self, revision: impl Into<String>) -> Self {
        Self {
            revision: revision.into(),
            ..self.clone()
        }
    }
}
