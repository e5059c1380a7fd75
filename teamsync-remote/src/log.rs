//! Revision history entries returned by the `log` command.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sync_info::Tag;

/// One revision in a file's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub revision: String,
    pub author: String,
    pub date: DateTime<Utc>,
    pub comment: String,
    /// Server-side state of the revision (`Exp`, `dead`, ...).
    pub state: String,
    #[serde(default)]
    pub tags: Vec<Tag>,
}

impl LogEntry {
    /// `true` when the revision records a deletion.
    pub fn is_deletion(&self) -> bool {
        self.state == "dead"
    }
}
