//! Progress accounting and cooperative cancellation.
//!
//! Monitors take `&self` and use interior mutability so that a parent monitor
//! can be shared with the sub-monitors handed to nested work.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::TeamError;

/// Shared cancel flag. Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Progress sink supplied by the caller of a long-running operation.
pub trait ProgressMonitor: Send + Sync {
    /// Start a task of `total_units` work units.
    fn begin_task(&self, name: &str, total_units: u64);

    /// Rename the running task.
    fn set_task_name(&self, _name: &str) {}

    /// Report `units` of completed work.
    fn worked(&self, units: u64);

    /// `true` once the caller asked for cancellation.
    fn is_cancelled(&self) -> bool;

    /// Mark the task complete. Calling it more than once is harmless.
    fn done(&self);
}

/// Return [`TeamError::Cancelled`] if the monitor has been cancelled.
pub fn check_cancelled(progress: &dyn ProgressMonitor) -> Result<(), TeamError> {
    if progress.is_cancelled() {
        Err(TeamError::Cancelled)
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// NullProgress
// ---------------------------------------------------------------------------

/// Monitor that discards progress but still honors a cancellation token.
#[derive(Debug, Clone, Default)]
pub struct NullProgress {
    token: CancellationToken,
}

impl NullProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl ProgressMonitor for NullProgress {
    fn begin_task(&self, _name: &str, _total_units: u64) {}

    fn worked(&self, _units: u64) {}

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn done(&self) {}
}

// ---------------------------------------------------------------------------
// SubProgress
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct SubState {
    total: u64,
    worked: u64,
    reported: u64,
    done: bool,
}

/// A slice of a parent monitor.
///
/// The child's own `begin_task` total is scaled onto the `parent_units` it was
/// allotted; `done` charges whatever of the allotment is still unreported.
pub struct SubProgress<'a> {
    parent: &'a dyn ProgressMonitor,
    parent_units: u64,
    state: Mutex<SubState>,
}

impl<'a> SubProgress<'a> {
    pub fn new(parent: &'a dyn ProgressMonitor, parent_units: u64) -> Self {
        Self {
            parent,
            parent_units,
            state: Mutex::new(SubState::default()),
        }
    }

    fn report(&self, state: &mut SubState) {
        let target = if state.done {
            self.parent_units
        } else if state.total == 0 {
            0
        } else {
            self.parent_units.saturating_mul(state.worked) / state.total
        };
        if target > state.reported {
            self.parent.worked(target - state.reported);
            state.reported = target;
        }
    }
}

impl ProgressMonitor for SubProgress<'_> {
    fn begin_task(&self, _name: &str, total_units: u64) {
        if let Ok(mut state) = self.state.lock() {
            state.total = total_units;
            state.worked = 0;
        }
    }

    fn set_task_name(&self, name: &str) {
        self.parent.set_task_name(name);
    }

    fn worked(&self, units: u64) {
        if let Ok(mut state) = self.state.lock() {
            if state.done {
                return;
            }
            state.worked = state.worked.saturating_add(units).min(state.total);
            self.report(&mut state);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.parent.is_cancelled()
    }

    fn done(&self) {
        if let Ok(mut state) = self.state.lock() {
            if state.done {
                return;
            }
            state.done = true;
            self.report(&mut state);
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingProgress
// ---------------------------------------------------------------------------

/// Snapshot of what a [`RecordingProgress`] has seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressRecord {
    pub total: u64,
    pub worked: u64,
    pub task_names: Vec<String>,
    pub done: bool,
}

/// Monitor that records everything it is told. Used by hosts that want a
/// summary after the fact, and by tests.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    token: CancellationToken,
    record: Mutex<ProgressRecord>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: CancellationToken) -> Self {
        Self {
            token,
            record: Mutex::default(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn snapshot(&self) -> ProgressRecord {
        self.record
            .lock()
            .map(|record| record.clone())
            .unwrap_or_default()
    }
}

impl ProgressMonitor for RecordingProgress {
    fn begin_task(&self, name: &str, total_units: u64) {
        if let Ok(mut record) = self.record.lock() {
            record.total = total_units;
            if !name.is_empty() {
                record.task_names.push(name.to_string());
            }
        }
    }

    fn set_task_name(&self, name: &str) {
        if let Ok(mut record) = self.record.lock() {
            record.task_names.push(name.to_string());
        }
    }

    fn worked(&self, units: u64) {
        if let Ok(mut record) = self.record.lock() {
            record.worked += units;
        }
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn done(&self) {
        if let Ok(mut record) = self.record.lock() {
            record.done = true;
        }
    }
}
