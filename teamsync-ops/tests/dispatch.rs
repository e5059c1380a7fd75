//! Dispatcher behavior across providers: batching, locking, progress,
//! cancellation and failure.

use std::sync::{Arc, Mutex};

use teamsync_core::{
    CancellationToken, Depth, DispatchConfig, ProgressMonitor, ProjectName, ProviderHandle,
    ProviderRegistry, ProviderType, ProviderTypeId, RecordingProgress, RepositoryLocation,
    Resource, ResourceTraversal, ScopeKey, ScopeLocks, ServerStatus, TeamError,
};
use teamsync_ops::{BatchKind, Dispatcher, ProviderOperation};

struct Cvs;

impl ProviderType for Cvs {
    fn id(&self) -> ProviderTypeId {
        ProviderTypeId::from("cvs")
    }
}

fn registry(projects: &[&str]) -> Arc<ProviderRegistry> {
    let registry = ProviderRegistry::new();
    registry.register_type(Arc::new(Cvs));
    for project in projects {
        registry
            .map(
                ProjectName::from(*project),
                &ProviderTypeId::from("cvs"),
                RepositoryLocation::from(":pserver:cvs.example.org:/cvsroot"),
                *project,
            )
            .expect("map");
    }
    Arc::new(registry)
}

fn scope(project: &str) -> ScopeKey {
    ScopeKey::from(&ProjectName::from(project))
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Call {
    project: String,
    recurse: Option<bool>,
    paths: Vec<String>,
    own_scope_held: bool,
    other_scopes_held: usize,
}

/// Operation that records every batch and can be told to fail or cancel.
struct Recorder {
    locks: Arc<ScopeLocks>,
    projects: Vec<String>,
    calls: Mutex<Vec<Call>>,
    fail_on: Option<String>,
    cancel_after_first: Option<CancellationToken>,
}

impl Recorder {
    fn new(locks: Arc<ScopeLocks>, projects: &[&str]) -> Self {
        Self {
            locks,
            projects: projects.iter().map(|p| p.to_string()).collect(),
            calls: Mutex::new(Vec::new()),
            fail_on: None,
            cancel_after_first: None,
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, provider: &ProviderHandle, recurse: Option<bool>, resources: &[Resource]) {
        let own = provider.project().to_string();
        let other_scopes_held = self
            .projects
            .iter()
            .filter(|p| **p != own)
            .filter(|p| self.locks.is_held(&scope(p)))
            .count();
        self.calls.lock().unwrap().push(Call {
            project: own,
            recurse,
            paths: resources.iter().map(|r| r.path.clone()).collect(),
            own_scope_held: self.locks.is_held(&provider.project_scope()),
            other_scopes_held,
        });
    }
}

impl ProviderOperation for Recorder {
    fn name(&self) -> &str {
        "record"
    }

    fn task_name(&self, provider: &ProviderHandle) -> String {
        format!("Recording {}", provider.project())
    }

    fn execute_batch(
        &self,
        provider: &ProviderHandle,
        resources: &[Resource],
        recurse: bool,
        progress: &dyn ProgressMonitor,
    ) -> Result<(), TeamError> {
        self.record(provider, Some(recurse), resources);
        progress.begin_task("", 4);
        progress.worked(4);
        if let Some(token) = &self.cancel_after_first {
            token.cancel();
        }
        if self.fail_on.as_deref() == Some(provider.project().0.as_str()) {
            return Err(TeamError::ServerProtocol {
                status: ServerStatus::new(1, "rejected"),
            });
        }
        Ok(())
    }

    fn handle_nontraversed_folders(
        &self,
        provider: &ProviderHandle,
        folders: &[Resource],
        _progress: &dyn ProgressMonitor,
    ) -> Result<(), TeamError> {
        self.record(provider, None, folders);
        Ok(())
    }
}

fn p1_p2_traversals() -> Vec<ResourceTraversal> {
    vec![
        ResourceTraversal::new(
            vec![Resource::file("p1", "a"), Resource::file("p1", "b")],
            Depth::Item,
        ),
        ResourceTraversal::new(vec![Resource::folder("p1", "F1")], Depth::OneLevel),
        ResourceTraversal::new(vec![Resource::folder("p2", "G1")], Depth::FullSubtree),
    ]
}

// ---------------------------------------------------------------------------
// 1. Batching and progress
// ---------------------------------------------------------------------------

#[test]
fn two_providers_one_batch_each() {
    let registry = registry(&["p1", "p2"]);
    let locks = Arc::new(ScopeLocks::new());
    let dispatcher = Dispatcher::new(registry, locks.clone());
    let op = Recorder::new(locks.clone(), &["p1", "p2"]);
    let progress = RecordingProgress::new();

    let report = dispatcher
        .execute(&op, &p1_p2_traversals(), &progress)
        .expect("dispatch");

    let calls = op.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].project, "p1");
    assert_eq!(calls[0].recurse, Some(false));
    assert_eq!(calls[0].paths, vec!["F1", "a", "b"]);
    assert_eq!(calls[1].project, "p2");
    assert_eq!(calls[1].recurse, Some(true));
    assert_eq!(calls[1].paths, vec!["G1"]);

    for call in &calls {
        assert!(call.own_scope_held, "batch ran outside its provider lock");
        assert_eq!(call.other_scopes_held, 0, "lock held across providers");
    }
    assert!(!locks.is_held(&scope("p1")));
    assert!(!locks.is_held(&scope("p2")));

    assert_eq!(report.units_charged(), 200);
    assert_eq!(report.runs[0].batches[0].kind, BatchKind::Shallow);
    assert_eq!(report.runs[1].batches[0].kind, BatchKind::Deep);

    let record = progress.snapshot();
    assert_eq!(record.total, 2000);
    assert_eq!(record.worked, 2000);
    assert!(record.done);
    assert!(record.task_names.contains(&"Recording p1".to_string()));
}

#[test]
fn deep_shallow_then_nontraversed_in_order() {
    let registry = registry(&["p"]);
    let locks = Arc::new(ScopeLocks::new());
    let dispatcher = Dispatcher::new(registry, locks.clone());
    let op = Recorder::new(locks, &["p"]);

    let traversals = vec![
        ResourceTraversal::new(vec![Resource::folder("p", "Z")], Depth::Item),
        ResourceTraversal::new(vec![Resource::folder("p", "F")], Depth::OneLevel),
        ResourceTraversal::new(vec![Resource::folder("p", "D")], Depth::FullSubtree),
    ];
    let report = dispatcher
        .execute(&op, &traversals, &RecordingProgress::new())
        .expect("dispatch");

    let order: Vec<Option<bool>> = op.calls().iter().map(|c| c.recurse).collect();
    assert_eq!(order, vec![Some(true), Some(false), None]);
    assert_eq!(report.units_charged(), 210);
}

#[test]
fn unowned_resources_are_skipped() {
    let registry = registry(&["p1"]);
    let locks = Arc::new(ScopeLocks::new());
    let dispatcher = Dispatcher::new(registry, locks.clone());
    let op = Recorder::new(locks, &["p1"]);

    let traversals = vec![ResourceTraversal::new(
        vec![Resource::file("p1", "a"), Resource::file("elsewhere", "b")],
        Depth::Item,
    )];
    let report = dispatcher
        .execute(&op, &traversals, &RecordingProgress::new())
        .expect("dispatch");

    assert_eq!(report.runs.len(), 1);
    assert_eq!(op.calls()[0].paths, vec!["a"]);
}

#[test]
fn configured_weights_are_used() {
    let registry = registry(&["p1", "p2"]);
    let config = DispatchConfig {
        provider_budget: 500,
        batch_units: 40,
        ..DispatchConfig::default()
    };
    let dispatcher = Dispatcher::from_config(registry, config);
    let op = Recorder::new(dispatcher.locks().clone(), &["p1", "p2"]);
    let progress = RecordingProgress::new();

    let report = dispatcher
        .execute(&op, &p1_p2_traversals(), &progress)
        .expect("dispatch");
    assert_eq!(report.units_charged(), 80);
    assert_eq!(progress.snapshot().total, 1000);
}

#[test]
fn empty_input_does_nothing() {
    let dispatcher = Dispatcher::new(registry(&["p1"]), Arc::new(ScopeLocks::new()));
    let op = Recorder::new(dispatcher.locks().clone(), &["p1"]);
    let progress = RecordingProgress::new();
    let report = dispatcher.execute(&op, &[], &progress).expect("dispatch");
    assert!(report.runs.is_empty());
    assert_eq!(progress.snapshot().total, 0);
    assert!(op.calls().is_empty());
}

// ---------------------------------------------------------------------------
// 2. Failure and cancellation
// ---------------------------------------------------------------------------

#[test]
fn failure_stops_later_providers_and_releases_lock() {
    let registry = registry(&["p1", "p2"]);
    let locks = Arc::new(ScopeLocks::new());
    let dispatcher = Dispatcher::new(registry, locks.clone());
    let mut op = Recorder::new(locks.clone(), &["p1", "p2"]);
    op.fail_on = Some("p1".to_string());

    let err = dispatcher
        .execute(&op, &p1_p2_traversals(), &RecordingProgress::new())
        .unwrap_err();
    assert!(matches!(err, TeamError::ServerProtocol { .. }), "got: {err}");
    assert_eq!(op.calls().len(), 1);
    assert!(!locks.is_held(&scope("p1")));
}

#[test]
fn cancellation_stops_before_next_provider() {
    let registry = registry(&["p1", "p2"]);
    let locks = Arc::new(ScopeLocks::new());
    let dispatcher = Dispatcher::new(registry, locks.clone());
    let progress = RecordingProgress::new();
    let mut op = Recorder::new(locks.clone(), &["p1", "p2"]);
    op.cancel_after_first = Some(progress.token());

    let err = dispatcher
        .execute(&op, &p1_p2_traversals(), &progress)
        .unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(op.calls().len(), 1);
    assert!(!locks.is_held(&scope("p1")));
    assert!(progress.snapshot().done);
}

#[test]
fn cancelled_before_start_runs_nothing() {
    let registry = registry(&["p1"]);
    let locks = Arc::new(ScopeLocks::new());
    let dispatcher = Dispatcher::new(registry, locks.clone());
    let token = CancellationToken::new();
    token.cancel();
    let op = Recorder::new(locks, &["p1"]);

    let err = dispatcher
        .execute(&op, &p1_p2_traversals(), &RecordingProgress::with_token(token))
        .unwrap_err();
    assert!(err.is_cancelled());
    assert!(op.calls().is_empty());
}

// ---------------------------------------------------------------------------
// 3. Lock release and final progress
// ---------------------------------------------------------------------------

/// Parent monitor noting whether the provider scope was held on each charge.
struct LockWatch {
    locks: Arc<ScopeLocks>,
    key: ScopeKey,
    token: CancellationToken,
    charges: Mutex<Vec<(u64, bool)>>,
}

impl ProgressMonitor for LockWatch {
    fn begin_task(&self, _name: &str, _total_units: u64) {}

    fn worked(&self, units: u64) {
        let held = self.locks.is_held(&self.key);
        self.charges.lock().unwrap().push((units, held));
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    fn done(&self) {}
}

#[test]
fn provider_remainder_is_charged_after_lock_release() {
    let registry = registry(&["p"]);
    let locks = Arc::new(ScopeLocks::new());
    let dispatcher = Dispatcher::new(registry, locks.clone());
    let watch = LockWatch {
        locks: locks.clone(),
        key: scope("p"),
        token: CancellationToken::new(),
        charges: Mutex::new(Vec::new()),
    };
    let mut op = Recorder::new(locks.clone(), &["p"]);
    op.cancel_after_first = Some(watch.token.clone());

    let traversals = vec![
        ResourceTraversal::new(vec![Resource::folder("p", "D")], Depth::FullSubtree),
        ResourceTraversal::new(vec![Resource::folder("p", "F")], Depth::OneLevel),
    ];
    let err = dispatcher.execute(&op, &traversals, &watch).unwrap_err();
    assert!(err.is_cancelled());
    assert_eq!(op.calls().len(), 1, "shallow batch must not run");

    let charges = watch.charges.lock().unwrap().clone();
    assert_eq!(charges.iter().map(|(u, _)| u).sum::<u64>(), 1000);
    assert_eq!(charges.first(), Some(&(500, true)));
    assert_eq!(charges.last(), Some(&(500, false)));
}

#[test]
fn with_config_keeps_shared_lock_table() {
    let locks = Arc::new(ScopeLocks::new());
    let config = DispatchConfig {
        lock_poll_interval_ms: 5,
        ..DispatchConfig::default()
    };
    let dispatcher = Dispatcher::new(registry(&["p1"]), locks.clone()).with_config(config.clone());
    assert!(Arc::ptr_eq(dispatcher.locks(), &locks));
    assert_eq!(dispatcher.config(), &config);
}
