//! Config loading and registry integration tests.

use std::sync::Arc;

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use rstest::rstest;
use teamsync_core::{
    Depth, DispatchConfig, ProjectName, ProviderRegistry, ProviderType, ProviderTypeId,
    RepositoryLocation, Resource, TeamError,
};

struct Cvs;

impl ProviderType for Cvs {
    fn id(&self) -> ProviderTypeId {
        ProviderTypeId::from("cvs")
    }
}

// ---------------------------------------------------------------------------
// 1. Config
// ---------------------------------------------------------------------------

#[test]
fn config_file_overrides_budget() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let file = home.child("teamsync").child("dispatch.yaml");
    file.write_str("provider_budget: 2000\nnontraversed_units: 25\n")
        .expect("write");

    let config = DispatchConfig::load_at(file.path()).expect("load");
    assert_eq!(config.provider_budget, 2000);
    assert_eq!(config.nontraversed_units, 25);
    assert_eq!(config.batch_units, 100);
}

#[test]
fn saved_config_is_plain_yaml() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let file = home.child("dispatch.yaml");
    DispatchConfig::default().save_at(file.path()).expect("save");
    file.assert(predicate::str::contains("provider_budget: 1000"));
    file.assert(predicate::str::contains("lock_poll_interval_ms: 50"));
}

#[test]
fn config_with_wrong_shape_is_a_parse_error() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let file = home.child("dispatch.yaml");
    file.write_str("- a list, not a mapping\n").expect("write");
    let err = DispatchConfig::load_at(file.path()).unwrap_err();
    assert!(matches!(err, TeamError::ConfigParse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Registry
// ---------------------------------------------------------------------------

fn registry_with(projects: &[&str]) -> ProviderRegistry {
    let registry = ProviderRegistry::new();
    registry.register_type(Arc::new(Cvs));
    for project in projects {
        registry
            .map(
                ProjectName::from(*project),
                &ProviderTypeId::from("cvs"),
                RepositoryLocation::from(":pserver:anon@cvs.example.org:/cvsroot"),
                format!("modules/{project}"),
            )
            .expect("map");
    }
    registry
}

#[rstest]
#[case(Resource::file("core", "src/lib.rs"), true)]
#[case(Resource::folder("core", "src"), true)]
#[case(Resource::project("core"), true)]
#[case(Resource::file("unshared", "README"), false)]
fn resolve_depends_only_on_project(#[case] resource: Resource, #[case] resolved: bool) {
    let registry = registry_with(&["core"]);
    assert_eq!(registry.resolve(&resource).is_some(), resolved);
}

#[test]
fn projects_are_listed_sorted() {
    let registry = registry_with(&["ui", "core", "docs"]);
    let names: Vec<String> = registry.projects().iter().map(|p| p.0.clone()).collect();
    assert_eq!(names, vec!["core", "docs", "ui"]);
}

#[test]
fn unmap_forgets_provider() {
    let registry = registry_with(&["core"]);
    let removed = registry.unmap(&ProjectName::from("core")).expect("was mapped");
    assert_eq!(removed.to_string(), "core:cvs");
    assert!(registry.resolve(&Resource::project("core")).is_none());
}

#[rstest]
#[case(0, Depth::Item)]
#[case(1, Depth::OneLevel)]
#[case(2, Depth::FullSubtree)]
#[case(99, Depth::FullSubtree)]
fn raw_depth_mapping(#[case] raw: i32, #[case] depth: Depth) {
    assert_eq!(Depth::from_raw(raw), depth);
}
