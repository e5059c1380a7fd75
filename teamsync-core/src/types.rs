//! Domain types shared by every teamsync crate.
//!
//! Resource paths are logical workspace paths (`/`-separated, relative to the
//! owning project), not filesystem paths. The local filesystem location of a
//! resource is only known to the resource handle layer.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed name for a workspace project.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProjectName(pub String);

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProjectName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProjectName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Identifier of a repository provider type (e.g. `"cvs"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProviderTypeId(pub String);

impl fmt::Display for ProviderTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ProviderTypeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ProviderTypeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Location of a remote repository (e.g. `":pserver:anon@host:/cvsroot"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepositoryLocation(pub String);

impl fmt::Display for RepositoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepositoryLocation {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepositoryLocation {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Traversal scope requested for a resource, ordered from shallowest to
/// deepest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    /// The resource itself.
    Item,
    /// The resource and its immediate children.
    OneLevel,
    /// The resource and all of its descendants.
    #[default]
    FullSubtree,
}

impl Depth {
    /// Map a raw host depth value (`0`, `1`, `2`).
    ///
    /// Values outside the three recognized levels are treated as a full
    /// subtree traversal.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => Depth::Item,
            1 => Depth::OneLevel,
            _ => Depth::FullSubtree,
        }
    }
}

impl fmt::Display for Depth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Depth::Item => write!(f, "item"),
            Depth::OneLevel => write!(f, "one_level"),
            Depth::FullSubtree => write!(f, "full_subtree"),
        }
    }
}

/// Kind of a workspace resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    File,
    Folder,
    Project,
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// A resource in the local workspace, identified by its project and its
/// project-relative path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Resource {
    pub project: ProjectName,
    /// Project-relative path; empty for the project itself.
    pub path: String,
    pub kind: ResourceKind,
}

impl Resource {
    pub fn file(project: impl Into<ProjectName>, path: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            path: normalize(path.into()),
            kind: ResourceKind::File,
        }
    }

    pub fn folder(project: impl Into<ProjectName>, path: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            path: normalize(path.into()),
            kind: ResourceKind::Folder,
        }
    }

    pub fn project(project: impl Into<ProjectName>) -> Self {
        Self {
            project: project.into(),
            path: String::new(),
            kind: ResourceKind::Project,
        }
    }

    /// Folders and projects are containers; files are not.
    pub fn is_container(&self) -> bool {
        !matches!(self.kind, ResourceKind::File)
    }

    /// Last path segment, or the project name for a project resource.
    pub fn name(&self) -> &str {
        match self.path.rsplit('/').next() {
            Some(last) if !last.is_empty() => last,
            _ => &self.project.0,
        }
    }

    /// Path segments relative to the project.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|s| !s.is_empty())
    }

    /// `/<project>/<path>` workspace path.
    pub fn full_path(&self) -> String {
        if self.path.is_empty() {
            format!("/{}", self.project)
        } else {
            format!("/{}/{}", self.project, self.path)
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}

fn normalize(path: String) -> String {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// A set of resources to visit at one depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceTraversal {
    pub resources: Vec<Resource>,
    pub depth: Depth,
}

impl ResourceTraversal {
    pub fn new(resources: Vec<Resource>, depth: Depth) -> Self {
        Self { resources, depth }
    }

    /// Projects touched by this traversal, in first-seen order.
    pub fn projects(&self) -> Vec<&ProjectName> {
        let mut seen: Vec<&ProjectName> = Vec::new();
        for resource in &self.resources {
            if !seen.contains(&&resource.project) {
                seen.push(&resource.project);
            }
        }
        seen
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(ProjectName::from("core").to_string(), "core");
        assert_eq!(ProviderTypeId::from("cvs").to_string(), "cvs");
        assert_eq!(
            RepositoryLocation::from(":pserver:anon@host:/root").to_string(),
            ":pserver:anon@host:/root"
        );
    }

    #[test]
    fn depth_from_raw_defaults_to_full_subtree() {
        assert_eq!(Depth::from_raw(0), Depth::Item);
        assert_eq!(Depth::from_raw(1), Depth::OneLevel);
        assert_eq!(Depth::from_raw(2), Depth::FullSubtree);
        assert_eq!(Depth::from_raw(7), Depth::FullSubtree);
        assert_eq!(Depth::from_raw(-1), Depth::FullSubtree);
    }

    #[test]
    fn resource_paths_are_normalized() {
        let file = Resource::file("core", "/src//./main.rs");
        assert_eq!(file.path, "src/main.rs");
        assert_eq!(file.name(), "main.rs");
        assert_eq!(file.full_path(), "/core/src/main.rs");
        assert_eq!(file.segments().collect::<Vec<_>>(), vec!["src", "main.rs"]);
    }

    #[test]
    fn project_resource_is_a_container_named_after_project() {
        let project = Resource::project("core");
        assert!(project.is_container());
        assert_eq!(project.name(), "core");
        assert_eq!(project.full_path(), "/core");
        assert!(!Resource::file("core", "a.txt").is_container());
    }

    #[test]
    fn traversal_projects_are_deduplicated_in_order() {
        let traversal = ResourceTraversal::new(
            vec![
                Resource::file("b", "x"),
                Resource::file("a", "y"),
                Resource::folder("b", "z"),
            ],
            Depth::Item,
        );
        let projects: Vec<_> = traversal.projects().into_iter().cloned().collect();
        assert_eq!(projects, vec![ProjectName::from("b"), ProjectName::from("a")]);
    }

    #[test]
    fn depth_serde_uses_snake_case() {
        let yaml = serde_yaml::to_string(&Depth::OneLevel).expect("serialize");
        assert_eq!(yaml.trim(), "one_level");
    }
}
