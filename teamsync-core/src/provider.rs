//! Repository provider handles and provider types.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::error::TeamError;
use crate::lock::ScopeKey;
use crate::types::{ProjectName, ProviderTypeId, RepositoryLocation};

#[derive(Debug)]
struct ProviderInfo {
    type_id: ProviderTypeId,
    project: ProjectName,
    location: RepositoryLocation,
    root_path: String,
}

/// The provider owning version-control state for one project.
///
/// Cheap to clone. Identity (equality, hashing, ordering) is the pair
/// (project, provider type); ordering sorts by project first.
#[derive(Debug, Clone)]
pub struct ProviderHandle(Arc<ProviderInfo>);

impl ProviderHandle {
    pub fn new(
        type_id: impl Into<ProviderTypeId>,
        project: impl Into<ProjectName>,
        location: impl Into<RepositoryLocation>,
        root_path: impl Into<String>,
    ) -> Self {
        Self(Arc::new(ProviderInfo {
            type_id: type_id.into(),
            project: project.into(),
            location: location.into(),
            root_path: root_path.into(),
        }))
    }

    pub fn type_id(&self) -> &ProviderTypeId {
        &self.0.type_id
    }

    pub fn project(&self) -> &ProjectName {
        &self.0.project
    }

    /// Repository the project is shared with.
    pub fn location(&self) -> &RepositoryLocation {
        &self.0.location
    }

    /// Repository-relative path of the project root (the remote module).
    pub fn root_path(&self) -> &str {
        &self.0.root_path
    }

    /// Default mutual-exclusion scope: the owning project.
    pub fn project_scope(&self) -> ScopeKey {
        ScopeKey::from(self.project())
    }

    fn key(&self) -> (&ProjectName, &ProviderTypeId) {
        (&self.0.project, &self.0.type_id)
    }
}

impl PartialEq for ProviderHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for ProviderHandle {}

impl Hash for ProviderHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for ProviderHandle {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ProviderHandle {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for ProviderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0.project, self.0.type_id)
    }
}

/// A kind of repository provider that projects can be mapped to.
pub trait ProviderType: Send + Sync {
    fn id(&self) -> ProviderTypeId;

    /// Called when a project is mapped to this provider type. An error
    /// undoes the mapping.
    fn configure_project(&self, _provider: &ProviderHandle) -> Result<(), TeamError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    #[test]
    fn identity_ignores_location() {
        let a = ProviderHandle::new("cvs", "core", ":pserver:a:/root", "core");
        let b = ProviderHandle::new("cvs", "core", ":pserver:b:/other", "mod/core");
        assert_eq!(a, b);
    }

    #[test]
    fn ordering_is_by_project_then_type() {
        let set: BTreeSet<_> = [
            ProviderHandle::new("cvs", "zeta", "loc", "zeta"),
            ProviderHandle::new("svn", "alpha", "loc", "alpha"),
            ProviderHandle::new("cvs", "alpha", "loc", "alpha"),
        ]
        .into_iter()
        .collect();
        let names: Vec<String> = set.iter().map(ToString::to_string).collect();
        assert_eq!(names, vec!["alpha:cvs", "alpha:svn", "zeta:cvs"]);
    }

    #[test]
    fn default_scope_is_the_project() {
        let provider = ProviderHandle::new("cvs", "core", "loc", "core");
        assert_eq!(provider.project_scope(), ScopeKey::from(&ProjectName::from("core")));
    }
}
