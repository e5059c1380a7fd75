//! Groups traversal resources by owning provider and splits each group into
//! deep, shallow and non-traversed batches.

use std::collections::BTreeMap;

use teamsync_core::{Depth, ProviderHandle, ProviderRegistry, Resource, ResourceTraversal};
use tracing::debug;

/// Resources owned by one provider, bucketed by how they must be visited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderTraversal {
    files: Vec<Resource>,
    zero_depth_folders: Vec<Resource>,
    one_level_folders: Vec<Resource>,
    full_depth_folders: Vec<Resource>,
}

impl ProviderTraversal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Files always land in `files`; containers are bucketed by `depth`.
    ///
    /// A resource is kept once. A folder requested at several depths keeps
    /// only its deepest request.
    pub fn add(&mut self, resource: Resource, depth: Depth) {
        if !resource.is_container() {
            if !self.files.contains(&resource) {
                self.files.push(resource);
            }
            return;
        }
        if self.folder_depth(&resource).is_some_and(|current| current >= depth) {
            return;
        }
        for bucket in [
            &mut self.zero_depth_folders,
            &mut self.one_level_folders,
            &mut self.full_depth_folders,
        ] {
            bucket.retain(|r| r != &resource);
        }
        match depth {
            Depth::Item => self.zero_depth_folders.push(resource),
            Depth::OneLevel => self.one_level_folders.push(resource),
            Depth::FullSubtree => self.full_depth_folders.push(resource),
        }
    }

    fn folder_depth(&self, folder: &Resource) -> Option<Depth> {
        [
            (&self.full_depth_folders, Depth::FullSubtree),
            (&self.one_level_folders, Depth::OneLevel),
            (&self.zero_depth_folders, Depth::Item),
        ]
        .into_iter()
        .find(|(bucket, _)| bucket.contains(folder))
        .map(|(_, depth)| depth)
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
            && self.zero_depth_folders.is_empty()
            && self.one_level_folders.is_empty()
            && self.full_depth_folders.is_empty()
    }

    /// Resources to visit without recursion.
    ///
    /// Files ride along with the one-level folders when there are any; when a
    /// deep batch exists and no one-level folders do, they go deep instead.
    pub fn shallow_resources(&self) -> Vec<Resource> {
        if self.one_level_folders.is_empty() && self.full_depth_folders.is_empty() {
            return self.files.clone();
        }
        if self.one_level_folders.is_empty() {
            return Vec::new();
        }
        self.one_level_folders
            .iter()
            .chain(&self.files)
            .cloned()
            .collect()
    }

    /// Resources to visit recursively.
    pub fn deep_resources(&self) -> Vec<Resource> {
        if self.full_depth_folders.is_empty() {
            return Vec::new();
        }
        if !self.one_level_folders.is_empty() {
            return self.full_depth_folders.clone();
        }
        self.full_depth_folders
            .iter()
            .chain(&self.files)
            .cloned()
            .collect()
    }

    /// Folders requested at item depth only.
    pub fn nontraversed_folders(&self) -> Vec<Resource> {
        self.zero_depth_folders.clone()
    }
}

/// Bucket every resource of `traversals` under its owning provider.
///
/// Resources with no provider are skipped. Providers iterate in
/// `(project, type)` order.
pub fn build_provider_traversals(
    registry: &ProviderRegistry,
    traversals: &[ResourceTraversal],
) -> BTreeMap<ProviderHandle, ProviderTraversal> {
    let mut groups: BTreeMap<ProviderHandle, ProviderTraversal> = BTreeMap::new();
    for traversal in traversals {
        for resource in &traversal.resources {
            match registry.resolve(resource) {
                Some(provider) => groups
                    .entry(provider)
                    .or_default()
                    .add(resource.clone(), traversal.depth),
                None => debug!(resource = %resource, "no provider for resource, skipping"),
            }
        }
    }
    groups
}

/// Root resources of every traversal, in input order.
pub fn traversal_roots(traversals: &[ResourceTraversal]) -> Vec<Resource> {
    traversals
        .iter()
        .flat_map(|t| t.resources.iter().cloned())
        .collect()
}
