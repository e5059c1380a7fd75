//! Uniform handle over local and remote resources.

use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use teamsync_core::error::io_err;
use teamsync_core::{ProgressMonitor, TeamError};

use crate::folder::{RemoteFolder, RemoteMember};
use crate::revision::{ContentReader, RemoteRevision};
use crate::session::SessionFactory;

/// A file or folder that is either on disk or in the repository.
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceHandle {
    LocalFile(PathBuf),
    LocalFolder(PathBuf),
    RemoteFile(RemoteRevision),
    RemoteFolder(RemoteFolder),
}

impl ResourceHandle {
    /// Classify a local path by what is on disk.
    pub fn local(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.is_dir() {
            ResourceHandle::LocalFolder(path)
        } else {
            ResourceHandle::LocalFile(path)
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(
            self,
            ResourceHandle::LocalFolder(_) | ResourceHandle::RemoteFolder(_)
        )
    }

    pub fn name(&self) -> String {
        match self {
            ResourceHandle::LocalFile(p) | ResourceHandle::LocalFolder(p) => p
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ResourceHandle::RemoteFile(r) => r.name().to_string(),
            ResourceHandle::RemoteFolder(f) => f.name().to_string(),
        }
    }

    /// Contents of a file handle; `None` for containers.
    pub fn fetch_contents(
        &mut self,
        sessions: &dyn SessionFactory,
        progress: &dyn ProgressMonitor,
    ) -> Result<Option<ContentReader>, TeamError> {
        match self {
            ResourceHandle::LocalFile(path) => {
                let bytes = fs::read(&*path).map_err(|e| io_err(path.clone(), e))?;
                Ok(Some(Cursor::new(Arc::from(bytes))))
            }
            ResourceHandle::RemoteFile(revision) => revision.contents(sessions, progress).map(Some),
            ResourceHandle::LocalFolder(_) | ResourceHandle::RemoteFolder(_) => Ok(None),
        }
    }

    /// Direct children of a container, sorted by name for local folders and
    /// in server order for remote ones. Files have no children.
    pub fn children(
        &self,
        sessions: &dyn SessionFactory,
        progress: &dyn ProgressMonitor,
    ) -> Result<Vec<ResourceHandle>, TeamError> {
        match self {
            ResourceHandle::LocalFolder(path) => {
                let mut children = Vec::new();
                for entry in fs::read_dir(path).map_err(|e| io_err(path.clone(), e))? {
                    let entry = entry.map_err(|e| io_err(path.clone(), e))?;
                    children.push(ResourceHandle::local(entry.path()));
                }
                children.sort_by_key(|c| c.name());
                Ok(children)
            }
            ResourceHandle::RemoteFolder(folder) => Ok(folder
                .members(sessions, progress)?
                .into_iter()
                .map(|m| match m {
                    RemoteMember::File(r) => ResourceHandle::RemoteFile(r),
                    RemoteMember::Folder(f) => ResourceHandle::RemoteFolder(f),
                })
                .collect()),
            ResourceHandle::LocalFile(_) | ResourceHandle::RemoteFile(_) => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use teamsync_core::{NullProgress, RepositoryLocation};

    struct NoSessions;

    impl SessionFactory for NoSessions {
        fn open(
            &self,
            _location: &RepositoryLocation,
            _root: &RemoteFolder,
            _progress: &dyn ProgressMonitor,
        ) -> Result<Box<dyn Session>, TeamError> {
            Err(TeamError::Client("offline".to_string()))
        }
    }

    #[test]
    fn local_folder_children_are_sorted() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("b.txt"), "b").expect("write");
        fs::write(dir.path().join("a.txt"), "a").expect("write");
        fs::create_dir(dir.path().join("sub")).expect("mkdir");

        let folder = ResourceHandle::local(dir.path());
        assert!(folder.is_container());
        let children = folder.children(&NoSessions, &NullProgress::new()).expect("children");
        let names: Vec<String> = children.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["a.txt", "b.txt", "sub"]);
        assert!(children[2].is_container());
    }

    #[test]
    fn local_file_contents_are_read() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("a.txt");
        fs::write(&path, "hello").expect("write");

        let mut file = ResourceHandle::local(&path);
        let reader = file
            .fetch_contents(&NoSessions, &NullProgress::new())
            .expect("read")
            .expect("file has contents");
        assert_eq!(&reader.get_ref()[..], b"hello");
    }

    #[test]
    fn missing_local_file_is_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut file = ResourceHandle::LocalFile(dir.path().join("gone"));
        let err = file
            .fetch_contents(&NoSessions, &NullProgress::new())
            .unwrap_err();
        assert!(matches!(err, TeamError::Io { .. }));
    }

    #[test]
    fn folders_have_no_contents() {
        let mut folder = ResourceHandle::RemoteFolder(RemoteFolder::new(
            RepositoryLocation::from("repo"),
            "m",
            None,
        ));
        let contents = folder
            .fetch_contents(&NoSessions, &NullProgress::new())
            .expect("no error");
        assert!(contents.is_none());
    }
}
