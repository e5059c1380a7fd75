//! Remote side of teamsync: sessions, remote folders and file revisions.

pub mod folder;
pub mod handle;
pub mod log;
pub mod revision;
pub mod session;
pub mod sync_info;
pub mod sync_store;

pub use folder::{RemoteFolder, RemoteMember};
pub use handle::ResourceHandle;
pub use log::LogEntry;
pub use revision::{ContentReader, RemoteRevision, WorkspaceState};
pub use session::{
    open_session, CommandKind, CommandRequest, CommandResponse, GlobalOption, LocalOption,
    OpenSession, Outcome, ResponseItem, ResponseItems, Session, SessionFactory,
};
pub use sync_info::{ResourceSyncInfo, Tag, TagKind, ADDED_REVISION};
pub use sync_store::SyncEntriesFile;
