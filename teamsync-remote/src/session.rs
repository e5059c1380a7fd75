//! Session and command protocol used to talk to a repository server.
//!
//! A [`SessionFactory`] opens a [`Session`] rooted at a remote folder. Each
//! command returns a [`CommandResponse`]: an [`Outcome`] plus the response
//! items the server streamed back, consumed once by the caller.

use std::fmt;

use teamsync_core::{check_cancelled, ProgressMonitor, RepositoryLocation, ServerStatus, TeamError};
use tracing::{debug, warn};

use crate::folder::RemoteFolder;
use crate::log::LogEntry;
use crate::sync_info::Tag;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Update,
    Log,
    Commit,
    Tag,
    List,
}

impl CommandKind {
    pub fn name(&self) -> &'static str {
        match self {
            CommandKind::Update => "update",
            CommandKind::Log => "log",
            CommandKind::Commit => "commit",
            CommandKind::Tag => "tag",
            CommandKind::List => "rls",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Options that apply to the whole session invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobalOption {
    Quiet,
    /// Report what would happen without touching files.
    DoNotChangeFiles,
}

impl GlobalOption {
    pub fn flag(&self) -> &'static str {
        match self {
            GlobalOption::Quiet => "-q",
            GlobalOption::DoNotChangeFiles => "-n",
        }
    }
}

/// Options scoped to one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalOption {
    DoNotRecurse,
    IgnoreLocalChanges,
    Tag(Tag),
    Message(String),
}

impl LocalOption {
    /// Argument vector form, e.g. `["-r", "1.3"]`.
    pub fn to_args(&self) -> Vec<String> {
        match self {
            LocalOption::DoNotRecurse => vec!["-l".to_string()],
            LocalOption::IgnoreLocalChanges => vec!["-C".to_string()],
            LocalOption::Tag(tag) => vec!["-r".to_string(), tag.name.clone()],
            LocalOption::Message(msg) => vec!["-m".to_string(), msg.clone()],
        }
    }
}

/// One command sent over a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    pub kind: CommandKind,
    pub global_options: Vec<GlobalOption>,
    pub local_options: Vec<LocalOption>,
    /// Targets relative to the session's root folder.
    pub arguments: Vec<String>,
}

impl CommandRequest {
    pub fn new(kind: CommandKind) -> Self {
        Self {
            kind,
            global_options: Vec::new(),
            local_options: Vec::new(),
            arguments: Vec::new(),
        }
    }

    pub fn global(mut self, option: GlobalOption) -> Self {
        self.global_options.push(option);
        self
    }

    pub fn local(mut self, option: LocalOption) -> Self {
        self.local_options.push(option);
        self
    }

    pub fn locals(mut self, options: impl IntoIterator<Item = LocalOption>) -> Self {
        self.local_options.extend(options);
        self
    }

    pub fn argument(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    pub fn arguments(mut self, args: impl IntoIterator<Item = String>) -> Self {
        self.arguments.extend(args);
        self
    }

    pub fn has_local(&self, option: &LocalOption) -> bool {
        self.local_options.contains(option)
    }

    /// Command line rendering, for logs.
    pub fn command_line(&self) -> String {
        let mut parts: Vec<String> = self
            .global_options
            .iter()
            .map(|o| o.flag().to_string())
            .collect();
        parts.push(self.kind.name().to_string());
        for option in &self.local_options {
            parts.extend(option.to_args());
        }
        parts.extend(self.arguments.iter().cloned());
        parts.join(" ")
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Status of a finished command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    ServerError(ServerStatus),
    ClientError(String),
}

/// One item streamed back by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseItem {
    /// File contents. `None` means the file exists but sent no bytes.
    Contents { name: String, bytes: Option<Vec<u8>> },
    /// New revision for a file after update or commit.
    Revision { name: String, revision: String },
    /// File no longer exists at the requested tag.
    Removed { name: String },
    Log(LogEntry),
    /// Directory listing entry.
    Entry {
        name: String,
        is_folder: bool,
        revision: Option<String>,
    },
    /// Free-form server message.
    Message(String),
}

/// Stream of response items; finite and consumed once.
pub type ResponseItems = std::vec::IntoIter<ResponseItem>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    outcome: Outcome,
    items: Vec<ResponseItem>,
}

impl CommandResponse {
    pub fn new(outcome: Outcome, items: Vec<ResponseItem>) -> Self {
        Self { outcome, items }
    }

    pub fn ok(items: Vec<ResponseItem>) -> Self {
        Self::new(Outcome::Ok, items)
    }

    pub fn server_error(status: ServerStatus) -> Self {
        Self::new(Outcome::ServerError(status), Vec::new())
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// Split into outcome and item stream without checking the outcome.
    pub fn into_parts(self) -> (Outcome, ResponseItems) {
        (self.outcome, self.items.into_iter())
    }

    /// Item stream of a successful command; a failed outcome becomes the
    /// matching [`TeamError`] and the items are discarded.
    pub fn into_items(self) -> Result<ResponseItems, TeamError> {
        match self.outcome {
            Outcome::Ok => Ok(self.items.into_iter()),
            Outcome::ServerError(status) => Err(TeamError::ServerProtocol { status }),
            Outcome::ClientError(message) => Err(TeamError::Client(message)),
        }
    }
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

/// An open connection to a repository.
pub trait Session: Send {
    fn execute(
        &mut self,
        request: &CommandRequest,
        progress: &dyn ProgressMonitor,
    ) -> Result<CommandResponse, TeamError>;

    fn close(&mut self) -> Result<(), TeamError>;
}

/// Opens sessions against a repository location.
pub trait SessionFactory: Send + Sync {
    fn open(
        &self,
        location: &RepositoryLocation,
        root: &RemoteFolder,
        progress: &dyn ProgressMonitor,
    ) -> Result<Box<dyn Session>, TeamError>;
}

/// Session that is closed when dropped.
///
/// [`OpenSession::close`] surfaces the close error; a drop without an explicit
/// close logs it instead.
pub struct OpenSession {
    inner: Option<Box<dyn Session>>,
    location: RepositoryLocation,
}

/// Open a session rooted at `root`, checking cancellation first.
pub fn open_session(
    factory: &dyn SessionFactory,
    location: &RepositoryLocation,
    root: &RemoteFolder,
    progress: &dyn ProgressMonitor,
) -> Result<OpenSession, TeamError> {
    check_cancelled(progress)?;
    let session = factory.open(location, root, progress)?;
    debug!(location = %location, root = %root.repository_relative_path(), "session opened");
    Ok(OpenSession {
        inner: Some(session),
        location: location.clone(),
    })
}

impl OpenSession {
    pub fn execute(
        &mut self,
        request: &CommandRequest,
        progress: &dyn ProgressMonitor,
    ) -> Result<CommandResponse, TeamError> {
        check_cancelled(progress)?;
        let session = self
            .inner
            .as_mut()
            .ok_or_else(|| TeamError::Client("session already closed".to_string()))?;
        debug!(location = %self.location, command = %request.command_line(), "executing command");
        session.execute(request, progress)
    }

    pub fn close(mut self) -> Result<(), TeamError> {
        match self.inner.take() {
            Some(mut session) => session.close(),
            None => Ok(()),
        }
    }
}

impl Drop for OpenSession {
    fn drop(&mut self) {
        if let Some(mut session) = self.inner.take() {
            if let Err(e) = session.close() {
                warn!(location = %self.location, error = %e, "failed to close session");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use teamsync_core::{CancellationToken, NullProgress};

    struct Counting {
        closed: Arc<AtomicUsize>,
    }

    impl Session for Counting {
        fn execute(
            &mut self,
            _request: &CommandRequest,
            _progress: &dyn ProgressMonitor,
        ) -> Result<CommandResponse, TeamError> {
            Ok(CommandResponse::server_error(ServerStatus::new(1, "nope")))
        }

        fn close(&mut self) -> Result<(), TeamError> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Factory {
        closed: Arc<AtomicUsize>,
    }

    impl SessionFactory for Factory {
        fn open(
            &self,
            _location: &RepositoryLocation,
            _root: &RemoteFolder,
            _progress: &dyn ProgressMonitor,
        ) -> Result<Box<dyn Session>, TeamError> {
            Ok(Box::new(Counting {
                closed: self.closed.clone(),
            }))
        }
    }

    fn root() -> RemoteFolder {
        RemoteFolder::new(RepositoryLocation::from("repo"), "m", None)
    }

    #[test]
    fn command_line_renders_options_in_order() {
        let request = CommandRequest::new(CommandKind::Update)
            .global(GlobalOption::Quiet)
            .local(LocalOption::Tag(Tag::version("1.2")))
            .local(LocalOption::IgnoreLocalChanges)
            .argument("a.txt");
        assert_eq!(request.command_line(), "-q update -r 1.2 -C a.txt");
    }

    #[test]
    fn server_error_outcome_becomes_protocol_error() {
        let err = CommandResponse::server_error(ServerStatus::new(3, "bad"))
            .into_items()
            .unwrap_err();
        assert!(matches!(err, TeamError::ServerProtocol { status } if status.code == 3));
    }

    #[test]
    fn session_is_closed_once_on_drop() {
        let closed = Arc::new(AtomicUsize::new(0));
        let factory = Factory {
            closed: closed.clone(),
        };
        {
            let mut session =
                open_session(&factory, &RepositoryLocation::from("repo"), &root(), &NullProgress::new())
                    .expect("open");
            let _ = session.execute(&CommandRequest::new(CommandKind::Log), &NullProgress::new());
        }
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn explicit_close_does_not_close_twice() {
        let closed = Arc::new(AtomicUsize::new(0));
        let factory = Factory {
            closed: closed.clone(),
        };
        let session =
            open_session(&factory, &RepositoryLocation::from("repo"), &root(), &NullProgress::new())
                .expect("open");
        session.close().expect("close");
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn cancelled_monitor_does_not_open() {
        let closed = Arc::new(AtomicUsize::new(0));
        let factory = Factory { closed };
        let token = CancellationToken::new();
        token.cancel();
        let result = open_session(
            &factory,
            &RepositoryLocation::from("repo"),
            &root(),
            &NullProgress::with_token(token),
        );
        assert!(matches!(result, Err(TeamError::Cancelled)));
    }
}
