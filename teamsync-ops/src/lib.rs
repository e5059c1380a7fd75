//! Provider operations: traversal batching, per-provider dispatch, and the
//! update/commit/tag commands built on top of it.

pub mod arguments;
pub mod context;
pub mod dispatch;
pub mod operations;
pub mod refresh;
pub mod traversal;

pub use arguments::{local_options, string_arguments};
pub use context::{ResourceMappingContext, SubscriberTraversalContext};
pub use dispatch::{BatchKind, BatchRecord, DispatchReport, Dispatcher, ProviderOperation, ProviderRun};
pub use operations::{provider_root, CommitOperation, TagOperation, UpdateOperation};
pub use refresh::{refresh_after_update, RemoteStateCache};
pub use traversal::{build_provider_traversals, traversal_roots, ProviderTraversal};
