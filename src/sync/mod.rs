//! Sync coordination: optimistic local writes mirrored to the remote store.

mod coordinator;
mod state;

pub use coordinator::{Snapshot, SyncCoordinator};
pub use state::{SyncError, SyncNotice, SyncState};
