//! Offline-tolerant sync engine for Expandix boards.
//!
//! Keeps an in-memory board/group/task hierarchy consistent with a hosted
//! store of record while tolerating remote unavailability: reads prefer the
//! remote and fall back to a durable local cache, writes commit locally
//! first and propagate in the background.
//!
//! The entry point is [`sync::SyncCoordinator`], constructed from a
//! [`remote::RemoteRepository`] implementation and a
//! [`cache::LocalCache`].

pub mod cache;
pub mod config;
pub mod model;
pub mod remote;
pub mod sync;

pub use cache::{LocalCache, MemoryStorage, SnapshotStorage, SqliteStorage};
pub use config::Config;
pub use remote::{ErrorClass, RemoteError, RemoteRepository, RestRemote};
pub use sync::{Snapshot, SyncCoordinator, SyncError, SyncNotice, SyncState};
