//! Sync status, out-of-band notices, and local call errors.

use thiserror::Error;

use crate::remote::ErrorClass;

/// Where the coordinator currently stands relative to the remote store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
  /// Nothing loaded yet.
  Unknown,
  /// A fetch is in flight.
  Syncing,
  /// The last remote read or write succeeded.
  Synced,
  /// The last operation fell back to the local cache.
  CachedOnly,
}

/// Broadcast notification raised when a background remote write fails.
///
/// The optimistic local state is already committed when one of these is
/// emitted; the UI uses it to show recovery instructions, never to roll
/// back.
#[derive(Debug, Clone)]
pub struct SyncNotice {
  pub classification: ErrorClass,
  pub message: String,
  /// Which operation failed, e.g. "update task".
  pub context: String,
}

/// Synchronous error returned by a coordinator call.
///
/// These cover bad input against the local tree; remote failures never
/// appear here (they arrive as a [`SyncNotice`]).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SyncError {
  #[error("no board with id {0}")]
  UnknownBoard(String),
  #[error("no group with id {0}")]
  UnknownGroup(String),
  #[error("no task with id {0}")]
  UnknownTask(String),
  #[error("invalid task update: {0}")]
  InvalidTask(String),
}
