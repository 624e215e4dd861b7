//! Local durable cache: the last-known-good mirror of the remote store.
//!
//! Holds one serialized snapshot of the full board hierarchy and one of the
//! user profile, under fixed logical keys, with no expiry. Storage failures
//! and corrupt entries never propagate: reads degrade to empty/default,
//! writes are logged and dropped.

mod storage;

pub use storage::{MemoryStorage, SnapshotStorage, SqliteStorage};

use tracing::warn;

use crate::model::{Board, UserProfile};

/// Logical key for the board-hierarchy snapshot.
pub const BOARDS_KEY: &str = "expandix_persistence_v1";
/// Logical key for the user profile.
pub const PROFILE_KEY: &str = "expandix_user_profile_v1";

/// Infallible snapshot cache over a [`SnapshotStorage`] backend.
pub struct LocalCache<S: SnapshotStorage> {
  storage: S,
}

impl<S: SnapshotStorage> LocalCache<S> {
  pub fn new(storage: S) -> Self {
    Self { storage }
  }

  /// Most recently written board snapshot, or empty when absent or corrupt.
  pub fn read_boards(&self) -> Vec<Board> {
    self.read_entry(BOARDS_KEY).unwrap_or_default()
  }

  /// Overwrite the board snapshot. Errors are absorbed.
  pub fn write_boards(&self, boards: &[Board]) {
    self.write_entry(BOARDS_KEY, &boards);
  }

  /// Cached profile, or the placeholder default when absent or corrupt.
  pub fn read_profile(&self) -> UserProfile {
    self.read_entry(PROFILE_KEY).unwrap_or_default()
  }

  /// Overwrite the cached profile. Errors are absorbed.
  pub fn write_profile(&self, profile: &UserProfile) {
    self.write_entry(PROFILE_KEY, profile);
  }

  fn read_entry<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
    let blob = match self.storage.read(key) {
      Ok(blob) => blob?,
      Err(err) => {
        warn!(key, %err, "cache read failed, treating as empty");
        return None;
      }
    };

    match serde_json::from_slice(&blob) {
      Ok(value) => Some(value),
      Err(err) => {
        // Corrupt entry: recover transparently, never surface.
        warn!(key, %err, "cache entry corrupt, treating as empty");
        None
      }
    }
  }

  fn write_entry<T: serde::Serialize>(&self, key: &str, value: &T) {
    let blob = match serde_json::to_vec(value) {
      Ok(blob) => blob,
      Err(err) => {
        warn!(key, %err, "failed to serialize snapshot, skipping cache write");
        return;
      }
    };

    if let Err(err) = self.storage.write(key, &blob) {
      warn!(key, %err, "cache write failed, local snapshot not persisted");
    }
  }
}
