//! The sync coordinator: single authority for every persistence-affecting
//! action.
//!
//! Reads prefer the remote store and fall back to the local cache. Writes
//! commit to the in-memory tree and the cache synchronously, then propagate
//! to the remote in a background task; a remote failure leaves the
//! optimistic local state standing and emits one [`SyncNotice`].

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::cache::{LocalCache, SnapshotStorage};
use crate::model::{
  seed_boards, Board, ProfilePatch, Task, TaskGroup, TaskPatch, UserProfile, PROFILE_ID,
};
use crate::remote::{RemoteError, RemoteRepository};
use crate::sync::state::{SyncError, SyncNotice, SyncState};

/// Everything `load_all` hands back to the application layer.
#[derive(Debug, Clone)]
pub struct Snapshot {
  pub boards: Vec<Board>,
  pub profile: UserProfile,
}

pub struct SyncCoordinator<R, S>
where
  R: RemoteRepository + 'static,
  S: SnapshotStorage,
{
  remote: Arc<R>,
  cache: LocalCache<S>,
  boards: Vec<Board>,
  profile: UserProfile,
  state: Arc<Mutex<SyncState>>,
  notice_tx: broadcast::Sender<SyncNotice>,
}

fn store_state(slot: &Mutex<SyncState>, value: SyncState) {
  let mut state = slot.lock().unwrap_or_else(PoisonError::into_inner);
  *state = value;
}

impl<R, S> SyncCoordinator<R, S>
where
  R: RemoteRepository + 'static,
  S: SnapshotStorage,
{
  pub fn new(remote: R, cache: LocalCache<S>) -> Self {
    let (notice_tx, _) = broadcast::channel(32);
    Self {
      remote: Arc::new(remote),
      cache,
      boards: Vec::new(),
      profile: UserProfile::default(),
      state: Arc::new(Mutex::new(SyncState::Unknown)),
      notice_tx,
    }
  }

  /// Subscribe to remote-failure notices.
  pub fn subscribe(&self) -> broadcast::Receiver<SyncNotice> {
    self.notice_tx.subscribe()
  }

  pub fn state(&self) -> SyncState {
    *self.state.lock().unwrap_or_else(PoisonError::into_inner)
  }

  pub fn boards(&self) -> &[Board] {
    &self.boards
  }

  pub fn profile(&self) -> &UserProfile {
    &self.profile
  }

  // ==========================================================================
  // Reads
  // ==========================================================================

  /// Load the full board hierarchy and profile, remote-first.
  ///
  /// A successful non-empty remote fetch is authoritative: it fully replaces
  /// the in-memory tree and the cached snapshot, including entities deleted
  /// remotely. A failed fetch degrades silently to the cached snapshot. A
  /// reachable-but-empty remote on a fresh install yields the demonstration
  /// seed board.
  pub async fn load_all(&mut self) -> Snapshot {
    store_state(&self.state, SyncState::Syncing);

    let (boards_result, profile_result) = futures::join!(
      self.remote.fetch_boards_deep(),
      self.remote.fetch_user_profile(PROFILE_ID)
    );

    match boards_result {
      Ok(remote_boards) if !remote_boards.is_empty() => {
        self.cache.write_boards(&remote_boards);
        self.boards = remote_boards;
        store_state(&self.state, SyncState::Synced);
      }
      Ok(_) => {
        // Empty remote never wipes local data; seed only a fresh install.
        let cached = self.cache.read_boards();
        self.boards = if cached.is_empty() { seed_boards() } else { cached };
        store_state(&self.state, SyncState::Synced);
      }
      Err(err) => {
        debug!(%err, "remote fetch failed, serving cached snapshot");
        self.boards = self.cache.read_boards();
        store_state(&self.state, SyncState::CachedOnly);
      }
    }

    match profile_result {
      Ok(Some(profile)) => {
        self.cache.write_profile(&profile);
        self.profile = profile;
      }
      Ok(None) => {
        self.profile = self.cache.read_profile();
      }
      Err(err) => {
        debug!(%err, "profile fetch failed, serving cached profile");
        self.profile = self.cache.read_profile();
      }
    }

    Snapshot {
      boards: self.boards.clone(),
      profile: self.profile.clone(),
    }
  }

  // ==========================================================================
  // Board mutations
  // ==========================================================================

  pub fn create_board(&mut self, name: &str, description: &str) -> Board {
    let board = Board::new(name, description, self.profile.id.clone());
    self.boards.push(board.clone());
    self.persist_local();

    let payload = board.clone();
    self.push_remote("create board", move |remote| async move {
      remote.upsert_board(&payload).await
    });

    board
  }

  pub fn rename_board(&mut self, id: &str, name: &str) -> Result<Board, SyncError> {
    let board = self.board_mut(id)?;
    board.name = name.to_string();
    let updated = board.clone();
    self.persist_local();

    let payload = updated.clone();
    self.push_remote("rename board", move |remote| async move {
      remote.upsert_board(&payload).await
    });

    Ok(updated)
  }

  /// Remove a board and everything under it, locally at once. The remote
  /// delete cascades to owned groups and tasks on the store side.
  pub fn delete_board(&mut self, id: &str) -> Result<(), SyncError> {
    let position = self
      .boards
      .iter()
      .position(|b| b.id == id)
      .ok_or_else(|| SyncError::UnknownBoard(id.to_string()))?;
    self.boards.remove(position);
    self.persist_local();

    let id = id.to_string();
    self.push_remote("delete board", move |remote| async move {
      remote.delete_board(&id).await
    });

    Ok(())
  }

  // ==========================================================================
  // Group mutations
  // ==========================================================================

  pub fn create_group(
    &mut self,
    board_id: &str,
    name: &str,
    color: &str,
  ) -> Result<TaskGroup, SyncError> {
    let group = TaskGroup::new(board_id, name, color);
    let board = self.board_mut(board_id)?;
    board.groups.push(group.clone());
    self.persist_local();

    let payload = group.clone();
    self.push_remote("create group", move |remote| async move {
      remote.upsert_group(&payload).await
    });

    Ok(group)
  }

  pub fn delete_group(&mut self, id: &str) -> Result<(), SyncError> {
    let mut removed = false;
    for board in &mut self.boards {
      if let Some(position) = board.groups.iter().position(|g| g.id == id) {
        board.groups.remove(position);
        removed = true;
        break;
      }
    }
    if !removed {
      return Err(SyncError::UnknownGroup(id.to_string()));
    }
    self.persist_local();

    let id = id.to_string();
    self.push_remote("delete group", move |remote| async move {
      remote.delete_group(&id).await
    });

    Ok(())
  }

  // ==========================================================================
  // Task mutations
  // ==========================================================================

  pub fn create_task(&mut self, group_id: &str, title: &str) -> Result<Task, SyncError> {
    if title.trim().is_empty() {
      return Err(SyncError::InvalidTask("title cannot be empty".to_string()));
    }

    let task = Task::new(group_id, title, self.profile.id.clone());
    let group = self.group_mut(group_id)?;
    group.tasks.push(task.clone());
    self.persist_local();

    let payload = task.clone();
    self.push_remote("create task", move |remote| async move {
      remote.upsert_task(&payload).await
    });

    Ok(task)
  }

  pub fn update_task(&mut self, id: &str, patch: TaskPatch) -> Result<Task, SyncError> {
    validate_patch(&patch)?;

    let task = self.task_mut(id)?;
    patch.apply(task);
    let updated = task.clone();
    self.persist_local();

    let payload = updated.clone();
    self.push_remote("update task", move |remote| async move {
      remote.upsert_task(&payload).await
    });

    Ok(updated)
  }

  pub fn delete_task(&mut self, id: &str) -> Result<(), SyncError> {
    let mut removed = false;
    'outer: for board in &mut self.boards {
      for group in &mut board.groups {
        if let Some(position) = group.tasks.iter().position(|t| t.id == id) {
          group.tasks.remove(position);
          removed = true;
          break 'outer;
        }
      }
    }
    if !removed {
      return Err(SyncError::UnknownTask(id.to_string()));
    }
    self.persist_local();

    let id = id.to_string();
    self.push_remote("delete task", move |remote| async move {
      remote.delete_task(&id).await
    });

    Ok(())
  }

  // ==========================================================================
  // Profile
  // ==========================================================================

  pub fn update_profile(&mut self, patch: ProfilePatch) -> UserProfile {
    patch.apply(&mut self.profile);
    self.cache.write_profile(&self.profile);

    let payload = self.profile.clone();
    self.push_remote("update profile", move |remote| async move {
      remote.upsert_user_profile(&payload).await
    });

    self.profile.clone()
  }

  // ==========================================================================
  // Internals
  // ==========================================================================

  fn board_mut(&mut self, id: &str) -> Result<&mut Board, SyncError> {
    self
      .boards
      .iter_mut()
      .find(|b| b.id == id)
      .ok_or_else(|| SyncError::UnknownBoard(id.to_string()))
  }

  fn group_mut(&mut self, id: &str) -> Result<&mut TaskGroup, SyncError> {
    self
      .boards
      .iter_mut()
      .flat_map(|b| b.groups.iter_mut())
      .find(|g| g.id == id)
      .ok_or_else(|| SyncError::UnknownGroup(id.to_string()))
  }

  fn task_mut(&mut self, id: &str) -> Result<&mut Task, SyncError> {
    self
      .boards
      .iter_mut()
      .flat_map(|b| b.groups.iter_mut())
      .flat_map(|g| g.tasks.iter_mut())
      .find(|t| t.id == id)
      .ok_or_else(|| SyncError::UnknownTask(id.to_string()))
  }

  /// Mirror the in-memory tree into the durable cache. Never fails; the
  /// user-visible state must not wait on anything.
  fn persist_local(&self) {
    self.cache.write_boards(&self.boards);
  }

  /// Attempt a remote write in the background. On failure the resource
  /// becomes `CachedOnly` and exactly one notice is emitted; there is no
  /// retry loop — the next user action is the retry path.
  fn push_remote<F, Fut>(&self, context: &'static str, op: F)
  where
    F: FnOnce(Arc<R>) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), RemoteError>> + Send,
  {
    let remote = Arc::clone(&self.remote);
    let state = Arc::clone(&self.state);
    let tx = self.notice_tx.clone();

    tokio::spawn(async move {
      match op(remote).await {
        Ok(()) => {
          store_state(&state, SyncState::Synced);
        }
        Err(err) => {
          warn!(context, %err, "remote write failed, optimistic local state retained");
          store_state(&state, SyncState::CachedOnly);
          let _ = tx.send(SyncNotice {
            classification: err.class(),
            message: err.to_string(),
            context: context.to_string(),
          });
        }
      }
    });
  }
}

/// Boundary validation: reject unpersistable task fields before any remote
/// traffic happens.
fn validate_patch(patch: &TaskPatch) -> Result<(), SyncError> {
  if let Some(value) = patch.value {
    if !value.is_finite() || value < 0.0 {
      return Err(SyncError::InvalidTask(format!(
        "monetary value must be a non-negative number, got {}",
        value
      )));
    }
  }
  if let Some(title) = &patch.title {
    if title.trim().is_empty() {
      return Err(SyncError::InvalidTask("title cannot be empty".to_string()));
    }
  }
  Ok(())
}
