//! Domain model: the in-memory board hierarchy and the user profile.
//!
//! These types are what the application layer sees and what the local cache
//! serializes. Wire-format concerns (snake_case columns, nested select
//! payloads) live in `remote::records`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Id of the singleton local profile row.
pub const PROFILE_ID: &str = "1";

/// Error for values outside a closed enumeration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unrecognized {kind} value: {value}")]
pub struct EnumParseError {
  pub kind: &'static str,
  pub value: String,
}

// ============================================================================
// Closed enumerations
// ============================================================================

/// Task status. The serialized literals are the store's legacy values and
/// must not change without a data migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
  #[serde(rename = "PARADO")]
  Stopped,
  #[serde(rename = "EM ANDAMENTO")]
  Working,
  #[serde(rename = "CONCLUIDO")]
  Done,
}

impl TaskStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      TaskStatus::Stopped => "PARADO",
      TaskStatus::Working => "EM ANDAMENTO",
      TaskStatus::Done => "CONCLUIDO",
    }
  }
}

impl FromStr for TaskStatus {
  type Err = EnumParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "PARADO" => Ok(TaskStatus::Stopped),
      "EM ANDAMENTO" => Ok(TaskStatus::Working),
      "CONCLUIDO" => Ok(TaskStatus::Done),
      other => Err(EnumParseError {
        kind: "task status",
        value: other.to_string(),
      }),
    }
  }
}

impl fmt::Display for TaskStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Task priority, same legacy-literal convention as [`TaskStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskPriority {
  #[serde(rename = "Baixa")]
  Low,
  #[serde(rename = "Média")]
  Medium,
  #[serde(rename = "Alta")]
  High,
  #[serde(rename = "Crítica")]
  Critical,
}

impl TaskPriority {
  pub fn as_str(&self) -> &'static str {
    match self {
      TaskPriority::Low => "Baixa",
      TaskPriority::Medium => "Média",
      TaskPriority::High => "Alta",
      TaskPriority::Critical => "Crítica",
    }
  }
}

impl FromStr for TaskPriority {
  type Err = EnumParseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "Baixa" => Ok(TaskPriority::Low),
      "Média" => Ok(TaskPriority::Medium),
      "Alta" => Ok(TaskPriority::High),
      "Crítica" => Ok(TaskPriority::Critical),
      other => Err(EnumParseError {
        kind: "task priority",
        value: other.to_string(),
      }),
    }
  }
}

impl fmt::Display for TaskPriority {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// Profile role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
  Admin,
  Member,
  Guest,
}

// ============================================================================
// Entities
// ============================================================================

/// A comment on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub id: String,
  pub user_id: String,
  pub text: String,
  pub timestamp: String,
}

/// An individual work item / client record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
  pub id: String,
  /// Back-reference to the owning group.
  pub group_id: String,
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_avatar: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_phone: Option<String>,
  /// Monetary value, non-negative.
  #[serde(default)]
  pub value: f64,
  pub status: TaskStatus,
  pub priority: TaskPriority,
  pub owner_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start_date: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end_date: Option<String>,
  #[serde(default)]
  pub comments: Vec<Comment>,
}

impl Task {
  /// Create a fresh task in the given group with stopped/medium defaults.
  pub fn new(group_id: impl Into<String>, title: impl Into<String>, owner_id: impl Into<String>) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      group_id: group_id.into(),
      title: title.into(),
      description: String::new(),
      client_name: None,
      client_avatar: None,
      client_phone: None,
      value: 0.0,
      status: TaskStatus::Stopped,
      priority: TaskPriority::Medium,
      owner_id: owner_id.into(),
      start_date: None,
      end_date: None,
      comments: Vec::new(),
    }
  }
}

/// A phase/column within a board, owning an ordered run of tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskGroup {
  pub id: String,
  /// Back-reference to the owning board.
  pub board_id: String,
  pub name: String,
  pub color: String,
  #[serde(default)]
  pub tasks: Vec<Task>,
}

impl TaskGroup {
  pub fn new(board_id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      board_id: board_id.into(),
      name: name.into(),
      color: color.into(),
      tasks: Vec::new(),
    }
  }
}

/// Top-level project/client workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub members: Vec<String>,
  #[serde(default)]
  pub groups: Vec<TaskGroup>,
}

impl Board {
  pub fn new(name: impl Into<String>, description: impl Into<String>, owner_id: impl Into<String>) -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      name: name.into(),
      description: description.into(),
      members: vec![owner_id.into()],
      groups: Vec::new(),
    }
  }
}

/// The local installation's user profile. Singleton, fixed id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
  pub id: String,
  pub name: String,
  pub email: String,
  #[serde(default)]
  pub avatar: String,
  pub role: Role,
}

impl Default for UserProfile {
  /// Placeholder profile used until a real one is fetched or cached.
  fn default() -> Self {
    Self {
      id: PROFILE_ID.to_string(),
      name: "Diretor Expandix".to_string(),
      email: "admin@expandix.com".to_string(),
      avatar: String::new(),
      role: Role::Admin,
    }
  }
}

// ============================================================================
// Partial updates
// ============================================================================

/// Partial task update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskPatch {
  pub title: Option<String>,
  pub description: Option<String>,
  pub client_name: Option<String>,
  pub client_avatar: Option<String>,
  pub client_phone: Option<String>,
  pub value: Option<f64>,
  pub status: Option<TaskStatus>,
  pub priority: Option<TaskPriority>,
  pub owner_id: Option<String>,
  pub start_date: Option<String>,
  pub end_date: Option<String>,
}

impl TaskPatch {
  pub fn apply(&self, task: &mut Task) {
    if let Some(title) = &self.title {
      task.title = title.clone();
    }
    if let Some(description) = &self.description {
      task.description = description.clone();
    }
    if let Some(client_name) = &self.client_name {
      task.client_name = Some(client_name.clone());
    }
    if let Some(client_avatar) = &self.client_avatar {
      task.client_avatar = Some(client_avatar.clone());
    }
    if let Some(client_phone) = &self.client_phone {
      task.client_phone = Some(client_phone.clone());
    }
    if let Some(value) = self.value {
      task.value = value;
    }
    if let Some(status) = self.status {
      task.status = status;
    }
    if let Some(priority) = self.priority {
      task.priority = priority;
    }
    if let Some(owner_id) = &self.owner_id {
      task.owner_id = owner_id.clone();
    }
    if let Some(start_date) = &self.start_date {
      task.start_date = Some(start_date.clone());
    }
    if let Some(end_date) = &self.end_date {
      task.end_date = Some(end_date.clone());
    }
  }
}

/// Partial profile update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfilePatch {
  pub name: Option<String>,
  pub email: Option<String>,
  pub avatar: Option<String>,
  pub role: Option<Role>,
}

impl ProfilePatch {
  pub fn apply(&self, profile: &mut UserProfile) {
    if let Some(name) = &self.name {
      profile.name = name.clone();
    }
    if let Some(email) = &self.email {
      profile.email = email.clone();
    }
    if let Some(avatar) = &self.avatar {
      profile.avatar = avatar.clone();
    }
    if let Some(role) = self.role {
      profile.role = role;
    }
  }
}

// ============================================================================
// Bootstrap data
// ============================================================================

/// Demonstration board substituted on a fresh install so the UI is never
/// empty. Only used when the remote is reachable but holds no boards and no
/// local snapshot exists.
pub fn seed_boards() -> Vec<Board> {
  vec![Board {
    id: "board-alpha".to_string(),
    name: "Operação Expandix Prime".to_string(),
    description: "Gestão estratégica de ativos e expansão neural.".to_string(),
    members: vec![PROFILE_ID.to_string()],
    groups: vec![TaskGroup {
      id: "g-main".to_string(),
      board_id: "board-alpha".to_string(),
      name: "Fase de Lançamento".to_string(),
      color: "#D4AF37".to_string(),
      tasks: vec![Task {
        id: "t-init-1".to_string(),
        group_id: "g-main".to_string(),
        title: "Configuração do Ecossistema".to_string(),
        description: "Definição de parâmetros de IA e integração de dados.".to_string(),
        client_name: None,
        client_avatar: None,
        client_phone: None,
        value: 15000.0,
        status: TaskStatus::Working,
        priority: TaskPriority::Critical,
        owner_id: PROFILE_ID.to_string(),
        start_date: None,
        end_date: None,
        comments: Vec::new(),
      }],
    }],
  }]
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_round_trips_through_str() {
    for status in [TaskStatus::Stopped, TaskStatus::Working, TaskStatus::Done] {
      assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
    }
  }

  #[test]
  fn test_unknown_status_rejected() {
    let err = "FEITO".parse::<TaskStatus>().unwrap_err();
    assert_eq!(err.kind, "task status");
    assert_eq!(err.value, "FEITO");
  }

  #[test]
  fn test_unknown_priority_rejected() {
    assert!("Urgente".parse::<TaskPriority>().is_err());
  }

  #[test]
  fn test_status_serde_uses_wire_literals() {
    let json = serde_json::to_string(&TaskStatus::Working).unwrap();
    assert_eq!(json, "\"EM ANDAMENTO\"");
    assert!(serde_json::from_str::<TaskStatus>("\"EM PAUSA\"").is_err());
  }

  #[test]
  fn test_patch_applies_only_set_fields() {
    let mut task = Task::new("g1", "original", "1");
    let patch = TaskPatch {
      value: Some(500.0),
      status: Some(TaskStatus::Done),
      ..Default::default()
    };
    patch.apply(&mut task);
    assert_eq!(task.value, 500.0);
    assert_eq!(task.status, TaskStatus::Done);
    assert_eq!(task.title, "original");
    assert_eq!(task.priority, TaskPriority::Medium);
  }

  #[test]
  fn test_default_profile() {
    let profile = UserProfile::default();
    assert_eq!(profile.id, PROFILE_ID);
    assert_eq!(profile.role, Role::Admin);
  }

  #[test]
  fn test_seed_references_resolve() {
    let boards = seed_boards();
    for board in &boards {
      for group in &board.groups {
        assert_eq!(group.board_id, board.id);
        for task in &group.tasks {
          assert_eq!(task.group_id, group.id);
        }
      }
    }
  }
}
