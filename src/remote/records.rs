//! Serde types matching the remote store's row shapes.
//!
//! The store speaks snake_case columns while the domain model (and the local
//! cache) is camelCase; these records are the only place that translation
//! lives. Nested `groups`/`tasks` arrays only ever appear on the deep fetch,
//! so they are skipped on serialize and an upsert body stays a plain row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::model::{Board, Comment, Role, Task, TaskGroup, TaskPriority, TaskStatus, UserProfile};

/// The store returns explicit `null` for empty columns; fold it into the
/// field's default instead of failing deserialization.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Row in the `tasks` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
  pub id: String,
  pub group_id: String,
  pub title: String,
  #[serde(default, deserialize_with = "null_default")]
  pub description: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_avatar: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub client_phone: Option<String>,
  #[serde(default, deserialize_with = "null_default")]
  pub value: f64,
  pub status: TaskStatus,
  pub priority: TaskPriority,
  pub owner_id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub start_date: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub end_date: Option<String>,
  /// Not a `tasks` column; only ever present on reads from stores that
  /// embed comments, never in a write body.
  #[serde(default, deserialize_with = "null_default", skip_serializing)]
  pub comments: Vec<Comment>,
  /// Set by the store on insert; never written by the client.
  #[serde(default, skip_serializing)]
  pub created_at: Option<DateTime<Utc>>,
}

/// Row in the `task_groups` table, with the deep-fetch task embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRecord {
  pub id: String,
  pub board_id: String,
  pub name: String,
  #[serde(default, deserialize_with = "null_default")]
  pub color: String,
  #[serde(default, skip_serializing)]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing)]
  pub tasks: Vec<TaskRecord>,
}

/// Row in the `boards` table, with the deep-fetch group embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardRecord {
  pub id: String,
  pub name: String,
  #[serde(default, deserialize_with = "null_default")]
  pub description: String,
  #[serde(default, deserialize_with = "null_default")]
  pub members: Vec<String>,
  #[serde(default, skip_serializing)]
  pub created_at: Option<DateTime<Utc>>,
  #[serde(default, skip_serializing)]
  pub groups: Vec<GroupRecord>,
}

/// Row in the `profiles` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
  pub id: String,
  pub name: String,
  pub email: String,
  #[serde(default, deserialize_with = "null_default")]
  pub avatar: String,
  pub role: Role,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Domain <-> record conversion
// ============================================================================

impl From<&Task> for TaskRecord {
  fn from(task: &Task) -> Self {
    Self {
      id: task.id.clone(),
      group_id: task.group_id.clone(),
      title: task.title.clone(),
      description: task.description.clone(),
      client_name: task.client_name.clone(),
      client_avatar: task.client_avatar.clone(),
      client_phone: task.client_phone.clone(),
      value: task.value,
      status: task.status,
      priority: task.priority,
      owner_id: task.owner_id.clone(),
      start_date: task.start_date.clone(),
      end_date: task.end_date.clone(),
      comments: task.comments.clone(),
      created_at: None,
    }
  }
}

impl From<TaskRecord> for Task {
  fn from(record: TaskRecord) -> Self {
    Self {
      id: record.id,
      group_id: record.group_id,
      title: record.title,
      description: record.description,
      client_name: record.client_name,
      client_avatar: record.client_avatar,
      client_phone: record.client_phone,
      value: record.value,
      status: record.status,
      priority: record.priority,
      owner_id: record.owner_id,
      start_date: record.start_date,
      end_date: record.end_date,
      comments: record.comments,
    }
  }
}

impl From<&TaskGroup> for GroupRecord {
  fn from(group: &TaskGroup) -> Self {
    Self {
      id: group.id.clone(),
      board_id: group.board_id.clone(),
      name: group.name.clone(),
      color: group.color.clone(),
      created_at: None,
      tasks: Vec::new(),
    }
  }
}

impl From<GroupRecord> for TaskGroup {
  fn from(record: GroupRecord) -> Self {
    Self {
      id: record.id,
      board_id: record.board_id,
      name: record.name,
      color: record.color,
      tasks: record.tasks.into_iter().map(Task::from).collect(),
    }
  }
}

impl From<&Board> for BoardRecord {
  fn from(board: &Board) -> Self {
    Self {
      id: board.id.clone(),
      name: board.name.clone(),
      description: board.description.clone(),
      members: board.members.clone(),
      created_at: None,
      groups: Vec::new(),
    }
  }
}

impl From<BoardRecord> for Board {
  fn from(record: BoardRecord) -> Self {
    Self {
      id: record.id,
      name: record.name,
      description: record.description,
      members: record.members,
      groups: record.groups.into_iter().map(TaskGroup::from).collect(),
    }
  }
}

impl From<&UserProfile> for ProfileRecord {
  fn from(profile: &UserProfile) -> Self {
    Self {
      id: profile.id.clone(),
      name: profile.name.clone(),
      email: profile.email.clone(),
      avatar: profile.avatar.clone(),
      role: profile.role,
      updated_at: None,
    }
  }
}

impl From<ProfileRecord> for UserProfile {
  fn from(record: ProfileRecord) -> Self {
    Self {
      id: record.id,
      name: record.name,
      email: record.email,
      avatar: record.avatar,
      role: record.role,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn full_task() -> Task {
    Task {
      id: "t-9".to_string(),
      group_id: "g-2".to_string(),
      title: "Proposta comercial".to_string(),
      description: "Fechar escopo com o cliente".to_string(),
      client_name: Some("ACME Ltda".to_string()),
      client_avatar: Some("data:image/png;base64,AAAA".to_string()),
      client_phone: Some("+55 11 99999-0000".to_string()),
      value: 1234.5,
      status: TaskStatus::Working,
      priority: TaskPriority::High,
      owner_id: "1".to_string(),
      start_date: Some("2024-03-01".to_string()),
      end_date: Some("2024-03-15".to_string()),
      comments: vec![Comment {
        id: "c-1".to_string(),
        user_id: "1".to_string(),
        text: "ligar amanhã".to_string(),
        timestamp: "2024-03-02T10:00:00Z".to_string(),
      }],
    }
  }

  #[test]
  fn test_task_mapping_round_trip_is_lossless() {
    let task = full_task();
    let there = TaskRecord::from(&task);
    let back = Task::from(there.clone());
    let again = TaskRecord::from(&back);
    assert_eq!(there, again);
    assert_eq!(back, task);
  }

  #[test]
  fn test_task_record_uses_snake_case_columns() {
    let json = serde_json::to_value(TaskRecord::from(&full_task())).unwrap();
    assert_eq!(json["group_id"], "g-2");
    assert_eq!(json["client_phone"], "+55 11 99999-0000");
    assert_eq!(json["owner_id"], "1");
    assert_eq!(json["status"], "EM ANDAMENTO");
    assert_eq!(json["priority"], "Alta");
    // Deep-fetch-only and store-owned fields never appear in a write body,
    // even when populated: the tasks table has no such columns.
    assert!(json.get("created_at").is_none());
    assert!(!full_task().comments.is_empty());
    assert!(json.get("comments").is_none());
  }

  #[test]
  fn test_board_upsert_body_is_a_plain_row() {
    let mut board = Board::new("Expansão", "Q3", "1");
    board.groups.push(TaskGroup::new(board.id.as_str(), "Fase 1", "#fff"));
    let json = serde_json::to_value(BoardRecord::from(&board)).unwrap();
    assert!(json.get("groups").is_none());
    assert_eq!(json["members"][0], "1");
  }

  #[test]
  fn test_deep_fetch_payload_deserializes_nested() {
    let payload = serde_json::json!([{
      "id": "b1",
      "name": "Quadro",
      "description": "",
      "members": ["1"],
      "created_at": "2024-01-01T00:00:00Z",
      "groups": [{
        "id": "g1",
        "board_id": "b1",
        "name": "Coluna",
        "color": "#000",
        "created_at": "2024-01-01T00:00:01Z",
        "tasks": [{
          "id": "t1",
          "group_id": "g1",
          "title": "Primeira",
          "description": null,
          "value": null,
          "status": "PARADO",
          "priority": "Baixa",
          "owner_id": "1"
        }]
      }]
    }]);

    let records: Vec<BoardRecord> = serde_json::from_value(payload).unwrap();
    let boards: Vec<Board> = records.into_iter().map(Board::from).collect();
    assert_eq!(boards.len(), 1);
    assert_eq!(boards[0].groups[0].tasks[0].title, "Primeira");
    assert_eq!(boards[0].groups[0].tasks[0].value, 0.0);
    assert!(boards[0].groups[0].tasks[0].comments.is_empty());
  }

  #[test]
  fn test_unknown_persisted_status_is_rejected() {
    let payload = serde_json::json!({
      "id": "t1",
      "group_id": "g1",
      "title": "x",
      "status": "ARQUIVADO",
      "priority": "Baixa",
      "owner_id": "1"
    });
    assert!(serde_json::from_value::<TaskRecord>(payload).is_err());
  }
}
