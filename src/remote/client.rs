//! Remote repository: the typed seam over the hosted store of record.

use async_trait::async_trait;
use chrono::Utc;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use url::Url;

use crate::config::Config;
use crate::model::{Board, Task, TaskGroup, UserProfile};
use crate::remote::error::{classify_response, ApiErrorBody, RemoteError};
use crate::remote::records::{BoardRecord, GroupRecord, ProfileRecord, TaskRecord};

/// Everything the sync coordinator needs from the store of record.
///
/// The coordinator owns an injected instance of this trait, so tests (and a
/// hypothetical second backend) swap the transport without touching sync
/// logic.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
  /// One call returning boards with nested groups with nested tasks,
  /// created_at ascending at every level.
  async fn fetch_boards_deep(&self) -> Result<Vec<Board>, RemoteError>;

  async fn upsert_board(&self, board: &Board) -> Result<(), RemoteError>;
  /// The store's referential integrity cascades to owned groups and tasks.
  async fn delete_board(&self, id: &str) -> Result<(), RemoteError>;

  async fn upsert_group(&self, group: &TaskGroup) -> Result<(), RemoteError>;
  async fn delete_group(&self, id: &str) -> Result<(), RemoteError>;

  async fn upsert_task(&self, task: &Task) -> Result<(), RemoteError>;
  async fn delete_task(&self, id: &str) -> Result<(), RemoteError>;

  /// `Ok(None)` when the row does not exist; that is not an error.
  async fn fetch_user_profile(&self, id: &str) -> Result<Option<UserProfile>, RemoteError>;
  async fn upsert_user_profile(&self, profile: &UserProfile) -> Result<(), RemoteError>;
}

/// PostgREST client implementation of [`RemoteRepository`].
#[derive(Clone)]
pub struct RestRemote {
  http: reqwest::Client,
  base: Url,
}

impl RestRemote {
  /// Build a client from configuration; the API key comes from the
  /// environment, never the config file.
  pub fn new(config: &Config) -> Result<Self> {
    let key = Config::get_api_key()?;
    Self::with_key(&config.remote.url, &key)
  }

  pub fn with_key(url: &str, api_key: &str) -> Result<Self> {
    let base = Url::parse(url)
      .map_err(|e| eyre!("Invalid remote url {}: {}", url, e))?
      .join("rest/v1/")
      .map_err(|e| eyre!("Invalid remote url {}: {}", url, e))?;

    if base.cannot_be_a_base() {
      return Err(eyre!("Remote url {} cannot be used as a base", url));
    }

    let mut headers = HeaderMap::new();
    let key_value =
      HeaderValue::from_str(api_key).map_err(|_| eyre!("API key contains invalid characters"))?;
    headers.insert("apikey", key_value);
    let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
      .map_err(|_| eyre!("API key contains invalid characters"))?;
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .build()
      .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

    Ok(Self { http, base })
  }

  fn endpoint(&self, table: &str) -> Url {
    let mut url = self.base.clone();
    if let Ok(mut segments) = url.path_segments_mut() {
      // The base ends in a slash; drop the empty trailing segment so the
      // table lands on `/rest/v1/{table}` rather than `/rest/v1//{table}`.
      segments.pop_if_empty().push(table);
    }
    url
  }

  /// Classify a non-success response into the structured taxonomy.
  async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }
    let body = response.json::<ApiErrorBody>().await.unwrap_or_default();
    Err(classify_response(status, body))
  }

  async fn upsert<T: serde::Serialize + Sync>(
    &self,
    table: &str,
    row: &T,
  ) -> Result<(), RemoteError> {
    let response = self
      .http
      .post(self.endpoint(table))
      .header("Prefer", "resolution=merge-duplicates,return=minimal")
      .json(&[row])
      .send()
      .await?;
    Self::check(response).await?;
    Ok(())
  }

  async fn delete(&self, table: &str, id: &str) -> Result<(), RemoteError> {
    let response = self
      .http
      .delete(self.endpoint(table))
      .query(&[("id", format!("eq.{}", id))])
      .send()
      .await?;
    Self::check(response).await?;
    Ok(())
  }
}

#[async_trait]
impl RemoteRepository for RestRemote {
  async fn fetch_boards_deep(&self) -> Result<Vec<Board>, RemoteError> {
    let response = self
      .http
      .get(self.endpoint("boards"))
      .query(&[
        ("select", "*,groups:task_groups(*,tasks:tasks(*))"),
        ("order", "created_at.asc"),
        ("groups.order", "created_at.asc"),
        ("groups.tasks.order", "created_at.asc"),
      ])
      .send()
      .await?;

    let records: Vec<BoardRecord> = Self::check(response)
      .await?
      .json()
      .await
      .map_err(|e| RemoteError::Unknown(format!("malformed boards payload: {}", e)))?;

    Ok(records.into_iter().map(Board::from).collect())
  }

  async fn upsert_board(&self, board: &Board) -> Result<(), RemoteError> {
    self.upsert("boards", &BoardRecord::from(board)).await
  }

  async fn delete_board(&self, id: &str) -> Result<(), RemoteError> {
    self.delete("boards", id).await
  }

  async fn upsert_group(&self, group: &TaskGroup) -> Result<(), RemoteError> {
    self.upsert("task_groups", &GroupRecord::from(group)).await
  }

  async fn delete_group(&self, id: &str) -> Result<(), RemoteError> {
    self.delete("task_groups", id).await
  }

  async fn upsert_task(&self, task: &Task) -> Result<(), RemoteError> {
    self.upsert("tasks", &TaskRecord::from(task)).await
  }

  async fn delete_task(&self, id: &str) -> Result<(), RemoteError> {
    self.delete("tasks", id).await
  }

  async fn fetch_user_profile(&self, id: &str) -> Result<Option<UserProfile>, RemoteError> {
    let response = self
      .http
      .get(self.endpoint("profiles"))
      .query(&[
        ("select", "*".to_string()),
        ("id", format!("eq.{}", id)),
        ("limit", "1".to_string()),
      ])
      .send()
      .await?;

    let rows: Vec<ProfileRecord> = Self::check(response)
      .await?
      .json()
      .await
      .map_err(|e| RemoteError::Unknown(format!("malformed profile payload: {}", e)))?;

    Ok(rows.into_iter().next().map(UserProfile::from))
  }

  async fn upsert_user_profile(&self, profile: &UserProfile) -> Result<(), RemoteError> {
    let mut record = ProfileRecord::from(profile);
    record.updated_at = Some(Utc::now());
    self.upsert("profiles", &record).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_endpoint_joins_table_onto_rest_path() {
    let remote = RestRemote::with_key("https://project.supabase.co", "anon-key").unwrap();
    assert_eq!(
      remote.endpoint("task_groups").as_str(),
      "https://project.supabase.co/rest/v1/task_groups"
    );
    assert_eq!(
      remote.endpoint("boards").as_str(),
      "https://project.supabase.co/rest/v1/boards"
    );
  }

  #[test]
  fn test_endpoint_tolerates_trailing_slash_in_config_url() {
    let remote = RestRemote::with_key("https://project.supabase.co/", "anon-key").unwrap();
    assert_eq!(
      remote.endpoint("tasks").as_str(),
      "https://project.supabase.co/rest/v1/tasks"
    );
  }

  #[test]
  fn test_invalid_url_rejected() {
    assert!(RestRemote::with_key("not a url", "k").is_err());
  }
}
