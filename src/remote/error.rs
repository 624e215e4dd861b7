//! Structured remote-store error taxonomy.
//!
//! The store surfaces failures as PostgREST error bodies, HTTP statuses, or
//! plain transport errors. Classification happens here, once, so the rest of
//! the crate matches on variants instead of sniffing message strings.

use serde::Deserialize;
use thiserror::Error;

/// Error returned by every remote repository operation.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
  /// The remote schema is absent (tables never created, or dropped).
  #[error("remote schema not initialized: {0}")]
  NotInitialized(String),
  /// Authorization or row-level-security rejection.
  #[error("access denied by remote store: {0}")]
  AccessDenied(String),
  /// Transport-level failure: connect, timeout, DNS, or a 5xx.
  #[error("remote store unreachable: {0}")]
  Unreachable(String),
  /// Anything the other variants don't cover.
  #[error("remote store error: {0}")]
  Unknown(String),
}

/// Coarse classification carried on sync notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
  NotInitialized,
  AccessDenied,
  Unreachable,
  Unknown,
}

impl RemoteError {
  pub fn class(&self) -> ErrorClass {
    match self {
      RemoteError::NotInitialized(_) => ErrorClass::NotInitialized,
      RemoteError::AccessDenied(_) => ErrorClass::AccessDenied,
      RemoteError::Unreachable(_) => ErrorClass::Unreachable,
      RemoteError::Unknown(_) => ErrorClass::Unknown,
    }
  }
}

/// PostgREST error body.
#[derive(Debug, Default, Deserialize)]
pub struct ApiErrorBody {
  #[serde(default)]
  pub code: String,
  #[serde(default)]
  pub message: String,
}

/// Classify a non-success HTTP response.
///
/// The PostgREST `code` field is authoritative when present; the HTTP status
/// is the fallback.
pub fn classify_response(status: reqwest::StatusCode, body: ApiErrorBody) -> RemoteError {
  let detail = if body.message.is_empty() {
    format!("HTTP {}", status)
  } else {
    format!("{} ({})", body.message, status)
  };

  match body.code.as_str() {
    // PGRST205: table not found in schema cache. 42P01: undefined table.
    "PGRST205" | "42P01" => return RemoteError::NotInitialized(detail),
    // 42501: insufficient privilege (RLS). PGRST301: JWT rejected.
    "42501" | "PGRST301" => return RemoteError::AccessDenied(detail),
    _ => {}
  }

  if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
    RemoteError::AccessDenied(detail)
  } else if status == reqwest::StatusCode::NOT_FOUND {
    RemoteError::NotInitialized(detail)
  } else if status.is_server_error() || status == reqwest::StatusCode::REQUEST_TIMEOUT {
    RemoteError::Unreachable(detail)
  } else {
    RemoteError::Unknown(detail)
  }
}

impl From<reqwest::Error> for RemoteError {
  fn from(err: reqwest::Error) -> Self {
    if err.is_connect() || err.is_timeout() || err.is_request() {
      RemoteError::Unreachable(err.to_string())
    } else {
      RemoteError::Unknown(err.to_string())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use reqwest::StatusCode;

  fn body(code: &str, message: &str) -> ApiErrorBody {
    ApiErrorBody {
      code: code.to_string(),
      message: message.to_string(),
    }
  }

  #[test]
  fn test_missing_table_code_wins_over_status() {
    let err = classify_response(StatusCode::NOT_FOUND, body("PGRST205", "no table"));
    assert_eq!(err.class(), ErrorClass::NotInitialized);
  }

  #[test]
  fn test_rls_rejection_is_access_denied() {
    let err = classify_response(StatusCode::UNAUTHORIZED, body("42501", "permission denied"));
    assert_eq!(err.class(), ErrorClass::AccessDenied);

    let err = classify_response(StatusCode::FORBIDDEN, ApiErrorBody::default());
    assert_eq!(err.class(), ErrorClass::AccessDenied);
  }

  #[test]
  fn test_server_error_is_unreachable() {
    let err = classify_response(StatusCode::BAD_GATEWAY, ApiErrorBody::default());
    assert_eq!(err.class(), ErrorClass::Unreachable);
  }

  #[test]
  fn test_other_statuses_are_unknown() {
    let err = classify_response(StatusCode::CONFLICT, body("23505", "duplicate key"));
    assert_eq!(err.class(), ErrorClass::Unknown);
  }
}
