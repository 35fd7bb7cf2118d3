//! Error types for the backend client.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::cache::CacheError;

/// Boxed error returned by a transport when the request never produced a response.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The backend operation a request belongs to. Used to build error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
  ListMoodEntries,
  CreateMoodEntry,
  UpdateMoodEntry,
  DeleteMoodEntry,
  ListEmployees,
  ListDepartments,
  ListAlerts,
}

impl fmt::Display for Operation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      Self::ListMoodEntries => "fetch mood entries",
      Self::CreateMoodEntry => "create mood entry",
      Self::UpdateMoodEntry => "update mood entry",
      Self::DeleteMoodEntry => "delete mood entry",
      Self::ListEmployees => "fetch employees",
      Self::ListDepartments => "fetch departments",
      Self::ListAlerts => "fetch alerts",
    };
    f.write_str(text)
  }
}

#[derive(Debug, Error)]
pub enum ApiError {
  /// The request did not complete before the deadline and was aborted.
  #[error("{operation} timed out after {}ms, the server is slow to respond", timeout.as_millis())]
  Timeout {
    operation: Operation,
    timeout: Duration,
  },

  #[error("failed to {operation}: HTTP {status}")]
  Http {
    operation: Operation,
    status: StatusCode,
  },

  #[error("failed to {operation}: response is not valid JSON: {source}")]
  Parse {
    operation: Operation,
    #[source]
    source: serde_json::Error,
  },

  #[error("failed to {operation}: {source}")]
  Network {
    operation: Operation,
    #[source]
    source: BoxError,
  },

  #[error("failed to encode request body for {operation}: {source}")]
  Encode {
    operation: Operation,
    #[source]
    source: serde_json::Error,
  },

  #[error("invalid API base URL: {0}")]
  InvalidUrl(#[from] url::ParseError),

  #[error(transparent)]
  Cache(#[from] CacheError),
}

impl ApiError {
  pub fn is_timeout(&self) -> bool {
    matches!(self, Self::Timeout { .. })
  }

  /// HTTP status of a non-success response, if that is what failed.
  #[cfg(test)]
  pub fn status(&self) -> Option<StatusCode> {
    match self {
      Self::Http { status, .. } => Some(*status),
      _ => None,
    }
  }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_timeout_and_http_messages_differ() {
    let timeout = ApiError::Timeout {
      operation: Operation::ListAlerts,
      timeout: Duration::from_secs(10),
    };
    let http = ApiError::Http {
      operation: Operation::ListAlerts,
      status: StatusCode::INTERNAL_SERVER_ERROR,
    };

    assert_eq!(
      timeout.to_string(),
      "fetch alerts timed out after 10000ms, the server is slow to respond"
    );
    assert_eq!(
      http.to_string(),
      "failed to fetch alerts: HTTP 500 Internal Server Error"
    );
    assert!(timeout.is_timeout());
    assert!(!http.is_timeout());
    assert_eq!(http.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
  }
}
