//! Uncached backend client: URL building, request deadline, status and body checks.

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::error::{ApiError, Operation, Result};
use super::transport::{HttpRequest, HttpResponse, Transport};
use super::types::{
  Department, Employee, MoodEntry, MoodEntryId, MoodEntryInput, WellBeingAlert,
};

/// Default per-request deadline.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const MOOD_ENTRIES_PATH: &str = "humor";
const EMPLOYEES_PATH: &str = "empregado";
const DEPARTMENTS_PATH: &str = "departamento";
const ALERTS_PATH: &str = "alerta";

/// Backend client wrapper
pub struct ApiClient<T: Transport> {
  transport: Arc<T>,
  base_url: Url,
  timeout: Duration,
}

impl<T: Transport> Clone for ApiClient<T> {
  fn clone(&self) -> Self {
    Self {
      transport: Arc::clone(&self.transport),
      base_url: self.base_url.clone(),
      timeout: self.timeout,
    }
  }
}

impl<T: Transport> ApiClient<T> {
  pub fn new(base_url: &str, transport: T) -> Result<Self> {
    Ok(Self {
      transport: Arc::new(transport),
      base_url: normalize_base_url(base_url)?,
      timeout: DEFAULT_TIMEOUT,
    })
  }

  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = timeout;
    self
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    Ok(self.base_url.join(path)?)
  }

  /// Send a request, racing it against the deadline.
  ///
  /// When the deadline fires the in-flight future is dropped, which aborts
  /// the request. Non-success statuses are turned into `ApiError::Http`.
  async fn execute(
    &self,
    operation: Operation,
    method: Method,
    url: Url,
    body: Option<Vec<u8>>,
  ) -> Result<HttpResponse> {
    debug!(%method, %url, "sending request to {}", operation);
    let request = HttpRequest { method, url, body };

    let response = tokio::time::timeout(self.timeout, self.transport.send(request))
      .await
      .map_err(|_| {
        warn!(timeout_ms = self.timeout.as_millis() as u64, "{} timed out", operation);
        ApiError::Timeout {
          operation,
          timeout: self.timeout,
        }
      })?
      .map_err(|source| ApiError::Network { operation, source })?;

    if !response.status.is_success() {
      warn!(status = %response.status, "{} failed", operation);
      return Err(ApiError::Http {
        operation,
        status: response.status,
      });
    }

    Ok(response)
  }

  async fn get_json<R: DeserializeOwned>(&self, operation: Operation, path: &str) -> Result<R> {
    let url = self.endpoint(path)?;
    let response = self.execute(operation, Method::GET, url, None).await?;
    decode(operation, &response)
  }

  async fn send_json<B: Serialize, R: DeserializeOwned>(
    &self,
    operation: Operation,
    method: Method,
    path: &str,
    body: &B,
  ) -> Result<R> {
    let url = self.endpoint(path)?;
    let body = serde_json::to_vec(body).map_err(|source| ApiError::Encode { operation, source })?;
    let response = self.execute(operation, method, url, Some(body)).await?;
    decode(operation, &response)
  }

  /// Get all mood entries
  pub async fn list_mood_entries(&self) -> Result<Vec<MoodEntry>> {
    self
      .get_json(Operation::ListMoodEntries, MOOD_ENTRIES_PATH)
      .await
  }

  pub async fn create_mood_entry(&self, input: &MoodEntryInput) -> Result<MoodEntry> {
    self
      .send_json(Operation::CreateMoodEntry, Method::POST, MOOD_ENTRIES_PATH, input)
      .await
  }

  pub async fn update_mood_entry(&self, id: MoodEntryId, input: &MoodEntryInput) -> Result<MoodEntry> {
    let path = format!("{}/{}", MOOD_ENTRIES_PATH, id);
    self
      .send_json(Operation::UpdateMoodEntry, Method::PUT, &path, input)
      .await
  }

  /// Delete a mood entry. Returns true only when the backend answers 204.
  pub async fn delete_mood_entry(&self, id: MoodEntryId) -> Result<bool> {
    let url = self.endpoint(&format!("{}/{}", MOOD_ENTRIES_PATH, id))?;
    let response = self
      .execute(Operation::DeleteMoodEntry, Method::DELETE, url, None)
      .await?;
    Ok(response.status == StatusCode::NO_CONTENT)
  }

  /// Get all employees
  pub async fn list_employees(&self) -> Result<Vec<Employee>> {
    self.get_json(Operation::ListEmployees, EMPLOYEES_PATH).await
  }

  /// Get all departments
  pub async fn list_departments(&self) -> Result<Vec<Department>> {
    self
      .get_json(Operation::ListDepartments, DEPARTMENTS_PATH)
      .await
  }

  /// Get all well-being alerts
  pub async fn list_alerts(&self) -> Result<Vec<WellBeingAlert>> {
    self.get_json(Operation::ListAlerts, ALERTS_PATH).await
  }
}

fn decode<R: DeserializeOwned>(operation: Operation, response: &HttpResponse) -> Result<R> {
  serde_json::from_slice(&response.body).map_err(|source| ApiError::Parse { operation, source })
}

/// Parse the base URL and make sure its path ends with `/` so that joining
/// `humor` onto `http://host/api` yields `http://host/api/humor`.
fn normalize_base_url(raw: &str) -> Result<Url> {
  let mut url = Url::parse(raw.trim())?;
  if !url.path().ends_with('/') {
    let path = format!("{}/", url.path());
    url.set_path(&path);
  }
  Ok(url)
}
