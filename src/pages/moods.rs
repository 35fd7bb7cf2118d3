//! Mood entry management: list with filters, create, edit and delete.

use chrono::{DateTime, Local, Utc};
use std::fmt;
use thiserror::Error;
use tracing::debug;

use crate::api::transport::Transport;
use crate::api::{ApiError, CachedApiClient, Employee, EmployeeId, MoodEntry, MoodEntryId};
use crate::cache::{CacheSource, CacheStorage};
use crate::query::Query;
use crate::retry::RetryPolicy;

use super::mood_form::{mood_label, stress_label, MoodForm, ValidationErrors};

/// Entries plus the employees needed to show who wrote them.
#[derive(Debug, Clone, Default)]
pub struct MoodBoard {
  pub employees: Vec<Employee>,
  pub entries: Vec<MoodEntry>,
  /// Whether the entry list came from the cache
  pub source: CacheSource,
  pub cached_at: Option<DateTime<Utc>>,
}

impl MoodBoard {
  pub fn employee_name(&self, id: EmployeeId) -> Option<&str> {
    self
      .employees
      .iter()
      .find(|e| e.id == id)
      .map(|e| e.name.as_str())
  }

  pub fn find(&self, id: MoodEntryId) -> Option<&MoodEntry> {
    self.entries.iter().find(|e| e.id == id)
  }

  /// The entries matching `filter`, ready to print.
  pub fn filtered<'a>(&'a self, filter: &'a MoodFilter) -> FilteredBoard<'a> {
    FilteredBoard { board: self, filter }
  }
}

pub struct FilteredBoard<'a> {
  board: &'a MoodBoard,
  filter: &'a MoodFilter,
}

impl fmt::Display for FilteredBoard<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let entries = self.filter.apply(&self.board.entries);

    write!(f, "Mood entries ({} of {})", entries.len(), self.board.entries.len())?;
    if let (CacheSource::Cache, Some(at)) = (self.board.source, self.board.cached_at) {
      write!(f, ", cached at {}", at.with_timezone(&Local).format("%H:%M:%S"))?;
    }
    writeln!(f)?;

    if entries.is_empty() {
      writeln!(f, "  (none)")?;
    }
    for entry in entries {
      let name = self
        .board
        .employee_name(entry.employee_id)
        .unwrap_or("unknown employee");
      writeln!(
        f,
        "  #{:<5} {} {:<24} mood {} ({}), stress {} ({})",
        entry.id,
        entry.date,
        name,
        entry.mood_level,
        mood_label(entry.mood_level),
        entry.stress_level,
        stress_label(entry.stress_level),
      )?;
      if !entry.note.is_empty() {
        writeln!(f, "         {}", entry.note)?;
      }
    }
    Ok(())
  }
}

/// Narrow the entry list by employee and/or exact date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoodFilter {
  pub employee_id: Option<EmployeeId>,
  pub date: Option<String>,
}

impl MoodFilter {
  pub fn matches(&self, entry: &MoodEntry) -> bool {
    let employee_ok = self.employee_id.map_or(true, |id| entry.employee_id == id);
    let date_ok = self.date.as_deref().map_or(true, |d| entry.date == d);
    employee_ok && date_ok
  }

  pub fn apply<'a>(&self, entries: &'a [MoodEntry]) -> Vec<&'a MoodEntry> {
    entries.iter().filter(|e| self.matches(e)).collect()
  }
}

#[derive(Debug, Error)]
pub enum SaveError {
  #[error("invalid entry: {0}")]
  Invalid(#[from] ValidationErrors),

  #[error(transparent)]
  Api(#[from] ApiError),
}

/// Load employees, then entries.
pub async fn load_mood_board<T: Transport, S: CacheStorage>(
  client: &CachedApiClient<T, S>,
) -> Result<MoodBoard, ApiError> {
  let employees = client.list_employees().await?;
  let entries = client.list_mood_entries_with_source().await?;
  Ok(MoodBoard {
    employees,
    entries: entries.data,
    source: entries.source,
    cached_at: entries.cached_at,
  })
}

pub fn mood_board_query<T, S>(client: CachedApiClient<T, S>, policy: RetryPolicy) -> Query<MoodBoard>
where
  T: Transport + 'static,
  S: CacheStorage + 'static,
{
  Query::new(move || {
    let client = client.clone();
    async move { load_mood_board(&client).await }
  })
  .with_retry(policy)
}

/// Write side of the mood page. Tracks which entry, if any, is being edited.
pub struct MoodManager<T: Transport, S: CacheStorage> {
  client: CachedApiClient<T, S>,
  editing: Option<MoodEntryId>,
}

impl<T: Transport, S: CacheStorage> MoodManager<T, S> {
  pub fn new(client: CachedApiClient<T, S>) -> Self {
    Self {
      client,
      editing: None,
    }
  }

  #[cfg(test)]
  pub fn editing(&self) -> Option<MoodEntryId> {
    self.editing
  }

  /// Switch to edit mode for `entry` and return the prefilled form.
  pub fn start_edit(&mut self, entry: &MoodEntry) -> MoodForm {
    self.editing = Some(entry.id);
    MoodForm::from_entry(entry)
  }

  /// Create a new entry, or update the one being edited.
  ///
  /// Validation failures never reach the backend. Edit mode ends only when
  /// the write succeeds.
  pub async fn save(&mut self, form: &MoodForm) -> Result<MoodEntry, SaveError> {
    let input = form.validate()?;

    let saved = match self.editing {
      Some(id) => {
        debug!(id, "saving edited mood entry");
        self.client.update_mood_entry(id, &input).await?
      }
      None => self.client.create_mood_entry(&input).await?,
    };

    self.editing = None;
    Ok(saved)
  }

  pub async fn delete(&mut self, id: MoodEntryId) -> Result<bool, ApiError> {
    let deleted = self.client.delete_mood_entry(id).await?;
    if self.editing == Some(id) {
      self.editing = None;
    }
    Ok(deleted)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::transport::mock::MockTransport;
  use crate::api::client::ApiClient;
  use crate::cache::{CacheLayer, MemoryStorage};
  use reqwest::{Method, StatusCode};
  use serde_json::json;

  fn entry(id: u64, date: &str, employee_id: u64) -> MoodEntry {
    MoodEntry {
      id,
      date: date.into(),
      mood_level: 3,
      stress_level: 3,
      note: "Dia normal de trabalho".into(),
      employee_id,
    }
  }

  fn entry_json(id: u64) -> serde_json::Value {
    json!({
      "id_registro": id,
      "data_registro": "2025-03-14",
      "nivel_humor": 5,
      "nivel_estresse": 1,
      "observacao": "Férias chegando, ótimo humor",
      "empregado_id_empregado": 2
    })
  }

  fn form() -> MoodForm {
    MoodForm {
      employee_id: Some(2),
      date: "2025-03-14".into(),
      mood_level: 5,
      stress_level: 1,
      note: "Férias chegando, ótimo humor".into(),
    }
  }

  fn manager(transport: &MockTransport) -> MoodManager<MockTransport, MemoryStorage> {
    MoodManager::new(CachedApiClient::new(
      ApiClient::new("http://backend.test/api", transport.clone()).unwrap(),
      CacheLayer::new(MemoryStorage::new()),
    ))
  }

  #[test]
  fn test_filter_by_employee_and_date() {
    let entries = vec![
      entry(1, "2025-03-10", 1),
      entry(2, "2025-03-10", 2),
      entry(3, "2025-03-11", 1),
    ];

    let all = MoodFilter::default().apply(&entries);
    assert_eq!(all.len(), 3);

    let by_employee = MoodFilter {
      employee_id: Some(1),
      date: None,
    };
    let ids: Vec<u64> = by_employee.apply(&entries).iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1, 3]);

    let both = MoodFilter {
      employee_id: Some(1),
      date: Some("2025-03-10".into()),
    };
    let ids: Vec<u64> = both.apply(&entries).iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![1]);
  }

  #[test]
  fn test_render_shows_filtered_count() {
    let board = MoodBoard {
      employees: vec![],
      entries: vec![entry(1, "2025-03-10", 1), entry(2, "2025-03-11", 1)],
      ..MoodBoard::default()
    };
    let filter = MoodFilter {
      employee_id: None,
      date: Some("2025-03-11".into()),
    };
    let text = board.filtered(&filter).to_string();
    assert!(text.starts_with("Mood entries (1 of 2)"));
    assert!(text.contains("#2"));
    assert!(!text.contains("#1 "));
  }

  #[tokio::test]
  async fn test_save_creates_when_not_editing() {
    let transport = MockTransport::new();
    transport.respond(Method::POST, "/api/humor", StatusCode::CREATED, entry_json(11));
    let mut manager = manager(&transport);

    let saved = manager.save(&form()).await.unwrap();
    assert_eq!(saved.id, 11);
    assert_eq!(transport.calls(Method::POST, "/api/humor"), 1);
  }

  #[tokio::test]
  async fn test_save_updates_entry_being_edited() {
    let transport = MockTransport::new();
    transport.respond(Method::PUT, "/api/humor/11", StatusCode::OK, entry_json(11));
    let mut manager = manager(&transport);

    let existing = entry(11, "2025-03-14", 2);
    let mut form = manager.start_edit(&existing);
    assert_eq!(manager.editing(), Some(11));
    form.mood_level = 5;

    manager.save(&form).await.unwrap();
    assert_eq!(transport.calls(Method::PUT, "/api/humor/11"), 1);
    assert_eq!(manager.editing(), None);
  }

  #[tokio::test]
  async fn test_invalid_form_never_reaches_backend() {
    let transport = MockTransport::new();
    let mut manager = manager(&transport);

    let bad = MoodForm {
      note: "curto".into(),
      ..form()
    };
    let err = manager.save(&bad).await.unwrap_err();
    assert!(matches!(err, SaveError::Invalid(_)));
    assert!(transport.requests().is_empty());
  }

  #[tokio::test]
  async fn test_failed_update_keeps_edit_mode() {
    let transport = MockTransport::new();
    transport.respond_raw(Method::PUT, "/api/humor/11", StatusCode::INTERNAL_SERVER_ERROR, "");
    let mut manager = manager(&transport);

    let form = manager.start_edit(&entry(11, "2025-03-14", 2));
    let err = manager.save(&form).await.unwrap_err();
    assert!(matches!(err, SaveError::Api(_)));
    assert_eq!(manager.editing(), Some(11));
  }

  #[tokio::test]
  async fn test_delete_clears_edit_of_same_entry() {
    let transport = MockTransport::new();
    transport.respond_raw(Method::DELETE, "/api/humor/11", StatusCode::NO_CONTENT, "");
    let mut manager = manager(&transport);

    manager.start_edit(&entry(11, "2025-03-14", 2));
    assert!(manager.delete(11).await.unwrap());
    assert_eq!(manager.editing(), None);
  }

  #[tokio::test]
  async fn test_board_reload_after_save_hits_network() {
    let transport = MockTransport::new();
    transport.respond(Method::GET, "/api/empregado", StatusCode::OK, json!([]));
    transport.respond(Method::GET, "/api/humor", StatusCode::OK, json!([entry_json(1)]));
    transport.respond(Method::POST, "/api/humor", StatusCode::CREATED, entry_json(2));

    let client = CachedApiClient::new(
      ApiClient::new("http://backend.test/api", transport.clone()).unwrap(),
      CacheLayer::new(MemoryStorage::new()),
    );
    let mut manager = MoodManager::new(client.clone());

    load_mood_board(&client).await.unwrap();
    manager.save(&form()).await.unwrap();
    let board = load_mood_board(&client).await.unwrap();

    assert_eq!(board.entries.len(), 1);
    assert_eq!(board.source, CacheSource::Network);
    assert_eq!(transport.calls(Method::GET, "/api/humor"), 2);
    assert_eq!(transport.calls(Method::GET, "/api/empregado"), 1);
  }

  #[tokio::test]
  async fn test_second_board_load_reports_cached_entries() {
    let transport = MockTransport::new();
    transport.respond(Method::GET, "/api/empregado", StatusCode::OK, json!([]));
    transport.respond(Method::GET, "/api/humor", StatusCode::OK, json!([entry_json(1)]));

    let client = CachedApiClient::new(
      ApiClient::new("http://backend.test/api", transport.clone()).unwrap(),
      CacheLayer::new(MemoryStorage::new()),
    );

    let first = load_mood_board(&client).await.unwrap();
    assert_eq!(first.source, CacheSource::Network);
    assert!(!first.filtered(&MoodFilter::default()).to_string().contains("cached at"));

    let second = load_mood_board(&client).await.unwrap();
    assert_eq!(second.source, CacheSource::Cache);
    assert!(second.cached_at.is_some());
    assert!(second
      .filtered(&MoodFilter::default())
      .to_string()
      .starts_with("Mood entries (1 of 1), cached at "));
    assert_eq!(transport.calls(Method::GET, "/api/humor"), 1);
  }
}
