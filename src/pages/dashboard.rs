//! Administrator dashboard: totals, recent entries and open alerts.

use std::fmt;

use crate::api::{
  ApiError, CachedApiClient, Department, Employee, EmployeeId, MoodEntry, WellBeingAlert,
};
use crate::api::transport::Transport;
use crate::cache::CacheStorage;
use crate::query::Query;
use crate::retry::RetryPolicy;

use super::mood_form::{mood_label, stress_label};

/// How many entries the dashboard lists.
pub const RECENT_ENTRIES: usize = 5;

#[derive(Debug, Clone, Default)]
pub struct DashboardData {
  pub mood_entries: Vec<MoodEntry>,
  pub employees: Vec<Employee>,
  pub departments: Vec<Department>,
  pub alerts: Vec<WellBeingAlert>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardStats {
  pub mood_entries: usize,
  pub employees: usize,
  pub active_alerts: usize,
  pub departments: usize,
}

/// Traffic-light classification of a 1-5 level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Band {
  Good,
  Neutral,
  Poor,
}

impl Band {
  fn marker(self) -> &'static str {
    match self {
      Band::Good => "+",
      Band::Neutral => "~",
      Band::Poor => "!",
    }
  }
}

/// Higher mood is better.
pub fn mood_band(level: u8) -> Band {
  match level {
    4.. => Band::Good,
    3 => Band::Neutral,
    _ => Band::Poor,
  }
}

/// Lower stress is better.
pub fn stress_band(level: u8) -> Band {
  match level {
    0..=2 => Band::Good,
    3 => Band::Neutral,
    _ => Band::Poor,
  }
}

/// Load the four resources one after another.
///
/// A cold dashboard costs four round trips in sequence.
pub async fn load_dashboard<T: Transport, S: CacheStorage>(
  client: &CachedApiClient<T, S>,
) -> Result<DashboardData, ApiError> {
  let mood_entries = client.list_mood_entries().await?;
  let employees = client.list_employees().await?;
  let departments = client.list_departments().await?;
  let alerts = client.list_alerts().await?;

  Ok(DashboardData {
    mood_entries,
    employees,
    departments,
    alerts,
  })
}

pub fn dashboard_query<T, S>(client: CachedApiClient<T, S>, policy: RetryPolicy) -> Query<DashboardData>
where
  T: Transport + 'static,
  S: CacheStorage + 'static,
{
  Query::new(move || {
    let client = client.clone();
    async move { load_dashboard(&client).await }
  })
  .with_retry(policy)
}

impl DashboardData {
  pub fn stats(&self) -> DashboardStats {
    DashboardStats {
      mood_entries: self.mood_entries.len(),
      employees: self.employees.len(),
      active_alerts: self
        .alerts
        .iter()
        .filter(|a| a.risk_level.is_active())
        .count(),
      departments: self.departments.len(),
    }
  }

  pub fn employee_name(&self, id: EmployeeId) -> Option<&str> {
    self
      .employees
      .iter()
      .find(|e| e.id == id)
      .map(|e| e.name.as_str())
  }

  /// Newest entries first (by date, then id).
  pub fn recent_entries(&self, limit: usize) -> Vec<&MoodEntry> {
    let mut entries: Vec<&MoodEntry> = self.mood_entries.iter().collect();
    entries.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
    entries.truncate(limit);
    entries
  }

  /// Alerts ordered by severity, most severe first.
  pub fn alerts_by_risk(&self) -> Vec<&WellBeingAlert> {
    let mut alerts: Vec<&WellBeingAlert> = self.alerts.iter().collect();
    alerts.sort_by(|a, b| {
      b.risk_level
        .cmp(&a.risk_level)
        .then_with(|| b.generated_at.cmp(&a.generated_at))
    });
    alerts
  }

  /// Average mood and stress over all entries, if there are any.
  pub fn averages(&self) -> Option<(f64, f64)> {
    if self.mood_entries.is_empty() {
      return None;
    }
    let n = self.mood_entries.len() as f64;
    let mood: u32 = self.mood_entries.iter().map(|e| u32::from(e.mood_level)).sum();
    let stress: u32 = self.mood_entries.iter().map(|e| u32::from(e.stress_level)).sum();
    Some((f64::from(mood) / n, f64::from(stress) / n))
  }
}

impl fmt::Display for DashboardData {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let stats = self.stats();

    writeln!(f, "Well-being dashboard")?;
    writeln!(f, "  Mood entries:   {}", stats.mood_entries)?;
    writeln!(f, "  Employees:      {}", stats.employees)?;
    writeln!(f, "  Active alerts:  {}", stats.active_alerts)?;
    writeln!(f, "  Departments:    {}", stats.departments)?;
    if let Some((mood, stress)) = self.averages() {
      writeln!(f, "  Average mood {:.1}, average stress {:.1}", mood, stress)?;
    }

    writeln!(f)?;
    writeln!(f, "Recent entries")?;
    let recent = self.recent_entries(RECENT_ENTRIES);
    if recent.is_empty() {
      writeln!(f, "  (none)")?;
    }
    for entry in recent {
      let name = self.employee_name(entry.employee_id).unwrap_or("unknown employee");
      writeln!(
        f,
        "  {} {:<24} mood {} {} ({}), stress {} {} ({})",
        entry.date,
        name,
        mood_band(entry.mood_level).marker(),
        entry.mood_level,
        mood_label(entry.mood_level),
        stress_band(entry.stress_level).marker(),
        entry.stress_level,
        stress_label(entry.stress_level),
      )?;
    }

    writeln!(f)?;
    writeln!(f, "Alerts")?;
    let alerts = self.alerts_by_risk();
    if alerts.is_empty() {
      writeln!(f, "  (none)")?;
    }
    for alert in alerts {
      let name = self.employee_name(alert.employee_id).unwrap_or("unknown employee");
      writeln!(
        f,
        "  [{:<8}] {} - {} ({}, {})",
        alert.risk_level.label().to_uppercase(),
        alert.alert_type,
        alert.description,
        name,
        alert.generated_at,
      )?;
    }

    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::transport::mock::MockTransport;
  use crate::api::client::ApiClient;
  use crate::api::RiskLevel;
  use crate::cache::{CacheLayer, MemoryStorage};
  use reqwest::{Method, StatusCode};
  use serde_json::json;

  fn entry(id: u64, date: &str, mood: u8, stress: u8, employee_id: u64) -> MoodEntry {
    MoodEntry {
      id,
      date: date.into(),
      mood_level: mood,
      stress_level: stress,
      note: "Anotação do dia".into(),
      employee_id,
    }
  }

  fn alert(id: u64, risk: RiskLevel, generated_at: &str) -> WellBeingAlert {
    WellBeingAlert {
      id,
      alert_type: "ESTRESSE_ELEVADO".into(),
      description: "Estresse alto por vários dias".into(),
      risk_level: risk,
      generated_at: generated_at.into(),
      employee_id: 1,
    }
  }

  fn sample() -> DashboardData {
    DashboardData {
      mood_entries: vec![
        entry(1, "2025-03-10", 4, 2, 1),
        entry(2, "2025-03-12", 2, 5, 2),
        entry(3, "2025-03-12", 3, 3, 1),
      ],
      employees: vec![Employee {
        id: 1,
        name: "Ana Souza".into(),
        tax_id: String::new(),
        email: String::new(),
        password_hash: String::new(),
        role_type: String::new(),
        department_id: 1,
      }],
      departments: vec![],
      alerts: vec![
        alert(1, RiskLevel::Medium, "2025-03-11"),
        alert(2, RiskLevel::Critical, "2025-03-10"),
        alert(3, RiskLevel::High, "2025-03-12"),
        alert(4, RiskLevel::Unknown, "2025-03-12"),
      ],
    }
  }

  #[test]
  fn test_stats_count_only_high_and_critical_alerts() {
    let stats = sample().stats();
    assert_eq!(
      stats,
      DashboardStats {
        mood_entries: 3,
        employees: 1,
        active_alerts: 2,
        departments: 0,
      }
    );
  }

  #[test]
  fn test_bands() {
    assert_eq!(mood_band(5), Band::Good);
    assert_eq!(mood_band(4), Band::Good);
    assert_eq!(mood_band(3), Band::Neutral);
    assert_eq!(mood_band(1), Band::Poor);
    assert_eq!(stress_band(1), Band::Good);
    assert_eq!(stress_band(2), Band::Good);
    assert_eq!(stress_band(3), Band::Neutral);
    assert_eq!(stress_band(5), Band::Poor);
  }

  #[test]
  fn test_recent_entries_newest_first() {
    let data = sample();
    let ids: Vec<u64> = data.recent_entries(2).iter().map(|e| e.id).collect();
    assert_eq!(ids, vec![3, 2]);
  }

  #[test]
  fn test_alerts_sorted_by_risk() {
    let data = sample();
    let ids: Vec<u64> = data.alerts_by_risk().iter().map(|a| a.id).collect();
    assert_eq!(ids, vec![2, 3, 1, 4]);
  }

  #[test]
  fn test_averages() {
    let (mood, stress) = sample().averages().unwrap();
    assert!((mood - 3.0).abs() < f64::EPSILON);
    assert!((stress - 10.0 / 3.0).abs() < 1e-9);
    assert!(DashboardData::default().averages().is_none());
  }

  #[test]
  fn test_render_names_employees() {
    let text = sample().to_string();
    assert!(text.contains("Active alerts:  2"));
    assert!(text.contains("Ana Souza"));
    assert!(text.contains("unknown employee"));
    assert!(text.contains("[CRITICAL]"));
  }

  #[tokio::test]
  async fn test_load_stops_at_first_failure() {
    let transport = MockTransport::new();
    transport.respond(Method::GET, "/api/humor", StatusCode::OK, json!([]));
    transport.respond_raw(Method::GET, "/api/empregado", StatusCode::SERVICE_UNAVAILABLE, "");
    transport.respond(Method::GET, "/api/departamento", StatusCode::OK, json!([]));
    transport.respond(Method::GET, "/api/alerta", StatusCode::OK, json!([]));

    let client = CachedApiClient::new(
      ApiClient::new("http://backend.test/api", transport.clone()).unwrap(),
      CacheLayer::new(MemoryStorage::new()),
    );

    let err = load_dashboard(&client).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));

    // Loads are sequential: nothing after the failing read is requested
    let paths: Vec<String> = transport
      .requests()
      .iter()
      .map(|r| r.url.path().to_string())
      .collect();
    assert_eq!(paths, vec!["/api/humor", "/api/empregado"]);
  }

  #[tokio::test]
  async fn test_query_loads_all_resources() {
    let transport = MockTransport::new();
    transport.respond(Method::GET, "/api/humor", StatusCode::OK, json!([]));
    transport.respond(Method::GET, "/api/empregado", StatusCode::OK, json!([]));
    transport.respond(Method::GET, "/api/departamento", StatusCode::OK, json!([{
      "id_departamento": 1,
      "nome_departamento": "Engenharia",
      "descricao": "Produto e plataforma",
      "quantidade_colaboradores": 12
    }]));
    transport.respond(Method::GET, "/api/alerta", StatusCode::OK, json!([]));

    let client = CachedApiClient::new(
      ApiClient::new("http://backend.test/api", transport.clone()).unwrap(),
      CacheLayer::new(MemoryStorage::new()),
    );

    let mut query = dashboard_query(client, RetryPolicy::none());
    let state = query
      .settle(std::time::Duration::from_millis(5), |_| {})
      .await;

    assert_eq!(state.data().unwrap().departments[0].headcount, 12);
  }
}
