//! Caching implementations for backend types.

use crate::cache::{Cacheable, QueryKey};

use super::types::{Department, Employee, MoodEntry, WellBeingAlert};

// ============================================================================
// Cacheable implementations
// ============================================================================

impl Cacheable for MoodEntry {
  fn entity_type() -> &'static str {
    "mood_entry"
  }
}

impl Cacheable for Employee {
  fn entity_type() -> &'static str {
    "employee"
  }
}

impl Cacheable for Department {
  fn entity_type() -> &'static str {
    "department"
  }
}

impl Cacheable for WellBeingAlert {
  fn entity_type() -> &'static str {
    "alert"
  }
}

// ============================================================================
// Query key types
// ============================================================================

/// One cache key per list endpoint. The backend takes no query parameters,
/// so a key never needs more than the resource it names.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResourceKey {
  MoodEntries,
  Employees,
  Departments,
  Alerts,
}

impl QueryKey for ResourceKey {
  fn cache_key(&self) -> String {
    match self {
      Self::MoodEntries => "registros-humor",
      Self::Employees => "empregados",
      Self::Departments => "departamentos",
      Self::Alerts => "alertas",
    }
    .to_string()
  }

  fn description(&self) -> String {
    match self {
      Self::MoodEntries => "mood entries",
      Self::Employees => "employees",
      Self::Departments => "departments",
      Self::Alerts => "alerts",
    }
    .to_string()
  }
}
