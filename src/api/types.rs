//! Entities exchanged with the well-being backend.
//!
//! Field names follow the backend's JSON schema through serde renames.

use serde::{Deserialize, Serialize};
use std::fmt;

pub type MoodEntryId = u64;
pub type EmployeeId = u64;
pub type DepartmentId = u64;

/// One employee's self-reported mood and stress for a day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntry {
  #[serde(rename = "id_registro")]
  pub id: MoodEntryId,
  #[serde(rename = "data_registro")]
  pub date: String,
  /// 1 (very bad) to 5 (very good)
  #[serde(rename = "nivel_humor")]
  pub mood_level: u8,
  /// 1 (very low) to 5 (very high)
  #[serde(rename = "nivel_estresse")]
  pub stress_level: u8,
  #[serde(rename = "observacao", default)]
  pub note: String,
  #[serde(rename = "empregado_id_empregado")]
  pub employee_id: EmployeeId,
}

/// Body of a create or update request. The backend assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoodEntryInput {
  #[serde(rename = "data_registro")]
  pub date: String,
  #[serde(rename = "nivel_humor")]
  pub mood_level: u8,
  #[serde(rename = "nivel_estresse")]
  pub stress_level: u8,
  #[serde(rename = "observacao")]
  pub note: String,
  #[serde(rename = "empregado_id_empregado")]
  pub employee_id: EmployeeId,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
  #[serde(rename = "id_empregado")]
  pub id: EmployeeId,
  #[serde(rename = "nome")]
  pub name: String,
  #[serde(rename = "cpf", default)]
  pub tax_id: String,
  #[serde(default)]
  pub email: String,
  #[serde(rename = "senha", default)]
  pub password_hash: String,
  #[serde(rename = "tipo_colaborador", default)]
  pub role_type: String,
  #[serde(rename = "id_departamento")]
  pub department_id: DepartmentId,
}

// Keep the password hash out of logs.
impl fmt::Debug for Employee {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Employee")
      .field("id", &self.id)
      .field("name", &self.name)
      .field("email", &self.email)
      .field("role_type", &self.role_type)
      .field("department_id", &self.department_id)
      .finish_non_exhaustive()
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
  #[serde(rename = "id_departamento")]
  pub id: DepartmentId,
  #[serde(rename = "nome_departamento")]
  pub name: String,
  #[serde(rename = "descricao", default)]
  pub description: String,
  #[serde(rename = "quantidade_colaboradores", default)]
  pub headcount: u32,
}

/// Server-generated notification flagging a risk pattern for an employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WellBeingAlert {
  #[serde(rename = "id_alerta")]
  pub id: u64,
  #[serde(rename = "tipo_alerta")]
  pub alert_type: String,
  #[serde(rename = "descricao_alerta", default)]
  pub description: String,
  #[serde(rename = "nivel_risco")]
  pub risk_level: RiskLevel,
  #[serde(rename = "data_geracao")]
  pub generated_at: String,
  #[serde(rename = "empregado_id_empregado")]
  pub employee_id: EmployeeId,
}

/// Risk level of an alert, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
  #[serde(rename = "BAIXO", alias = "LOW")]
  Low,
  #[serde(rename = "MEDIO", alias = "MEDIUM")]
  Medium,
  #[serde(rename = "ALTO", alias = "HIGH")]
  High,
  #[serde(rename = "CRITICO", alias = "CRITICAL")]
  Critical,
  /// Any value the backend sends that we don't recognize
  #[serde(other)]
  Unknown,
}

impl RiskLevel {
  /// High and critical alerts count as active on the dashboard.
  pub fn is_active(self) -> bool {
    matches!(self, Self::High | Self::Critical)
  }

  /// Severity rank; unrecognized levels sort below `Low`.
  pub fn rank(self) -> u8 {
    match self {
      Self::Unknown => 0,
      Self::Low => 1,
      Self::Medium => 2,
      Self::High => 3,
      Self::Critical => 4,
    }
  }

  pub fn label(self) -> &'static str {
    match self {
      Self::Unknown => "unknown",
      Self::Low => "low",
      Self::Medium => "medium",
      Self::High => "high",
      Self::Critical => "critical",
    }
  }
}

impl Ord for RiskLevel {
  fn cmp(&self, other: &Self) -> std::cmp::Ordering {
    self.rank().cmp(&other.rank())
  }
}

impl PartialOrd for RiskLevel {
  fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
    Some(self.cmp(other))
  }
}

impl fmt::Display for RiskLevel {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.label())
  }
}

impl std::str::FromStr for RiskLevel {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "low" | "baixo" => Ok(Self::Low),
      "medium" | "medio" => Ok(Self::Medium),
      "high" | "alto" => Ok(Self::High),
      "critical" | "critico" => Ok(Self::Critical),
      other => Err(format!(
        "unknown risk level '{}' (expected low, medium, high or critical)",
        other
      )),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_mood_entry_from_backend_json() {
    let json = r#"{
      "id_registro": 12,
      "data_registro": "2025-03-14",
      "nivel_humor": 4,
      "nivel_estresse": 2,
      "observacao": "Dia tranquilo no trabalho",
      "empregado_id_empregado": 3
    }"#;

    let entry: MoodEntry = serde_json::from_str(json).unwrap();
    assert_eq!(entry.id, 12);
    assert_eq!(entry.mood_level, 4);
    assert_eq!(entry.stress_level, 2);
    assert_eq!(entry.employee_id, 3);
  }

  #[test]
  fn test_input_uses_backend_field_names() {
    let input = MoodEntryInput {
      date: "2025-03-14".into(),
      mood_level: 3,
      stress_level: 3,
      note: "Semana cheia de entregas".into(),
      employee_id: 9,
    };

    let value = serde_json::to_value(&input).unwrap();
    assert_eq!(value["nivel_humor"], 3);
    assert_eq!(value["empregado_id_empregado"], 9);
    assert!(value.get("id_registro").is_none());
  }

  #[test]
  fn test_risk_level_wire_values() {
    let levels: Vec<RiskLevel> =
      serde_json::from_str(r#"["BAIXO", "MEDIO", "ALTO", "CRITICO", "HIGH", "EXTREMO"]"#).unwrap();
    assert_eq!(
      levels,
      vec![
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
        RiskLevel::High,
        RiskLevel::Unknown,
      ]
    );
    assert_eq!(serde_json::to_string(&RiskLevel::Critical).unwrap(), "\"CRITICO\"");
  }

  #[test]
  fn test_alert_with_unrecognized_risk_decodes_and_reencodes() {
    let json = r#"{
      "id_alerta": 4,
      "tipo_alerta": "ESTRESSE_ELEVADO",
      "descricao_alerta": "Estresse alto por 5 dias seguidos",
      "nivel_risco": "EXTREMO",
      "data_geracao": "2025-03-14T09:00:00",
      "empregado_id_empregado": 7
    }"#;

    let alert: WellBeingAlert = serde_json::from_str(json).unwrap();
    assert_eq!(alert.risk_level, RiskLevel::Unknown);

    let cached = serde_json::to_value(&alert).unwrap();
    let back: WellBeingAlert = serde_json::from_value(cached).unwrap();
    assert_eq!(back, alert);
  }

  #[test]
  fn test_risk_level_active_and_order() {
    assert!(RiskLevel::Critical.is_active());
    assert!(RiskLevel::High.is_active());
    assert!(!RiskLevel::Medium.is_active());
    assert!(RiskLevel::Critical > RiskLevel::Low);
    assert!(RiskLevel::Unknown < RiskLevel::Low);

    let mut levels = vec![
      RiskLevel::High,
      RiskLevel::Unknown,
      RiskLevel::Critical,
      RiskLevel::Low,
      RiskLevel::Medium,
    ];
    levels.sort();
    assert_eq!(
      levels,
      vec![
        RiskLevel::Unknown,
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
      ]
    );
    assert_eq!("Alto".parse::<RiskLevel>(), Ok(RiskLevel::High));
    assert!("severe".parse::<RiskLevel>().is_err());
  }

  #[test]
  fn test_employee_debug_hides_password() {
    let employee = Employee {
      id: 1,
      name: "Ana".into(),
      tax_id: "000".into(),
      email: "ana@example.com".into(),
      password_hash: "secret-hash".into(),
      role_type: "COLABORADOR".into(),
      department_id: 2,
    };
    assert!(!format!("{:?}", employee).contains("secret-hash"));
  }
}
