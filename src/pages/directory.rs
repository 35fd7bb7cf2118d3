//! Read-only listings of employees, departments and alerts.

use std::fmt;

use crate::api::transport::Transport;
use crate::api::{CachedApiClient, Department, Employee, RiskLevel, WellBeingAlert};
use crate::cache::CacheStorage;
use crate::query::Query;
use crate::retry::RetryPolicy;

pub fn employees_query<T, S>(client: CachedApiClient<T, S>, policy: RetryPolicy) -> Query<Vec<Employee>>
where
  T: Transport + 'static,
  S: CacheStorage + 'static,
{
  Query::new(move || {
    let client = client.clone();
    async move { client.list_employees().await }
  })
  .with_retry(policy)
}

pub fn departments_query<T, S>(
  client: CachedApiClient<T, S>,
  policy: RetryPolicy,
) -> Query<Vec<Department>>
where
  T: Transport + 'static,
  S: CacheStorage + 'static,
{
  Query::new(move || {
    let client = client.clone();
    async move { client.list_departments().await }
  })
  .with_retry(policy)
}

pub fn alerts_query<T, S>(client: CachedApiClient<T, S>, policy: RetryPolicy) -> Query<Vec<WellBeingAlert>>
where
  T: Transport + 'static,
  S: CacheStorage + 'static,
{
  Query::new(move || {
    let client = client.clone();
    async move { client.list_alerts().await }
  })
  .with_retry(policy)
}

/// Employee table with department names resolved.
pub struct EmployeeList<'a> {
  pub employees: &'a [Employee],
  pub departments: &'a [Department],
}

impl fmt::Display for EmployeeList<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Employees ({})", self.employees.len())?;
    for employee in self.employees {
      let department = self
        .departments
        .iter()
        .find(|d| d.id == employee.department_id)
        .map(|d| d.name.as_str())
        .unwrap_or("-");
      writeln!(
        f,
        "  #{:<5} {:<24} {:<28} {:<14} {}",
        employee.id, employee.name, employee.email, employee.role_type, department
      )?;
    }
    Ok(())
  }
}

pub struct DepartmentList<'a>(pub &'a [Department]);

impl fmt::Display for DepartmentList<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Departments ({})", self.0.len())?;
    for department in self.0 {
      writeln!(
        f,
        "  #{:<5} {:<24} {:>4} people  {}",
        department.id, department.name, department.headcount, department.description
      )?;
    }
    Ok(())
  }
}

/// Alerts at or above `min_risk`, most severe first.
pub fn filter_alerts(alerts: &[WellBeingAlert], min_risk: Option<RiskLevel>) -> Vec<&WellBeingAlert> {
  let mut selected: Vec<&WellBeingAlert> = alerts
    .iter()
    .filter(|a| min_risk.map_or(true, |min| a.risk_level >= min))
    .collect();
  selected.sort_by(|a, b| b.risk_level.cmp(&a.risk_level));
  selected
}

pub struct AlertList<'a>(pub &'a [&'a WellBeingAlert]);

impl fmt::Display for AlertList<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "Alerts ({})", self.0.len())?;
    for alert in self.0 {
      writeln!(
        f,
        "  [{:<8}] #{:<5} {} employee #{} - {} ({})",
        alert.risk_level.label().to_uppercase(),
        alert.id,
        alert.alert_type,
        alert.employee_id,
        alert.description,
        alert.generated_at
      )?;
    }
    Ok(())
  }
}
