use clap::Subcommand;
use color_eyre::{eyre::eyre, Result};
use std::io::{IsTerminal, Write};
use std::time::Duration;
use tokio::time::Instant;

use crate::api::{CachedApiClient, EmployeeId, MoodEntryId, RiskLevel};
use crate::config::Config;
use crate::pages::dashboard::dashboard_query;
use crate::pages::directory::{
  alerts_query, departments_query, employees_query, filter_alerts, AlertList, DepartmentList,
  EmployeeList,
};
use crate::pages::mood_form::MoodForm;
use crate::pages::moods::{mood_board_query, MoodFilter, MoodManager};
use crate::query::{Query, QueryState};
use crate::retry::RetryPolicy;

/// How often a pending query is polled.
const TICK_RATE: Duration = Duration::from_millis(100);

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Totals, recent entries and alerts
  Dashboard,

  /// List mood entries
  Moods {
    /// Only entries by this employee
    #[arg(short, long)]
    employee: Option<EmployeeId>,
    /// Only entries on this date (YYYY-MM-DD)
    #[arg(short, long)]
    date: Option<String>,
  },

  /// List employees
  Employees,

  /// List departments
  Departments,

  /// List well-being alerts
  Alerts {
    /// Hide alerts below this risk level (low, medium, high, critical)
    #[arg(long)]
    min_risk: Option<RiskLevel>,
  },

  /// Record a new mood entry
  Log {
    #[arg(short, long)]
    employee: EmployeeId,
    /// Mood from 1 (very bad) to 5 (very good)
    #[arg(short, long, default_value_t = 3)]
    mood: u8,
    /// Stress from 1 (very low) to 5 (very high)
    #[arg(short, long, default_value_t = 3)]
    stress: u8,
    /// What happened today (10 to 1000 characters)
    #[arg(short, long)]
    note: String,
    /// Entry date (YYYY-MM-DD), defaults to today
    #[arg(short, long)]
    date: Option<String>,
  },

  /// Change an existing mood entry; omitted fields keep their value
  Edit {
    id: MoodEntryId,
    #[arg(short, long)]
    employee: Option<EmployeeId>,
    #[arg(short, long)]
    mood: Option<u8>,
    #[arg(short, long)]
    stress: Option<u8>,
    #[arg(short, long)]
    note: Option<String>,
    #[arg(short, long)]
    date: Option<String>,
  },

  /// Delete a mood entry
  Delete { id: MoodEntryId },
}

/// Main application state
pub struct App {
  client: CachedApiClient,
  policy: RetryPolicy,
}

impl App {
  pub fn new(config: &Config) -> Result<Self> {
    Ok(Self {
      client: CachedApiClient::from_config(config)?,
      policy: config.retry.policy(),
    })
  }

  pub async fn run(&self, command: Command) -> Result<()> {
    match command {
      Command::Dashboard => {
        let data = self
          .load("dashboard", dashboard_query(self.client.clone(), self.policy))
          .await?;
        print!("{}", data);
      }
      Command::Moods { employee, date } => {
        let filter = MoodFilter {
          employee_id: employee,
          date,
        };
        self.show_moods(&filter).await?;
      }
      Command::Employees => {
        let employees = self
          .load("employees", employees_query(self.client.clone(), self.policy))
          .await?;
        let departments = self
          .load("departments", departments_query(self.client.clone(), self.policy))
          .await?;
        print!(
          "{}",
          EmployeeList {
            employees: &employees,
            departments: &departments,
          }
        );
      }
      Command::Departments => {
        let departments = self
          .load("departments", departments_query(self.client.clone(), self.policy))
          .await?;
        print!("{}", DepartmentList(&departments));
      }
      Command::Alerts { min_risk } => {
        let alerts = self
          .load("alerts", alerts_query(self.client.clone(), self.policy))
          .await?;
        print!("{}", AlertList(&filter_alerts(&alerts, min_risk)));
      }
      Command::Log {
        employee,
        mood,
        stress,
        note,
        date,
      } => {
        let mut form = MoodForm {
          employee_id: Some(employee),
          mood_level: mood,
          stress_level: stress,
          note,
          ..MoodForm::default()
        };
        if let Some(date) = date {
          form.date = date;
        }
        self.log_entry(form).await?;
      }
      Command::Edit {
        id,
        employee,
        mood,
        stress,
        note,
        date,
      } => {
        let board = self
          .load("mood entries", mood_board_query(self.client.clone(), self.policy))
          .await?;
        let entry = board
          .find(id)
          .ok_or_else(|| eyre!("Mood entry #{} not found", id))?;

        let mut manager = MoodManager::new(self.client.clone());
        let mut form = manager.start_edit(entry);
        if let Some(employee) = employee {
          form.employee_id = Some(employee);
        }
        if let Some(mood) = mood {
          form.mood_level = mood;
        }
        if let Some(stress) = stress {
          form.stress_level = stress;
        }
        if let Some(note) = note {
          form.note = note;
        }
        if let Some(date) = date {
          form.date = date;
        }

        let saved = manager.save(&form).await?;
        println!("Updated entry #{}", saved.id);
        self
          .show_moods(&MoodFilter {
            employee_id: Some(saved.employee_id),
            date: None,
          })
          .await?;
      }
      Command::Delete { id } => {
        let mut manager = MoodManager::new(self.client.clone());
        if manager.delete(id).await? {
          println!("Deleted entry #{}", id);
        } else {
          println!("The server did not confirm deleting entry #{}", id);
        }
        self.show_moods(&MoodFilter::default()).await?;
      }
    }

    Ok(())
  }

  async fn show_moods(&self, filter: &MoodFilter) -> Result<()> {
    let board = self
      .load("mood entries", mood_board_query(self.client.clone(), self.policy))
      .await?;
    print!("{}", board.filtered(filter));
    Ok(())
  }

  async fn log_entry(&self, form: MoodForm) -> Result<()> {
    // The employee list backs the form's employee check, like the select box
    // on the registration page.
    let employees = self
      .policy
      .run(|| self.client.list_employees())
      .await?;
    form.validate_against(&employees)?;

    let mut manager = MoodManager::new(self.client.clone());
    let saved = manager.save(&form).await?;
    println!("Saved entry #{} for {}", saved.id, saved.date);

    self
      .show_moods(&MoodFilter {
        employee_id: Some(saved.employee_id),
        date: None,
      })
      .await
  }

  /// Drive a page query to completion, reporting progress on stderr.
  ///
  /// After the automatic retries are used up, an interactive terminal is
  /// offered a manual retry.
  async fn load<T: Send + 'static>(&self, what: &str, mut query: Query<T>) -> Result<T> {
    loop {
      query
        .settle(TICK_RATE, |state| report(what, state))
        .await;

      if query.is_success() {
        break;
      }

      let message = query
        .failure()
        .map(|f| f.message.clone())
        .unwrap_or_default();

      if !ask_retry(what).await? {
        return Err(eyre!("Could not load {}: {}", what, message));
      }
      query.retry();
      report(what, query.state());
    }

    query
      .into_data()
      .ok_or_else(|| eyre!("Could not load {}", what))
  }
}

fn report<T>(what: &str, state: &QueryState<T>) {
  match state {
    QueryState::Loading => eprintln!("Loading {}...", what),
    QueryState::Error(failure) => {
      let reason = if failure.timed_out {
        "The server is slow to respond".to_string()
      } else {
        failure.message.clone()
      };
      match failure.retry_at {
        Some(at) => {
          let wait = at.saturating_duration_since(Instant::now());
          eprintln!(
            "{}. Retrying in {}s (attempt {} failed)",
            reason,
            wait.as_secs_f32().ceil() as u64,
            failure.failures
          );
        }
        None => eprintln!("{}. Giving up after {} attempts.", reason, failure.failures),
      }
    }
    QueryState::Idle | QueryState::Success(_) => {}
  }
}

/// Ask whether to retry a failed load. Non-interactive runs never retry.
async fn ask_retry(what: &str) -> Result<bool> {
  if !std::io::stdin().is_terminal() {
    return Ok(false);
  }

  let prompt = format!("Retry loading {}? [y/N] ", what);
  let answer = tokio::task::spawn_blocking(move || -> std::io::Result<String> {
    let mut stderr = std::io::stderr();
    stderr.write_all(prompt.as_bytes())?;
    stderr.flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line)
  })
  .await??;

  Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}
