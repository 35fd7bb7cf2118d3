//! Mood entry form: defaults, field validation and conversion to a request body.

use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;
use std::fmt;

use crate::api::{Employee, EmployeeId, MoodEntry, MoodEntryInput};

pub const LEVEL_MIN: u8 = 1;
pub const LEVEL_MAX: u8 = 5;
pub const NOTE_MIN_CHARS: usize = 10;
pub const NOTE_MAX_CHARS: usize = 1000;
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Form fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
  Employee,
  Date,
  Mood,
  Stress,
  Note,
}

impl fmt::Display for Field {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Employee => "employee",
      Self::Date => "date",
      Self::Mood => "mood",
      Self::Stress => "stress",
      Self::Note => "note",
    })
  }
}

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(BTreeMap<Field, String>);

impl ValidationErrors {
  fn add(&mut self, field: Field, message: impl Into<String>) {
    self.0.entry(field).or_insert_with(|| message.into());
  }

  #[cfg(test)]
  pub fn get(&self, field: Field) -> Option<&str> {
    self.0.get(&field).map(String::as_str)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  #[cfg(test)]
  pub fn len(&self) -> usize {
    self.0.len()
  }
}

impl fmt::Display for ValidationErrors {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let parts: Vec<String> = self
      .0
      .iter()
      .map(|(field, message)| format!("{}: {}", field, message))
      .collect();
    f.write_str(&parts.join("; "))
  }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoodForm {
  pub employee_id: Option<EmployeeId>,
  pub date: String,
  pub mood_level: u8,
  pub stress_level: u8,
  pub note: String,
}

impl Default for MoodForm {
  /// Neutral mood and stress, dated today.
  fn default() -> Self {
    Self {
      employee_id: None,
      date: Local::now().date_naive().format(DATE_FORMAT).to_string(),
      mood_level: 3,
      stress_level: 3,
      note: String::new(),
    }
  }
}

impl MoodForm {
  /// Prefill the form for editing an existing entry.
  pub fn from_entry(entry: &MoodEntry) -> Self {
    Self {
      employee_id: Some(entry.employee_id),
      date: entry.date.clone(),
      mood_level: entry.mood_level,
      stress_level: entry.stress_level,
      note: entry.note.clone(),
    }
  }

  /// Check every field and build the request body.
  pub fn validate(&self) -> Result<MoodEntryInput, ValidationErrors> {
    let mut errors = ValidationErrors::default();

    let employee_id = match self.employee_id {
      Some(id) if id > 0 => id,
      _ => {
        errors.add(Field::Employee, "select an employee");
        0
      }
    };

    if NaiveDate::parse_from_str(self.date.trim(), DATE_FORMAT).is_err() {
      errors.add(Field::Date, "date must be in YYYY-MM-DD format");
    }

    if !(LEVEL_MIN..=LEVEL_MAX).contains(&self.mood_level) {
      errors.add(Field::Mood, format!("mood must be between {} and {}", LEVEL_MIN, LEVEL_MAX));
    }
    if !(LEVEL_MIN..=LEVEL_MAX).contains(&self.stress_level) {
      errors.add(
        Field::Stress,
        format!("stress must be between {} and {}", LEVEL_MIN, LEVEL_MAX),
      );
    }

    let note = self.note.trim();
    let note_chars = note.chars().count();
    if note_chars == 0 {
      errors.add(Field::Note, "note is required");
    } else if note_chars < NOTE_MIN_CHARS {
      errors.add(
        Field::Note,
        format!("note must have at least {} characters", NOTE_MIN_CHARS),
      );
    } else if note_chars > NOTE_MAX_CHARS {
      errors.add(
        Field::Note,
        format!("note must have at most {} characters", NOTE_MAX_CHARS),
      );
    }

    if !errors.is_empty() {
      return Err(errors);
    }

    Ok(MoodEntryInput {
      date: self.date.trim().to_string(),
      mood_level: self.mood_level,
      stress_level: self.stress_level,
      note: note.to_string(),
      employee_id,
    })
  }

  /// Like `validate`, and also require the employee to be one of `employees`.
  pub fn validate_against(&self, employees: &[Employee]) -> Result<MoodEntryInput, ValidationErrors> {
    let known = self
      .employee_id
      .map_or(true, |id| employees.iter().any(|e| e.id == id));

    match self.validate() {
      Ok(input) if known => Ok(input),
      Ok(_) => {
        let mut errors = ValidationErrors::default();
        errors.add(Field::Employee, "unknown employee");
        Err(errors)
      }
      Err(mut errors) => {
        if !known {
          errors.add(Field::Employee, "unknown employee");
        }
        Err(errors)
      }
    }
  }
}

pub fn mood_label(level: u8) -> &'static str {
  match level {
    1 => "very bad",
    2 => "bad",
    3 => "neutral",
    4 => "good",
    5 => "very good",
    _ => "unknown",
  }
}

pub fn stress_label(level: u8) -> &'static str {
  match level {
    1 => "very low",
    2 => "low",
    3 => "moderate",
    4 => "high",
    5 => "very high",
    _ => "unknown",
  }
}
