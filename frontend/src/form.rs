//! The add/edit task form and its client-side checks.
//!
//! The server validates again; these checks only save a round trip for the
//! obvious mistakes.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use shared::{NewTaskRequest, Priority, Task, TaskChanges};

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    /// `YYYY-MM-DD` as produced by a date input; empty when unset.
    pub due_date: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub title: Option<&'static str>,
    pub description: Option<&'static str>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none()
    }
}

impl TaskForm {
    pub fn from_task(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            due_date: task.due_date.map(date_input_value).unwrap_or_default(),
            completed: task.completed,
        }
    }

    pub fn check(&self) -> FormErrors {
        let title = self.title.trim().chars().count();
        let description = self.description.trim().chars().count();
        FormErrors {
            title: if title == 0 {
                Some("Title is required")
            } else if title < TITLE_MIN {
                Some("Title must be at least 3 characters")
            } else if title > TITLE_MAX {
                Some("Title cannot exceed 100 characters")
            } else {
                None
            },
            description: (description > DESCRIPTION_MAX)
                .then_some("Description must be less than 500 characters"),
        }
    }

    pub fn to_new_request(&self) -> Result<NewTaskRequest, FormErrors> {
        let errors = self.check();
        if !errors.is_empty() {
            return Err(errors);
        }
        let description = self.description.trim();
        Ok(NewTaskRequest {
            title: self.title.trim().to_string(),
            description: (!description.is_empty()).then(|| description.to_string()),
            priority: Some(self.priority),
            due_date: parse_date_input(&self.due_date),
        })
    }

    /// Every edited field is sent; an empty due date leaves the stored one
    /// alone.
    pub fn to_changes(&self) -> Result<TaskChanges, FormErrors> {
        let errors = self.check();
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(TaskChanges {
            title: Some(self.title.trim().to_string()),
            description: Some(self.description.trim().to_string()),
            priority: Some(self.priority),
            due_date: parse_date_input(&self.due_date),
            completed: Some(self.completed),
        })
    }
}

/// A picked day means "due by the end of that day" in the user's time zone.
pub fn parse_date_input(raw: &str) -> Option<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()?;
    let end_of_day = date.and_hms_opt(23, 59, 59)?;
    Local
        .from_local_datetime(&end_of_day)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}

pub fn date_input_value(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%Y-%m-%d").to_string()
}

/// `Mar 4, 2025`
pub fn display_date(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%b %-d, %Y").to_string()
}
