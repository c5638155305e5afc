//! Task persistence.
//!
//! [`TaskStore`] is the document-store seam: every read and write is scoped
//! by owner, and the update/delete operations are single atomic
//! find-and-modify steps. Both implementations run the same document
//! checks before writing, see [`prepare_new`] and [`prepare_changes`].

mod memory;
mod redis_store;

pub use self::memory::MemoryTaskStore;
pub use self::redis_store::RedisTaskStore;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use shared::{Priority, Task, TaskChanges};
use thiserror::Error;
use uuid::Uuid;

const TITLE_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("document validation failed: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("duplicate key on {field}")]
    Duplicate { field: String },

    #[error("stored document {key} is unreadable: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Fields for a task about to be inserted. The owner always comes from the
/// authenticated caller.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub owner: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
}

/// Equality filter for `find`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub owner: String,
    pub completed: Option<bool>,
}

impl TaskFilter {
    pub fn owner(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            completed: None,
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        task.owner == self.owner && self.completed.map_or(true, |c| task.completed == c)
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: NewTask) -> Result<Task, StoreError>;

    /// Every task matching `filter`, oldest first.
    async fn find(&self, filter: &TaskFilter) -> Result<Vec<Task>, StoreError>;

    async fn find_one(&self, id: Uuid, owner: &str) -> Result<Option<Task>, StoreError>;

    /// Applies `changes` to the task matching (id, owner) and returns the
    /// updated document, or `None` if nothing matched.
    async fn find_one_and_update(
        &self,
        id: Uuid,
        owner: &str,
        changes: &TaskChanges,
    ) -> Result<Option<Task>, StoreError>;

    /// Removes the task matching (id, owner) and returns it, or `None` if
    /// nothing matched.
    async fn find_one_and_delete(&self, id: Uuid, owner: &str) -> Result<Option<Task>, StoreError>;
}

/// Creation order for stores without a natural one. Tasks created in the
/// same instant fall back to id order so listings stay deterministic.
pub fn sort_by_creation(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}

/// Midnight of the current server-local day, as an instant.
pub fn start_of_day(now: DateTime<Utc>) -> DateTime<Utc> {
    let local_date = now.with_timezone(&Local).date_naive();
    local_date
        .and_hms_opt(0, 0, 0)
        .and_then(|midnight| Local.from_local_datetime(&midnight).earliest())
        .map(|midnight| midnight.with_timezone(&Utc))
        .unwrap_or(now)
}

/// Normalises and checks a new document, assigning its id and timestamps.
pub fn prepare_new(new: NewTask, now: DateTime<Utc>) -> Result<Task, StoreError> {
    let title = new.title.trim().to_string();
    let description = new.description.as_deref().map(str::trim).unwrap_or_default().to_string();

    let mut errors = Vec::new();
    check_title(&title, &mut errors);
    check_description(&description, &mut errors);
    if let Some(due) = new.due_date {
        if due < start_of_day(now) {
            errors.push("Due date cannot be in the past".to_string());
        }
    }
    if !errors.is_empty() {
        return Err(StoreError::Validation(errors));
    }

    Ok(Task {
        id: Uuid::new_v4(),
        owner: new.owner,
        title,
        description,
        priority: new.priority,
        due_date: new.due_date,
        completed: new.completed,
        created_at: now,
        updated_at: now,
    })
}

/// Normalises and checks the supplied fields of an update. Due dates are
/// not re-checked against the current day.
pub fn prepare_changes(changes: &TaskChanges) -> Result<TaskChanges, StoreError> {
    let mut prepared = changes.clone();
    prepared.title = changes.title.as_deref().map(|t| t.trim().to_string());
    prepared.description = changes.description.as_deref().map(|d| d.trim().to_string());

    let mut errors = Vec::new();
    if let Some(title) = &prepared.title {
        check_title(title, &mut errors);
    }
    if let Some(description) = &prepared.description {
        check_description(description, &mut errors);
    }
    if !errors.is_empty() {
        return Err(StoreError::Validation(errors));
    }
    Ok(prepared)
}

fn check_title(title: &str, errors: &mut Vec<String>) {
    if title.is_empty() {
        errors.push("Task title is required".to_string());
    } else if title.chars().count() > TITLE_MAX {
        errors.push(format!("Title cannot exceed {TITLE_MAX} characters"));
    }
}

fn check_description(description: &str, errors: &mut Vec<String>) {
    if description.chars().count() > DESCRIPTION_MAX {
        errors.push(format!("Description cannot exceed {DESCRIPTION_MAX} characters"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_task(title: &str) -> NewTask {
        NewTask {
            owner: "uid-1".into(),
            title: title.into(),
            description: Some("  notes  ".into()),
            priority: Priority::High,
            due_date: None,
            completed: false,
        }
    }

    #[test]
    fn prepare_new_trims_and_stamps() {
        let now = Utc::now();
        let task = prepare_new(new_task("  Essay draft "), now).unwrap();
        assert_eq!(task.title, "Essay draft");
        assert_eq!(task.description, "notes");
        assert_eq!(task.created_at, now);
        assert_eq!(task.updated_at, now);
        assert_eq!(task.owner, "uid-1");
    }

    #[test]
    fn creation_order_breaks_ties_by_id() {
        let now = Utc::now();
        let mut older = prepare_new(new_task("Older"), now - Duration::seconds(5)).unwrap();
        older.id = Uuid::from_u128(9);
        let mut tied_high = prepare_new(new_task("Tied high"), now).unwrap();
        tied_high.id = Uuid::from_u128(2);
        let mut tied_low = prepare_new(new_task("Tied low"), now).unwrap();
        tied_low.id = Uuid::from_u128(1);

        let mut tasks = vec![tied_high, older, tied_low];
        sort_by_creation(&mut tasks);
        let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(titles, ["Older", "Tied low", "Tied high"]);
    }

    #[test]
    fn prepare_new_collects_document_errors() {
        let mut new = new_task("   ");
        new.description = Some("x".repeat(501));
        new.due_date = Some(Utc::now() - Duration::days(2));
        let StoreError::Validation(errors) = prepare_new(new, Utc::now()).unwrap_err() else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors,
            vec![
                "Task title is required",
                "Description cannot exceed 500 characters",
                "Due date cannot be in the past",
            ]
        );
    }

    #[test]
    fn earlier_today_is_not_in_the_past() {
        let now = Utc::now();
        let mut new = new_task("Quiz");
        new.due_date = Some(start_of_day(now));
        assert!(prepare_new(new, now).is_ok());
    }

    #[test]
    fn prepare_changes_ignores_due_dates() {
        let changes = TaskChanges {
            due_date: Some(Utc::now() - Duration::days(30)),
            title: Some("  Renamed  ".into()),
            ..TaskChanges::default()
        };
        let prepared = prepare_changes(&changes).unwrap();
        assert_eq!(prepared.title.as_deref(), Some("Renamed"));
        assert_eq!(prepared.due_date, changes.due_date);
    }

    #[test]
    fn prepare_changes_rejects_blank_title() {
        let changes = TaskChanges {
            title: Some("    ".into()),
            ..TaskChanges::default()
        };
        assert!(matches!(
            prepare_changes(&changes),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn filter_matches_owner_and_completion() {
        let task = prepare_new(new_task("Lab"), Utc::now()).unwrap();
        assert!(TaskFilter::owner("uid-1").matches(&task));
        assert!(!TaskFilter::owner("uid-2").matches(&task));
        let pending = TaskFilter {
            completed: Some(false),
            ..TaskFilter::owner("uid-1")
        };
        assert!(pending.matches(&task));
        let done = TaskFilter {
            completed: Some(true),
            ..TaskFilter::owner("uid-1")
        };
        assert!(!done.matches(&task));
    }
}
