use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Ordering weight used when sorting by priority: low < medium < high.
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownPriority(pub String);

impl fmt::Display for UnknownPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is not a valid priority level", self.0)
    }
}

impl std::error::Error for UnknownPriority {}

impl FromStr for Priority {
    type Err = UnknownPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(UnknownPriority(other.to_string())),
        }
    }
}

/// A task document as it is persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub owner: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// A task is overdue when it has a due date that has passed and it is
    /// still open.
    pub fn is_overdue_at(&self, now: DateTime<Utc>) -> bool {
        match self.due_date {
            Some(due) if !self.completed => now > due,
            _ => false,
        }
    }

    pub fn view_at(self, now: DateTime<Utc>) -> TaskView {
        let is_overdue = self.is_overdue_at(now);
        TaskView {
            task: self,
            is_overdue,
        }
    }
}

/// The task representation sent over the wire, carrying the derived
/// overdue flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    #[serde(rename = "isOverdue", default)]
    pub is_overdue: bool,
}

impl TaskView {
    pub fn id(&self) -> Uuid {
        self.task.id
    }
}

/// Body the client sends to create a task.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskRequest {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
}

/// A partial update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskChanges {
    pub fn completion(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Applies the supplied fields onto `task`, leaving everything else as is.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = Some(due_date);
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    fn sample(due_in_hours: Option<i64>, completed: bool) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            owner: "user-1".into(),
            title: "Read chapter 4".into(),
            description: String::new(),
            priority: Priority::Medium,
            due_date: due_in_hours.map(|h| now + Duration::hours(h)),
            completed,
            created_at: now,
            updated_at: now,
        }
    }

    #[rstest]
    #[case(None, false, false)]
    #[case(Some(-2), false, true)]
    #[case(Some(-2), true, false)]
    #[case(Some(2), false, false)]
    fn overdue_is_derived_from_due_date_and_completion(
        #[case] due_in_hours: Option<i64>,
        #[case] completed: bool,
        #[case] expected: bool,
    ) {
        let task = sample(due_in_hours, completed);
        assert_eq!(task.is_overdue_at(Utc::now()), expected);
    }

    #[test]
    fn view_serializes_camel_case_with_overdue_flag() {
        let task = sample(Some(-1), false);
        let json = serde_json::to_value(task.clone().view_at(Utc::now())).unwrap();
        assert_eq!(json["isOverdue"], true);
        assert_eq!(json["owner"], "user-1");
        assert_eq!(json["priority"], "medium");
        assert!(json.get("dueDate").is_some());
        assert!(json.get("createdAt").is_some());

        let back: TaskView = serde_json::from_value(json).unwrap();
        assert_eq!(back.task, task);
    }

    #[test]
    fn priority_parses_only_known_levels() {
        assert_eq!("high".parse::<Priority>(), Ok(Priority::High));
        assert!("urgent".parse::<Priority>().is_err());
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn changes_apply_only_supplied_fields() {
        let mut task = sample(None, false);
        let before = task.clone();
        TaskChanges::completion(true).apply_to(&mut task);
        assert!(task.completed);
        assert_eq!(task.title, before.title);
        assert_eq!(task.priority, before.priority);
    }
}
