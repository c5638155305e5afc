//! Schema validation for task payloads.
//!
//! One base schema, two modes: `Create` requires a title and fills in
//! defaults, `Patch` makes every field optional and injects nothing.
//! Unknown fields are dropped and every invalid field is reported in a
//! single pass.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde_json::{Map, Value};
use shared::{Priority, TaskChanges};

const TITLE_MIN: usize = 3;
const TITLE_MAX: usize = 100;
const DESCRIPTION_MAX: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Patch,
}

/// A validated create payload with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
}

pub fn validate_create(body: &Value, now: DateTime<Utc>) -> Result<TaskDraft, Vec<String>> {
    let changes = validate_task_input(body, Mode::Create, now)?;
    Ok(TaskDraft {
        title: changes.title.unwrap_or_default(),
        description: changes.description,
        priority: changes.priority.unwrap_or_default(),
        due_date: changes.due_date,
        completed: changes.completed.unwrap_or(false),
    })
}

pub fn validate_patch(body: &Value) -> Result<TaskChanges, Vec<String>> {
    validate_task_input(body, Mode::Patch, Utc::now())
}

/// Validates `body` in the given mode. On success the returned changes
/// hold only known fields, with the title trimmed and, in create mode,
/// `priority` and `completed` defaulted.
pub fn validate_task_input(
    body: &Value,
    mode: Mode,
    now: DateTime<Utc>,
) -> Result<TaskChanges, Vec<String>> {
    let Some(fields) = body.as_object() else {
        return Err(vec![r#""value" must be of type object"#.to_string()]);
    };

    let mut errors = Vec::new();
    let mut changes = TaskChanges {
        title: check_title(fields, mode, &mut errors),
        description: check_description(fields, &mut errors),
        priority: check_priority(fields, &mut errors),
        due_date: check_due_date(fields, mode, now, &mut errors),
        completed: check_completed(fields, &mut errors),
    };

    if !errors.is_empty() {
        return Err(errors);
    }

    if mode == Mode::Create {
        changes.priority.get_or_insert(Priority::Medium);
        changes.completed.get_or_insert(false);
    }
    Ok(changes)
}

fn check_title(fields: &Map<String, Value>, mode: Mode, errors: &mut Vec<String>) -> Option<String> {
    let Some(value) = fields.get("title") else {
        if mode == Mode::Create {
            errors.push(r#""title" is required"#.to_string());
        }
        return None;
    };
    let Some(raw) = value.as_str() else {
        errors.push(r#""title" must be a string"#.to_string());
        return None;
    };

    let title = raw.trim();
    let length = title.chars().count();
    if length == 0 {
        errors.push(r#""title" is not allowed to be empty"#.to_string());
    } else if length < TITLE_MIN {
        errors.push(format!(
            r#""title" length must be at least {TITLE_MIN} characters long"#
        ));
    } else if length > TITLE_MAX {
        errors.push(format!(
            r#""title" length must be less than or equal to {TITLE_MAX} characters long"#
        ));
    } else {
        return Some(title.to_string());
    }
    None
}

fn check_description(fields: &Map<String, Value>, errors: &mut Vec<String>) -> Option<String> {
    let value = fields.get("description")?;
    let Some(description) = value.as_str() else {
        errors.push(r#""description" must be a string"#.to_string());
        return None;
    };
    if description.chars().count() > DESCRIPTION_MAX {
        errors.push(format!(
            r#""description" length must be less than or equal to {DESCRIPTION_MAX} characters long"#
        ));
        return None;
    }
    Some(description.to_string())
}

fn check_priority(fields: &Map<String, Value>, errors: &mut Vec<String>) -> Option<Priority> {
    let value = fields.get("priority")?;
    match value.as_str().map(str::parse::<Priority>) {
        Some(Ok(priority)) => Some(priority),
        _ => {
            errors.push(r#""priority" must be one of [low, medium, high]"#.to_string());
            None
        }
    }
}

fn check_due_date(
    fields: &Map<String, Value>,
    mode: Mode,
    now: DateTime<Utc>,
    errors: &mut Vec<String>,
) -> Option<DateTime<Utc>> {
    let value = fields.get("dueDate")?;
    let Some(due) = parse_date(value) else {
        errors.push(r#""dueDate" must be a valid date"#.to_string());
        return None;
    };
    // Only new tasks are held to "not in the past".
    if mode == Mode::Create && due < now {
        errors.push(r#""dueDate" must be greater than or equal to "now""#.to_string());
        return None;
    }
    Some(due)
}

fn check_completed(fields: &Map<String, Value>, errors: &mut Vec<String>) -> Option<bool> {
    let value = fields.get("completed")?;
    match value.as_bool() {
        Some(completed) => Some(completed),
        None => {
            errors.push(r#""completed" must be a boolean"#.to_string());
            None
        }
    }
}

/// Accepts RFC 3339 timestamps, bare `YYYY-MM-DD` dates (UTC midnight),
/// zone-less `YYYY-MM-DDTHH:MM[:SS]` in server-local time, and epoch
/// milliseconds.
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => {
            let raw = raw.trim();
            if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
                return Some(parsed.with_timezone(&Utc));
            }
            if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
                return date.and_hms_opt(0, 0, 0).map(|midnight| midnight.and_utc());
            }
            ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
                .and_then(|local| Local.from_local_datetime(&local).earliest())
                .map(|local| local.with_timezone(&Utc))
        }
        Value::Number(millis) => millis.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;
    use serde_json::json;

    fn title_of(len: usize) -> String {
        "a".repeat(len)
    }

    #[rstest]
    #[case(2, false)]
    #[case(3, true)]
    #[case(100, true)]
    #[case(101, false)]
    fn title_length_bounds(#[case] len: usize, #[case] accepted: bool) {
        let result = validate_create(&json!({ "title": title_of(len) }), Utc::now());
        assert_eq!(result.is_ok(), accepted, "length {len}");
        if let Err(errors) = result {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].starts_with(r#""title""#));
        }
    }

    #[test]
    fn title_is_measured_after_trimming() {
        let errors = validate_create(&json!({ "title": "  ab   " }), Utc::now()).unwrap_err();
        assert_eq!(errors, vec![r#""title" length must be at least 3 characters long"#]);

        let draft = validate_create(&json!({ "title": "  Essay  " }), Utc::now()).unwrap();
        assert_eq!(draft.title, "Essay");
    }

    #[test]
    fn create_applies_defaults_and_strips_unknown_fields() {
        let body = json!({ "title": "Revise notes", "owner": "someone-else", "userId": "x" });
        let changes = validate_task_input(&body, Mode::Create, Utc::now()).unwrap();
        assert_eq!(changes.priority, Some(Priority::Medium));
        assert_eq!(changes.completed, Some(false));
        assert_eq!(changes.description, None);
    }

    #[test]
    fn patch_requires_nothing_and_injects_nothing() {
        let changes = validate_patch(&json!({})).unwrap();
        assert!(changes.is_empty());

        let changes = validate_patch(&json!({ "completed": true })).unwrap();
        assert_eq!(changes, TaskChanges::completion(true));
    }

    #[test]
    fn every_invalid_field_is_reported_in_order() {
        let body = json!({
            "title": "x",
            "description": "d".repeat(501),
            "priority": "urgent",
            "dueDate": "next tuesday",
            "completed": "yes",
        });
        let errors = validate_create(&body, Utc::now()).unwrap_err();
        assert_eq!(
            errors,
            vec![
                r#""title" length must be at least 3 characters long"#,
                r#""description" length must be less than or equal to 500 characters long"#,
                r#""priority" must be one of [low, medium, high]"#,
                r#""dueDate" must be a valid date"#,
                r#""completed" must be a boolean"#,
            ]
        );
    }

    #[test]
    fn missing_title_on_create_only() {
        let errors = validate_create(&json!({ "priority": "low" }), Utc::now()).unwrap_err();
        assert_eq!(errors, vec![r#""title" is required"#]);
        assert!(validate_patch(&json!({ "priority": "low" })).is_ok());
    }

    #[test]
    fn blank_description_is_allowed() {
        let draft = validate_create(&json!({ "title": "Lab report", "description": "" }), Utc::now())
            .unwrap();
        assert_eq!(draft.description.as_deref(), Some(""));
    }

    #[test]
    fn past_due_date_rejected_on_create_but_not_on_patch() {
        let yesterday = (Utc::now() - Duration::days(1)).to_rfc3339();
        let body = json!({ "title": "Problem set", "dueDate": yesterday });

        let errors = validate_create(&body, Utc::now()).unwrap_err();
        assert_eq!(errors, vec![r#""dueDate" must be greater than or equal to "now""#]);

        let changes = validate_patch(&json!({ "dueDate": yesterday })).unwrap();
        assert!(changes.due_date.is_some());
    }

    #[test]
    fn non_object_bodies_are_rejected() {
        assert!(validate_create(&json!(["title"]), Utc::now()).is_err());
        assert!(validate_patch(&Value::Null).is_err());
    }

    #[rstest]
    #[case(json!("2030-05-01T09:30:00Z"))]
    #[case(json!("2030-05-01T09:30:00+02:00"))]
    #[case(json!("2030-05-01"))]
    #[case(json!("2030-05-01T09:30"))]
    #[case(json!(1_903_000_000_000_i64))]
    fn accepted_date_shapes(#[case] value: Value) {
        assert!(parse_date(&value).is_some(), "{value}");
    }

    #[rstest]
    #[case(json!("05/01/2030"))]
    #[case(json!(true))]
    #[case(Value::Null)]
    fn rejected_date_shapes(#[case] value: Value) {
        assert!(parse_date(&value).is_none(), "{value}");
    }
}
