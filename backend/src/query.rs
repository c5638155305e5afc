//! Mapping list parameters onto a store filter, and ordering results.

use std::cmp::Ordering;

use shared::{SortKey, SortOrder, StatusFilter, Task, TaskQuery};

use crate::store::TaskFilter;

/// The completion clause comes from `status`; the owner clause always
/// comes from the authenticated caller.
pub fn build_filter(query: &TaskQuery, owner: &str) -> TaskFilter {
    let status = query
        .status
        .as_deref()
        .map(StatusFilter::parse)
        .unwrap_or_default();
    TaskFilter {
        owner: owner.to_string(),
        completed: status.completed(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortOptions {
    pub sort_by: SortKey,
    pub order: SortOrder,
}

impl SortOptions {
    /// Both values are lower-cased before interpretation.
    pub fn from_query(query: &TaskQuery) -> Self {
        let lower = |raw: &Option<String>| raw.as_deref().map(str::to_ascii_lowercase);
        Self {
            sort_by: lower(&query.sort_by)
                .map(|raw| SortKey::parse(&raw))
                .unwrap_or_default(),
            order: lower(&query.order)
                .map(|raw| SortOrder::parse(&raw))
                .unwrap_or_default(),
        }
    }
}

/// Stable in-place sort.
///
/// By priority, ascending runs low to high. By due date, undated tasks
/// count as later than any dated one, so they land last ascending and
/// first descending.
pub fn sort_tasks(tasks: &mut [Task], options: SortOptions) {
    tasks.sort_by(|a, b| {
        let ordering = match options.sort_by {
            SortKey::Priority => a.priority.rank().cmp(&b.priority.rank()),
            SortKey::DueDate => match (a.due_date, b.due_date) {
                (None, None) => Ordering::Equal,
                (None, Some(_)) => Ordering::Greater,
                (Some(_), None) => Ordering::Less,
                (Some(x), Some(y)) => x.cmp(&y),
            },
        };
        match options.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rstest::rstest;
    use shared::Priority;
    use uuid::Uuid;

    fn task(title: &str, priority: Priority, due_in_days: Option<i64>) -> Task {
        let now = Utc::now();
        Task {
            id: Uuid::new_v4(),
            owner: "uid".into(),
            title: title.into(),
            description: String::new(),
            priority,
            due_date: due_in_days.map(|d| now + Duration::days(d)),
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.title.as_str()).collect()
    }

    fn query(status: Option<&str>, sort_by: Option<&str>, order: Option<&str>) -> TaskQuery {
        TaskQuery {
            status: status.map(String::from),
            sort_by: sort_by.map(String::from),
            order: order.map(String::from),
        }
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some("all"), None)]
    #[case(Some("pending"), Some(false))]
    #[case(Some("Completed"), Some(true))]
    #[case(Some("whatever"), None)]
    fn status_maps_to_completion_clause(#[case] status: Option<&str>, #[case] expected: Option<bool>) {
        let filter = build_filter(&query(status, None, None), "uid-7");
        assert_eq!(filter.completed, expected);
        assert_eq!(filter.owner, "uid-7");
    }

    #[test]
    fn priority_sort_both_directions() {
        let mut tasks = vec![
            task("low", Priority::Low, None),
            task("high", Priority::High, None),
            task("medium", Priority::Medium, None),
        ];
        let asc = SortOptions {
            sort_by: SortKey::Priority,
            order: SortOrder::Asc,
        };
        sort_tasks(&mut tasks, asc);
        assert_eq!(titles(&tasks), ["low", "medium", "high"]);

        sort_tasks(
            &mut tasks,
            SortOptions {
                order: SortOrder::Desc,
                ..asc
            },
        );
        assert_eq!(titles(&tasks), ["high", "medium", "low"]);
    }

    #[test]
    fn undated_tasks_last_ascending_first_descending() {
        let mut tasks = vec![
            task("undated", Priority::Medium, None),
            task("later", Priority::Medium, Some(5)),
            task("sooner", Priority::Medium, Some(1)),
        ];
        sort_tasks(&mut tasks, SortOptions::default());
        assert_eq!(titles(&tasks), ["sooner", "later", "undated"]);

        sort_tasks(
            &mut tasks,
            SortOptions {
                sort_by: SortKey::DueDate,
                order: SortOrder::Desc,
            },
        );
        assert_eq!(titles(&tasks), ["undated", "later", "sooner"]);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let mut tasks = vec![
            task("first", Priority::High, None),
            task("second", Priority::High, None),
            task("third", Priority::High, None),
        ];
        sort_tasks(
            &mut tasks,
            SortOptions {
                sort_by: SortKey::Priority,
                order: SortOrder::Desc,
            },
        );
        assert_eq!(titles(&tasks), ["first", "second", "third"]);
    }

    #[test]
    fn options_are_case_insensitive_with_defaults() {
        let options = SortOptions::from_query(&query(None, Some("PRIORITY"), Some("DESC")));
        assert_eq!(options.sort_by, SortKey::Priority);
        assert_eq!(options.order, SortOrder::Desc);

        let options = SortOptions::from_query(&query(None, Some("title"), Some("up")));
        assert_eq!(options, SortOptions::default());
    }
}
