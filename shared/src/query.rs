use serde::{Deserialize, Serialize};

/// Raw list parameters as they appear in the query string.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<String>,
}

impl TaskQuery {
    pub fn new(status: StatusFilter, sort_by: SortKey, order: SortOrder) -> Self {
        Self {
            status: Some(status.as_str().to_string()),
            sort_by: Some(sort_by.as_str().to_string()),
            order: Some(order.as_str().to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Completed,
}

impl StatusFilter {
    /// Case-insensitive; anything unrecognised means "no completion filter".
    pub fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "pending" => StatusFilter::Pending,
            "completed" => StatusFilter::Completed,
            _ => StatusFilter::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusFilter::All => "all",
            StatusFilter::Pending => "pending",
            StatusFilter::Completed => "completed",
        }
    }

    pub fn completed(&self) -> Option<bool> {
        match self {
            StatusFilter::All => None,
            StatusFilter::Pending => Some(false),
            StatusFilter::Completed => Some(true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    DueDate,
    Priority,
}

impl SortKey {
    /// Only `priority` selects priority ordering; every other value sorts by
    /// due date.
    pub fn parse(raw: &str) -> Self {
        if raw == "priority" {
            SortKey::Priority
        } else {
            SortKey::DueDate
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::DueDate => "dueDate",
            SortKey::Priority => "priority",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Self {
        if raw == "desc" {
            SortOrder::Desc
        } else {
            SortOrder::Asc
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("all", StatusFilter::All)]
    #[case("PENDING", StatusFilter::Pending)]
    #[case("Completed", StatusFilter::Completed)]
    #[case("archived", StatusFilter::All)]
    fn status_parse_is_lenient(#[case] raw: &str, #[case] expected: StatusFilter) {
        assert_eq!(StatusFilter::parse(raw), expected);
    }

    #[test]
    fn unknown_sort_values_fall_back_to_defaults() {
        assert_eq!(SortKey::parse("title"), SortKey::DueDate);
        assert_eq!(SortOrder::parse("sideways"), SortOrder::Asc);
        assert_eq!(SortOrder::parse("desc"), SortOrder::Desc);
    }

    #[test]
    fn query_serializes_with_wire_names() {
        let query = TaskQuery::new(StatusFilter::Pending, SortKey::Priority, SortOrder::Desc);
        let json = serde_json::to_value(&query).unwrap();
        assert_eq!(json["sortBy"], "priority");
        assert_eq!(json["status"], "pending");
    }
}
