//! Todo wire model — what HTTP clients send and receive.

use std::fmt::Display;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};

use crate::error::ValidationError;
use crate::store::traits::TodoField;

/// Current lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    Completed,
}

impl TodoStatus {
    /// Storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    /// Parse the storage representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl FromStr for TodoStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown status '{s}'"))
    }
}

/// A single to-do item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Server-assigned ID. Ignored on create.
    #[serde(default)]
    pub id: i64,
    /// Short title.
    #[serde(default)]
    pub title: String,
    /// Optional longer description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Calendar day the todo belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TodoStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TodoItem {
    /// Create a new, not yet persisted todo.
    pub fn new(title: impl Into<String>, date: NaiveDate, status: TodoStatus) -> Self {
        Self {
            title: title.into(),
            date: Some(date),
            status: Some(status),
            ..Self::default()
        }
    }

    /// Builder: set description.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Check the fields required to create a todo.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        if self.date.is_none() {
            return Err(ValidationError::MissingDate);
        }
        if self.status.is_none() {
            return Err(ValidationError::MissingStatus);
        }
        Ok(())
    }
}

/// Partial update of an existing todo.
///
/// A field that is absent (or `null`) is left alone; a field that is present
/// is written, so `"description": ""` clears the description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TodoPatch {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TodoStatus>,
}

impl TodoPatch {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Builder: set title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder: set description.
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Builder: set date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Builder: set status.
    pub fn with_status(mut self, status: TodoStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id <= 0 {
            return Err(ValidationError::InvalidId(self.id));
        }
        if self.title.as_deref() == Some("") {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// The field mask for this update, in title, description, date, status order.
    pub fn editable_fields(&self) -> Vec<TodoField> {
        let mut fields = Vec::with_capacity(4);
        if let Some(title) = &self.title {
            fields.push(TodoField::Title(title.clone()));
        }
        if let Some(desc) = &self.description {
            fields.push(TodoField::Description(desc.clone()));
        }
        if let Some(date) = self.date {
            fields.push(TodoField::Date(date));
        }
        if let Some(status) = self.status {
            fields.push(TodoField::Status(status.as_str().to_string()));
        }
        fields
    }
}

/// List filter, bound from the query string.
///
/// A parameter given with an empty value (`?status=&page=`) counts as absent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TodoFilter {
    /// Exact date match.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub date: Option<NaiveDate>,
    /// Exact status match.
    #[serde(default, deserialize_with = "blank_as_none")]
    pub status: Option<TodoStatus>,
    /// 1-based page; values ≤ 0 mean the first page.
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub page: i64,
    /// Page size; values ≤ 0 or above the maximum mean the default.
    #[serde(default, deserialize_with = "blank_as_zero")]
    pub limit: i64,
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    match Option::<String>::deserialize(deserializer)?.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw.parse().map(Some).map_err(de::Error::custom),
    }
}

fn blank_as_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(blank_as_none(deserializer)?.unwrap_or_default())
}

/// One page of results plus the number of rows matching the filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pagination<T> {
    pub items: Vec<T>,
    pub total_items: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_todo_is_valid() {
        let todo = TodoItem::new("Water plants", day(2023, 12, 1), TodoStatus::Completed);
        assert_eq!(todo.id, 0);
        assert!(todo.created_at.is_none());
        assert!(todo.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let base = TodoItem::new("t", day(2023, 2, 11), TodoStatus::Pending);

        let no_title = TodoItem {
            title: String::new(),
            ..base.clone()
        };
        assert_eq!(no_title.validate(), Err(ValidationError::EmptyTitle));

        let no_date = TodoItem {
            date: None,
            ..base.clone()
        };
        assert_eq!(no_date.validate(), Err(ValidationError::MissingDate));

        let no_status = TodoItem {
            status: None,
            ..base
        };
        assert_eq!(no_status.validate(), Err(ValidationError::MissingStatus));
    }

    #[test]
    fn todo_status_serde_snake_case() {
        let json = serde_json::to_string(&TodoStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");

        let parsed: TodoStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(parsed, TodoStatus::Pending);

        assert!(serde_json::from_str::<TodoStatus>("\"done\"").is_err());
    }

    #[test]
    fn status_storage_strings_match_serde() {
        for status in [TodoStatus::Pending, TodoStatus::Completed] {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json.as_str(), Some(status.as_str()));
            assert_eq!(TodoStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TodoStatus::parse("archived"), None);
    }

    #[test]
    fn todo_item_date_is_plain_calendar_day() {
        let todo = TodoItem::new("t", day(2023, 12, 1), TodoStatus::Pending);
        let json = serde_json::to_value(&todo).unwrap();
        assert_eq!(json["date"], "2023-12-01");
        assert_eq!(json["status"], "pending");
    }

    #[test]
    fn todo_item_optional_fields_omitted() {
        let todo = TodoItem::new("t", day(2023, 12, 1), TodoStatus::Pending);
        let json = serde_json::to_string(&todo).unwrap();
        assert!(!json.contains("\"description\""));
        assert!(!json.contains("\"created_at\""));
        assert!(!json.contains("\"updated_at\""));
    }

    #[test]
    fn create_body_binds_without_server_fields() {
        let body = r#"{"title":"Buy milk","date":"2024-01-05","status":"pending"}"#;
        let todo: TodoItem = serde_json::from_str(body).unwrap();
        assert_eq!(todo.id, 0);
        assert_eq!(todo.title, "Buy milk");
        assert_eq!(todo.date, Some(day(2024, 1, 5)));
        assert!(todo.validate().is_ok());
    }

    #[test]
    fn editable_fields_follow_presence() {
        let patch = TodoPatch::new(3)
            .with_status(TodoStatus::Completed)
            .with_title("New title");
        assert_eq!(
            patch.editable_fields(),
            vec![
                TodoField::Title("New title".into()),
                TodoField::Status("completed".into()),
            ]
        );

        assert!(TodoPatch::new(3).editable_fields().is_empty());
    }

    #[test]
    fn explicit_empty_description_is_a_clear() {
        let patch: TodoPatch = serde_json::from_str(r#"{"id":1,"description":""}"#).unwrap();
        assert_eq!(patch.editable_fields(), vec![TodoField::Description(String::new())]);

        let patch: TodoPatch = serde_json::from_str(r#"{"id":1,"description":null}"#).unwrap();
        assert!(patch.editable_fields().is_empty());
    }

    #[test]
    fn patch_validation() {
        assert_eq!(TodoPatch::new(0).validate(), Err(ValidationError::InvalidId(0)));
        assert_eq!(
            TodoPatch::new(1).with_title("").validate(),
            Err(ValidationError::EmptyTitle)
        );
        assert!(TodoPatch::new(1).with_description("").validate().is_ok());
    }

    #[test]
    fn filter_binds_from_partial_json() {
        let filter: TodoFilter =
            serde_json::from_str(r#"{"date":"2023-12-01","status":"completed"}"#).unwrap();
        assert_eq!(filter.date, Some(day(2023, 12, 1)));
        assert_eq!(filter.status, Some(TodoStatus::Completed));
        assert_eq!(filter.page, 0);
        assert_eq!(filter.limit, 0);
    }

    #[test]
    fn filter_treats_blank_values_as_absent() {
        let filter: TodoFilter =
            serde_json::from_str(r#"{"date":"","status":" ","page":"","limit":""}"#).unwrap();
        assert_eq!(filter, TodoFilter::default());

        let filter: TodoFilter = serde_json::from_str(r#"{"page":"3","limit":"25"}"#).unwrap();
        assert_eq!((filter.page, filter.limit), (3, 25));

        assert!(serde_json::from_str::<TodoFilter>(r#"{"status":"archived"}"#).is_err());
        assert!(serde_json::from_str::<TodoFilter>(r#"{"page":"x"}"#).is_err());
    }

    #[test]
    fn pagination_serializes_total_items() {
        let page = Pagination::<TodoItem> {
            items: vec![],
            total_items: 0,
        };
        let json = serde_json::to_value(&page).unwrap();
        assert_eq!(json, serde_json::json!({"items": [], "total_items": 0}));
    }
}
