//! Storage model and the `TodoRepository` trait.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::DatabaseError;
use crate::todos::model::TodoFilter;

/// A persisted todo row.
#[derive(Debug, Clone, PartialEq)]
pub struct TodoRecord {
    pub id: i64,
    pub title: String,
    /// Empty when the todo has no description.
    pub description: String,
    pub date: NaiveDate,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// One entry of a partial-update field mask, carrying the value to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoField {
    Title(String),
    Description(String),
    Date(NaiveDate),
    Status(String),
}

impl TodoField {
    /// Column written by this field.
    pub fn column(&self) -> &'static str {
        match self {
            Self::Title(_) => "title",
            Self::Description(_) => "description",
            Self::Date(_) => "date",
            Self::Status(_) => "status",
        }
    }
}

/// Backend-agnostic todo persistence.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Insert the mutable fields of `todo`. The returned record carries the
    /// server-assigned `id` and `created_at`; those fields of the input are ignored.
    async fn create_todo(&self, todo: &TodoRecord) -> Result<TodoRecord, DatabaseError>;

    /// Fetch a todo, or `DatabaseError::NotFound`.
    async fn get_todo(&self, id: i64) -> Result<TodoRecord, DatabaseError>;

    /// Write the masked fields, refresh `updated_at` and return the full row.
    async fn update_todo(&self, id: i64, fields: &[TodoField])
    -> Result<TodoRecord, DatabaseError>;

    /// Delete a todo. Deleting a missing row is `DatabaseError::NotFound`.
    async fn delete_todo(&self, id: i64) -> Result<(), DatabaseError>;

    /// One page of todos ordered by id, plus the count of all matching rows.
    async fn list_todos(&self, filter: &TodoFilter)
    -> Result<(Vec<TodoRecord>, i64), DatabaseError>;
}
