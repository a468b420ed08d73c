//! Conversions between the wire model and the storage model.

use crate::error::{DatabaseError, ValidationError};
use crate::store::traits::TodoRecord;

use super::model::{TodoItem, TodoStatus};

/// Wire → storage. Fails when a field the store requires is absent.
///
/// `id` and `created_at` are carried over when set; a missing
/// description is stored as the empty string.
pub fn to_record(item: &TodoItem) -> Result<TodoRecord, ValidationError> {
    let date = item.date.ok_or(ValidationError::MissingDate)?;
    let status = item.status.ok_or(ValidationError::MissingStatus)?;
    Ok(TodoRecord {
        id: item.id,
        title: item.title.clone(),
        description: item.description.clone().unwrap_or_default(),
        date,
        status: status.as_str().to_string(),
        created_at: item.created_at.unwrap_or_default(),
        updated_at: item.updated_at,
    })
}

/// Storage → wire. A status string the wire enum does not know is an error.
pub fn to_item(record: TodoRecord) -> Result<TodoItem, DatabaseError> {
    let status = TodoStatus::parse(&record.status).ok_or_else(|| {
        DatabaseError::Serialization(format!(
            "todo {} has unknown status '{}'",
            record.id, record.status
        ))
    })?;
    let description = if record.description.is_empty() {
        None
    } else {
        Some(record.description)
    };
    Ok(TodoItem {
        id: record.id,
        title: record.title,
        description,
        date: Some(record.date),
        status: Some(status),
        created_at: Some(record.created_at),
        updated_at: record.updated_at,
    })
}

pub fn to_items(records: Vec<TodoRecord>) -> Result<Vec<TodoItem>, DatabaseError> {
    records.into_iter().map(to_item).collect()
}
