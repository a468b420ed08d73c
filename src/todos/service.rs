//! Todo service — validation, wire ↔ storage bridging and error translation.
//!
//! The service is the only place storage errors become domain errors:
//! a missing row turns into `ServiceError::NotFound`, everything else is
//! wrapped as `ServiceError::Internal`.

use std::sync::Arc;

use tracing::{debug, warn};

use super::convert;
use super::model::{Pagination, TodoFilter, TodoItem, TodoPatch};
use crate::config::EmptyListPolicy;
use crate::error::{DatabaseError, ServiceError, ValidationError};
use crate::store::TodoRepository;

pub struct TodoService {
    repo: Arc<dyn TodoRepository>,
    empty_list: EmptyListPolicy,
}

impl TodoService {
    pub fn new(repo: Arc<dyn TodoRepository>) -> Self {
        Self {
            repo,
            empty_list: EmptyListPolicy::default(),
        }
    }

    /// Builder: choose what an empty list result means.
    pub fn with_empty_list_policy(mut self, policy: EmptyListPolicy) -> Self {
        self.empty_list = policy;
        self
    }

    /// Validate and persist a new todo, returning it with server-assigned fields.
    pub async fn create(&self, item: TodoItem) -> Result<TodoItem, ServiceError> {
        item.validate()?;
        let record = convert::to_record(&item)?;

        let created = self
            .repo
            .create_todo(&record)
            .await
            .map_err(internal("create"))?;
        debug!(id = created.id, "Todo created");
        Ok(convert::to_item(created)?)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<TodoItem, ServiceError> {
        check_id(id)?;
        let record = self.repo.get_todo(id).await.map_err(internal("get"))?;
        Ok(convert::to_item(record)?)
    }

    /// Apply the fields present in `patch` and return the updated todo.
    pub async fn update(&self, patch: TodoPatch) -> Result<TodoItem, ServiceError> {
        patch.validate()?;
        let fields = patch.editable_fields();

        let record = self
            .repo
            .update_todo(patch.id, &fields)
            .await
            .map_err(internal("update"))?;
        debug!(id = patch.id, fields = fields.len(), "Todo updated");
        Ok(convert::to_item(record)?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ServiceError> {
        check_id(id)?;
        self.repo.delete_todo(id).await.map_err(internal("delete"))?;
        debug!(id, "Todo deleted");
        Ok(())
    }

    /// One page of todos. An empty result is handled per the configured policy.
    pub async fn list(&self, filter: TodoFilter) -> Result<Pagination<TodoItem>, ServiceError> {
        let (records, total_items) = self
            .repo
            .list_todos(&filter)
            .await
            .map_err(internal("list"))?;

        if total_items == 0 {
            match self.empty_list {
                EmptyListPolicy::NotFound => return Err(ServiceError::NotFound),
                EmptyListPolicy::NoContent => return Err(ServiceError::EmptyContent),
                EmptyListPolicy::EmptyPage => {}
            }
        }

        Ok(Pagination {
            items: convert::to_items(records)?,
            total_items,
        })
    }
}

fn check_id(id: i64) -> Result<(), ValidationError> {
    if id <= 0 {
        return Err(ValidationError::InvalidId(id));
    }
    Ok(())
}

/// Translate a storage error, logging the ones that are not "no rows".
fn internal(operation: &'static str) -> impl Fn(DatabaseError) -> ServiceError {
    move |err| {
        let err = ServiceError::from_storage(err);
        if let ServiceError::Internal(inner) = &err {
            warn!(operation, error = %inner, "Todo storage failure");
        }
        err
    }
}
