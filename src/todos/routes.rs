//! REST endpoints for todos.
//!
//! Handlers only bind requests and map `ServiceError` to a status code.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::debug;

use super::model::{Pagination, TodoFilter, TodoItem, TodoPatch};
use super::service::TodoService;
use crate::error::{ServiceError, ValidationError};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct TodoState {
    pub service: Arc<TodoService>,
}

/// Build the Axum router with the todo REST routes under `/api/v1`.
pub fn todo_routes(service: Arc<TodoService>) -> Router {
    let state = TodoState { service };

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v1/todo",
            get(list_todos).post(create_todo).patch(update_todo),
        )
        .route("/api/v1/todo/{id}", get(get_todo).delete(delete_todo))
        .with_state(state)
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::EmptyContent => return StatusCode::NO_CONTENT.into_response(),
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(serde_json::json!({"error": self.to_string()}))).into_response()
    }
}

fn malformed(rejection: impl std::fmt::Display) -> ServiceError {
    debug!(%rejection, "Rejected request");
    ValidationError::Malformed(rejection.to_string()).into()
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "todo-list"
    }))
}

// ── Todos ───────────────────────────────────────────────────────────────

async fn create_todo(
    State(state): State<TodoState>,
    body: Result<Json<TodoItem>, JsonRejection>,
) -> Result<StatusCode, ServiceError> {
    let Json(item) = body.map_err(malformed)?;
    state.service.create(item).await?;
    Ok(StatusCode::OK)
}

async fn get_todo(
    State(state): State<TodoState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<TodoItem>, ServiceError> {
    let Path(id) = id.map_err(malformed)?;
    Ok(Json(state.service.get_by_id(id).await?))
}

async fn update_todo(
    State(state): State<TodoState>,
    body: Result<Json<TodoPatch>, JsonRejection>,
) -> Result<StatusCode, ServiceError> {
    let Json(patch) = body.map_err(malformed)?;
    state.service.update(patch).await?;
    Ok(StatusCode::OK)
}

async fn delete_todo(
    State(state): State<TodoState>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ServiceError> {
    let Path(id) = id.map_err(malformed)?;
    state.service.delete(id).await?;
    Ok(StatusCode::OK)
}

async fn list_todos(
    State(state): State<TodoState>,
    filter: Result<Query<TodoFilter>, QueryRejection>,
) -> Result<Json<Pagination<TodoItem>>, ServiceError> {
    let Query(filter) = filter.map_err(malformed)?;
    Ok(Json(state.service.list(filter).await?))
}
