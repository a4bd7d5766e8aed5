//! Task API endpoints
//!
//! Owner-scoped CRUD over /tasks. Every handler resolves the caller from
//! the bearer token first; a task belonging to someone else is a plain 404.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use td_core::task::{NewTask, Task, TaskFilter, TaskRepository, TaskStatus};
use td_core::user::User;

use crate::auth::{resolve_user, AuthError};
use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: String,
}

/// PATCH body. The status arrives as a raw string and is parsed explicitly
/// so a non-enumerated value maps to 400 before the store is touched.
#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct TaskFilterQuery {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub owner_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            status: task.status,
            owner_id: task.owner_id,
            created_at: task.created_at.to_rfc3339(),
            updated_at: task.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

type RouteError = (StatusCode, Json<ErrorResponse>);

fn route_error(status: StatusCode, error: impl std::fmt::Display) -> RouteError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
}

fn bad_request(error: impl std::fmt::Display) -> RouteError {
    route_error(StatusCode::BAD_REQUEST, error)
}

fn unauthorized(error: impl std::fmt::Display) -> RouteError {
    route_error(StatusCode::UNAUTHORIZED, error)
}

fn not_found(error: impl std::fmt::Display) -> RouteError {
    route_error(StatusCode::NOT_FOUND, error)
}

fn internal_error(error: impl std::fmt::Display) -> RouteError {
    route_error(StatusCode::INTERNAL_SERVER_ERROR, error)
}

async fn current_user(state: &AppState, headers: &HeaderMap) -> Result<User, RouteError> {
    resolve_user(state, headers).await.map_err(|err| match err {
        AuthError::Storage(_) => internal_error(err),
        _ => unauthorized(err),
    })
}

impl CreateTaskRequest {
    fn into_draft(self) -> Result<NewTask, RouteError> {
        if self.title.trim().is_empty() {
            return Err(bad_request("Title cannot be empty"));
        }
        if self.description.trim().is_empty() {
            return Err(bad_request("Description cannot be empty"));
        }
        Ok(NewTask {
            title: self.title,
            description: self.description,
        })
    }
}

impl TaskFilterQuery {
    fn into_filter(self) -> Result<TaskFilter, RouteError> {
        let status = match self.status.as_deref() {
            Some(raw) => Some(raw.parse::<TaskStatus>().map_err(bad_request)?),
            None => None,
        };
        let search = match self.search {
            Some(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Err(bad_request("Search term cannot be empty"));
                }
                Some(trimmed.to_string())
            }
            None => None,
        };
        Ok(TaskFilter { status, search })
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /tasks - List the caller's tasks, optionally filtered
async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<TaskFilterQuery>,
) -> Result<Json<Vec<TaskResponse>>, RouteError> {
    let user = current_user(&state, &headers).await?;
    let filter = query.into_filter()?;
    tracing::debug!(user = %user.username, ?filter, "listing tasks");

    let tasks = state
        .task_store()
        .list(&filter, user.id)
        .await
        .map_err(internal_error)?;

    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}

/// POST /tasks - Create a new task for the caller
async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskResponse>), RouteError> {
    let user = current_user(&state, &headers).await?;
    let draft = req.into_draft()?;
    tracing::debug!(user = %user.username, title = %draft.title, "creating task");

    let created = state
        .task_store()
        .create(draft, user.id)
        .await
        .map_err(internal_error)?;

    Ok((StatusCode::CREATED, Json(TaskResponse::from(created))))
}

/// GET /tasks/:id - Get a single task
async fn get_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<TaskResponse>, RouteError> {
    let user = current_user(&state, &headers).await?;
    let task = state
        .task_store()
        .get(id, user.id)
        .await
        .map_err(internal_error)?;

    match task {
        Some(task) => Ok(Json(TaskResponse::from(task))),
        None => Err(not_found(format!("Task {} not found", id))),
    }
}

/// PATCH /tasks/:id/status - Overwrite the status of a task
async fn update_task_status(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(req): Json<UpdateTaskStatusRequest>,
) -> Result<Json<TaskResponse>, RouteError> {
    let user = current_user(&state, &headers).await?;
    let status = req.status.parse::<TaskStatus>().map_err(bad_request)?;

    let updated = state
        .task_store()
        .update_status(id, status, user.id)
        .await
        .map_err(internal_error)?;

    match updated {
        Some(task) => Ok(Json(TaskResponse::from(task))),
        None => Err(not_found(format!("Task {} not found", id))),
    }
}

/// DELETE /tasks/:id - Delete a task
async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<StatusCode, RouteError> {
    let user = current_user(&state, &headers).await?;
    tracing::debug!(user = %user.username, id, "deleting task");

    let deleted = state
        .task_store()
        .delete(id, user.id)
        .await
        .map_err(internal_error)?;

    if deleted {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(format!("Task {} not found", id)))
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route("/tasks/{id}", get(get_task).delete(delete_task))
        .route("/tasks/{id}/status", patch(update_task_status))
}
