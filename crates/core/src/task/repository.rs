//! Task repository trait
//!
//! Defines the interface for owner-scoped task storage operations. Every
//! method takes the owner's user id; a task that exists but belongs to a
//! different owner is indistinguishable from one that does not exist.

use async_trait::async_trait;

use super::model::{NewTask, Task, TaskFilter, TaskStatus};
use crate::Result;

/// Repository interface for task CRUD operations
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Persist a new task for `owner_id` with status OPEN; returns the
    /// stored record carrying its fresh id.
    async fn create(&self, draft: NewTask, owner_id: i64) -> Result<Task>;

    /// Get a task by id, if it exists and is owned by `owner_id`.
    async fn get(&self, id: i64, owner_id: i64) -> Result<Option<Task>>;

    /// List tasks owned by `owner_id` matching the filter, newest first.
    async fn list(&self, filter: &TaskFilter, owner_id: i64) -> Result<Vec<Task>>;

    /// Overwrite the status of a task owned by `owner_id`; returns the
    /// updated record, or None when absent/not owned.
    async fn update_status(&self, id: i64, status: TaskStatus, owner_id: i64)
        -> Result<Option<Task>>;

    /// Delete a task owned by `owner_id`; false when absent/not owned.
    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool>;
}
