//! SQLite-backed task storage

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use super::model::{NewTask, Task, TaskFilter, TaskStatus};
use super::repository::TaskRepository;
use crate::{Error, Result};

/// Task store over the shared SQLite pool
#[derive(Clone)]
pub struct SqliteTaskStore {
    pool: SqlitePool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct TaskRow {
    id: i64,
    title: String,
    description: String,
    status: String,
    owner_id: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TaskRow> for Task {
    type Error = Error;

    fn try_from(row: TaskRow) -> Result<Task> {
        let status = row
            .status
            .parse::<TaskStatus>()
            .map_err(|_| Error::Storage(format!("Task {} has unknown status '{}'", row.id, row.status)))?;
        Ok(Task {
            id: row.id,
            title: row.title,
            description: row.description,
            status,
            owner_id: row.owner_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl SqliteTaskStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, id: i64, owner_id: i64) -> Result<Option<Task>> {
        let row: Option<TaskRow> =
            sqlx::query_as("SELECT * FROM tasks WHERE id = ? AND owner_id = ?")
                .bind(id)
                .bind(owner_id)
                .fetch_optional(&self.pool)
                .await?;
        row.map(Task::try_from).transpose()
    }
}

#[async_trait]
impl TaskRepository for SqliteTaskStore {
    async fn create(&self, draft: NewTask, owner_id: i64) -> Result<Task> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO tasks (title, description, status, owner_id, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&draft.title)
        .bind(&draft.description)
        .bind(TaskStatus::Open.as_str())
        .bind(owner_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.fetch(result.last_insert_rowid(), owner_id)
            .await?
            .ok_or_else(|| Error::Storage("Created task row is missing".to_string()))
    }

    async fn get(&self, id: i64, owner_id: i64) -> Result<Option<Task>> {
        self.fetch(id, owner_id).await
    }

    async fn list(&self, filter: &TaskFilter, owner_id: i64) -> Result<Vec<Task>> {
        let mut sql = String::from("SELECT * FROM tasks WHERE owner_id = ?");
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        if filter.search.is_some() {
            sql.push_str(" AND (title LIKE ? OR description LIKE ?)");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query_as::<_, TaskRow>(&sql).bind(owner_id);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }
        if let Some(search) = &filter.search {
            let pattern = format!("%{}%", search);
            query = query.bind(pattern.clone()).bind(pattern);
        }

        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Task::try_from).collect()
    }

    async fn update_status(
        &self,
        id: i64,
        status: TaskStatus,
        owner_id: i64,
    ) -> Result<Option<Task>> {
        let result =
            sqlx::query("UPDATE tasks SET status = ?, updated_at = ? WHERE id = ? AND owner_id = ?")
                .bind(status.as_str())
                .bind(Utc::now())
                .bind(id)
                .bind(owner_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.fetch(id, owner_id).await
    }

    async fn delete(&self, id: i64, owner_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = ? AND owner_id = ?")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
