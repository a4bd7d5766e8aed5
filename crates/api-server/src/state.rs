//! Application state

use std::sync::Arc;

use sqlx::SqlitePool;
use td_core::task::SqliteTaskStore;

use crate::auth::AuthStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    task_store: SqliteTaskStore,
    auth_store: AuthStore,
}

impl AppState {
    /// Build the state over an open, migrated pool.
    pub fn new(pool: SqlitePool) -> Self {
        let task_store = SqliteTaskStore::new(pool.clone());
        let auth_store = AuthStore::new(pool);
        Self {
            inner: Arc::new(AppStateInner {
                task_store,
                auth_store,
            }),
        }
    }

    pub fn task_store(&self) -> &SqliteTaskStore {
        &self.inner.task_store
    }

    pub fn auth_store(&self) -> &AuthStore {
        &self.inner.auth_store
    }
}
