//! User model definitions

use chrono::{DateTime, Utc};

/// A registered user. Owns zero or more tasks; tasks reference it but do
/// not manage its lifecycle.
///
/// Deliberately not `Serialize`: the password hash must never leave the
/// process. Response types pick the fields they expose.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
