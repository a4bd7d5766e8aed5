//! Task model definitions

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Task state. A flat enum: any value may follow any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Open,
    InProgress,
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        Self::Open
    }
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::InProgress => "IN_PROGRESS",
            Self::Done => "DONE",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "OPEN" => Ok(Self::Open),
            "IN_PROGRESS" => Ok(Self::InProgress),
            "DONE" => Ok(Self::Done),
            _ => Err(Error::InvalidInput(format!(
                "\"{}\" is an invalid status",
                value
            ))),
        }
    }
}

/// A task record. The id is assigned by the store at creation and never
/// changes; only `status` (and `updated_at`) is mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub owner_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creation draft. Validated at the HTTP edge before it reaches the store.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
}

/// Listing constraints: optional status equality, optional case-blind
/// substring search over title and description.
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub search: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_wire_names() {
        for (status, name) in [
            (TaskStatus::Open, "OPEN"),
            (TaskStatus::InProgress, "IN_PROGRESS"),
            (TaskStatus::Done, "DONE"),
        ] {
            assert_eq!(status.as_str(), name);
            assert_eq!(name.parse::<TaskStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                serde_json::Value::String(name.to_string())
            );
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = "ARCHIVED".parse::<TaskStatus>().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(err.to_string().contains("ARCHIVED"));
    }

    #[test]
    fn default_status_is_open() {
        assert_eq!(TaskStatus::default(), TaskStatus::Open);
    }
}
