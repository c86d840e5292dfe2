use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;

/// Represents the status of a task.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Newly created, not started.
    Open,
    /// Being worked on.
    InProgress,
    /// Finished.
    Done,
}

impl TaskStatus {
    pub const ALL: [TaskStatus; 3] = [TaskStatus::Open, TaskStatus::InProgress, TaskStatus::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Open => "OPEN",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a status case-insensitively; `"done"`, `"Done"` and `"DONE"` are all `Done`.
impl FromStr for TaskStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.to_uppercase();
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| AppError::BadRequest(format!("\"{}\" is an invalid status", normalized)))
    }
}

/// Input structure for creating a task.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TaskInput {
    /// The title of the task.
    /// Must be between 1 and 200 characters.
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    /// The description of the task.
    /// Must be between 1 and 1000 characters.
    #[validate(length(min = 1, max = 1000))]
    pub description: String,
}

/// Body of `PATCH /tasks/{id}/status`. The status stays a raw string until
/// [`TaskStatus::from_str`] has normalized and checked it.
#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Represents a task entity as stored in the database and returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique identifier for the task (UUID v4).
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    /// Identifier of the user who owns the task.
    pub user_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters accepted by `GET /tasks`.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TaskQuery {
    /// Filter tasks by status (case-insensitive).
    pub status: Option<String>,
    /// Case-sensitive substring to look for in title or description.
    pub search: Option<String>,
}

impl Task {
    /// Creates a new `OPEN` task owned by `user_id`.
    pub fn new(input: TaskInput, user_id: i32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            status: TaskStatus::Open,
            user_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Owner-scoped selection criteria for listing tasks.
///
/// The owner is not optional: a filter can only ever be built for one user, so
/// no query derived from it can return somebody else's tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFilter {
    pub owner_id: i32,
    pub status: Option<TaskStatus>,
    pub search: Option<String>,
}

impl TaskFilter {
    /// Validates raw query parameters for `owner_id`.
    ///
    /// Empty values are treated as absent. An unknown status fails with
    /// `AppError::BadRequest` before any store is touched.
    pub fn for_owner(owner_id: i32, query: &TaskQuery) -> Result<Self, AppError> {
        let status = match non_empty(query.status.as_deref()) {
            Some(raw) => Some(raw.parse::<TaskStatus>()?),
            None => None,
        };

        Ok(Self {
            owner_id,
            status,
            search: non_empty(query.search.as_deref()).map(str::to_string),
        })
    }

    pub fn matches(&self, task: &Task) -> bool {
        if task.user_id != self.owner_id {
            return false;
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        match &self.search {
            Some(search) => task.title.contains(search) || task.description.contains(search),
            None => true,
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}
