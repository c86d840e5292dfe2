//! Persistence ports for users and tasks.
//!
//! Services depend on the [`UserStore`] and [`TaskStore`] traits only. Two
//! implementations ship with the crate: [`memory`] for tests and for running
//! without a database, and [`postgres`] backed by `sqlx`.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewUser, Task, TaskFilter, TaskStatus, User, UserFilter, UserProfile};

pub use memory::{InMemoryTaskStore, InMemoryUserStore};
pub use postgres::{PgTaskStore, PgUserStore};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store implementations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique constraint was violated.
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// An in-memory store's lock was poisoned by a panicking writer.
    #[error("store lock poisoned: {0}")]
    Poisoned(String),
}

/// Credential persistence.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Stores a new user.
    ///
    /// Returns [`StoreError::Conflict`] when the username is taken; the
    /// existing record is left untouched.
    async fn insert(&self, user: NewUser) -> StoreResult<User>;

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    /// Lists users matching the flag constraints, ordered by id.
    async fn filter(&self, filter: &UserFilter) -> StoreResult<Vec<UserProfile>>;
}

/// Task persistence. Every lookup and mutation is scoped to an owner.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: &Task) -> StoreResult<()>;

    /// Returns the owner's tasks matching `filter`, oldest first.
    async fn find(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>>;

    /// Returns `None` when the task is missing or belongs to someone else.
    async fn find_by_id(&self, id: Uuid, owner_id: i32) -> StoreResult<Option<Task>>;

    /// Sets the status and returns the updated task, or `None` when the task
    /// is missing or belongs to someone else.
    async fn update_status(
        &self,
        id: Uuid,
        owner_id: i32,
        status: TaskStatus,
    ) -> StoreResult<Option<Task>>;

    /// Returns `true` when a task was deleted.
    async fn delete(&self, id: Uuid, owner_id: i32) -> StoreResult<bool>;
}
