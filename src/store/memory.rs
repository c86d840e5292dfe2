//! In-memory stores, used when no `DATABASE_URL` is configured and in tests.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use super::{StoreError, StoreResult, TaskStore, UserStore};
use crate::models::{NewUser, Task, TaskFilter, TaskStatus, User, UserFilter, UserProfile};

fn poisoned(err: impl std::fmt::Display) -> StoreError {
    StoreError::Poisoned(err.to_string())
}

/// Thread-safe in-memory user store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    state: Arc<RwLock<UserState>>,
}

#[derive(Debug, Default)]
struct UserState {
    last_id: i32,
    users: Vec<User>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, new_user: NewUser) -> StoreResult<User> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.users.iter().any(|u| u.username == new_user.username) {
            return Err(StoreError::Conflict("Username already exists".into()));
        }

        state.last_id += 1;
        let user = User {
            id: state.last_id,
            username: new_user.username,
            password_hash: new_user.password_hash,
            salt: new_user.salt,
            is_partner: new_user.is_partner,
            certified: new_user.certified,
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn filter(&self, filter: &UserFilter) -> StoreResult<Vec<UserProfile>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state
            .users
            .iter()
            .filter(|u| filter.matches(u))
            .map(UserProfile::from)
            .collect())
    }
}

/// Thread-safe in-memory task store. Tasks are kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    tasks: Arc<RwLock<Vec<Task>>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: &Task) -> StoreResult<()> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(StoreError::Conflict(format!("Task \"{}\" already exists", task.id)));
        }
        tasks.push(task.clone());
        Ok(())
    }

    async fn find(&self, filter: &TaskFilter) -> StoreResult<Vec<Task>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(tasks.iter().filter(|t| filter.matches(t)).cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid, owner_id: i32) -> StoreResult<Option<Task>> {
        let tasks = self.tasks.read().map_err(poisoned)?;
        Ok(tasks
            .iter()
            .find(|t| t.id == id && t.user_id == owner_id)
            .cloned())
    }

    async fn update_status(
        &self,
        id: Uuid,
        owner_id: i32,
        status: TaskStatus,
    ) -> StoreResult<Option<Task>> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        Ok(tasks
            .iter_mut()
            .find(|t| t.id == id && t.user_id == owner_id)
            .map(|task| {
                task.status = status;
                task.updated_at = Utc::now();
                task.clone()
            }))
    }

    async fn delete(&self, id: Uuid, owner_id: i32) -> StoreResult<bool> {
        let mut tasks = self.tasks.write().map_err(poisoned)?;
        let before = tasks.len();
        tasks.retain(|t| !(t.id == id && t.user_id == owner_id));
        Ok(tasks.len() != before)
    }
}
