use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::{Task, TaskFilter, TaskInput, TaskQuery, TaskStatus, User};
use crate::queue::{DeferredJob, JobDispatcher, TaskJobPayload};
use crate::store::TaskStore;

/// Owner-scoped task operations.
///
/// Every method takes the acting user; a task owned by someone else behaves
/// exactly like a task that does not exist.
pub struct TaskService {
    store: Arc<dyn TaskStore>,
    dispatcher: JobDispatcher,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>, dispatcher: JobDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Lists the owner's tasks, optionally narrowed by status and search text.
    pub async fn list(&self, owner: &User, query: &TaskQuery) -> Result<Vec<Task>, AppError> {
        let filter = TaskFilter::for_owner(owner.id, query)?;
        log::debug!(
            "User \"{}\" retrieving tasks. Filters: {:?}",
            owner.username,
            filter
        );
        Ok(self.store.find(&filter).await?)
    }

    pub async fn get(&self, id: Uuid, owner: &User) -> Result<Task, AppError> {
        self.store
            .find_by_id(id, owner.id)
            .await?
            .ok_or_else(|| not_found(id))
    }

    /// Stores a new `OPEN` task and schedules its deferred job.
    ///
    /// The job is only enqueued, never awaited. If the queue refuses it the
    /// failure is logged and the created task is still returned.
    pub async fn create(&self, input: TaskInput, owner: &User) -> Result<Task, AppError> {
        input.validate()?;

        let payload = TaskJobPayload::new(&input, owner);
        let task = Task::new(input, owner.id);
        self.store.insert(&task).await?;
        log::info!("User \"{}\" created task {}", owner.username, task.id);

        if let Err(e) = self.dispatcher.dispatch(payload).await {
            log::error!("Failed to enqueue job for task {}: {}", task.id, e);
        }

        Ok(task)
    }

    /// Enqueues a deferred job without creating a task.
    pub async fn enqueue(&self, input: TaskInput, owner: &User) -> Result<DeferredJob, AppError> {
        input.validate()?;
        let job = self
            .dispatcher
            .dispatch(TaskJobPayload::new(&input, owner))
            .await?;
        log::info!(
            "User \"{}\" enqueued job {} (runs after {:?})",
            owner.username,
            job.id,
            self.dispatcher.delay()
        );
        Ok(job)
    }

    pub async fn delete(&self, id: Uuid, owner: &User) -> Result<(), AppError> {
        if !self.store.delete(id, owner.id).await? {
            return Err(not_found(id));
        }
        log::info!("User \"{}\" deleted task {}", owner.username, id);
        Ok(())
    }

    /// Moves a task to `raw_status`.
    ///
    /// The status is normalized and checked before the store is touched, so an
    /// invalid value never mutates anything. Any valid status may replace any
    /// other, including itself.
    pub async fn update_status(
        &self,
        id: Uuid,
        raw_status: &str,
        owner: &User,
    ) -> Result<Task, AppError> {
        let status: TaskStatus = raw_status.parse()?;

        let task = self
            .store
            .update_status(id, owner.id, status)
            .await?
            .ok_or_else(|| not_found(id))?;

        log::info!(
            "User \"{}\" set task {} to {}",
            owner.username,
            task.id,
            task.status
        );
        Ok(task)
    }
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Task with ID \"{}\" not found", id))
}
