//! Deferred background jobs.
//!
//! Task creation hands a [`DeferredJob`] to a [`JobQueue`] through the
//! [`JobDispatcher`] and returns without waiting for it. The delay travels with
//! the job as its `run_at` timestamp; the queue only releases a job to
//! [`JobQueue::claim_due`] once that time has passed. A [`worker::JobWorker`]
//! polls for due jobs and processes them.

pub mod memory;
pub mod redis;
pub mod worker;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{TaskInput, User};

pub use self::memory::InMemoryJobQueue;
pub use self::redis::RedisJobQueue;
pub use self::worker::JobWorker;

/// Errors returned by queue backends.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("job serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("queue lock poisoned: {0}")]
    Poisoned(String),

    #[error("invalid job delay: {0:?}")]
    InvalidDelay(Duration),
}

/// Data copied from a task-creation request, plus who sent it and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskJobPayload {
    pub title: String,
    pub description: String,
    pub user_id: i32,
    /// Creation time in milliseconds since the Unix epoch.
    pub created: i64,
}

impl TaskJobPayload {
    pub fn new(input: &TaskInput, owner: &User) -> Self {
        Self {
            title: input.title.clone(),
            description: input.description.clone(),
            user_id: owner.id,
            created: Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredJob {
    pub id: Uuid,
    pub payload: TaskJobPayload,
    pub enqueued_at: DateTime<Utc>,
    /// Earliest time a worker may claim the job.
    pub run_at: DateTime<Utc>,
}

impl DeferredJob {
    pub fn new(payload: TaskJobPayload, delay: Duration) -> Result<Self, QueueError> {
        let delay = ChronoDuration::from_std(delay).map_err(|_| QueueError::InvalidDelay(delay))?;
        let enqueued_at = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            payload,
            enqueued_at,
            run_at: enqueued_at + delay,
        })
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.run_at <= now
    }
}

/// Capability to schedule jobs and hand due ones to workers.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Stores the job until its `run_at` has passed.
    async fn enqueue(&self, job: &DeferredJob) -> Result<(), QueueError>;

    /// Removes and returns up to `limit` jobs whose `run_at` is at or before
    /// `now`, oldest first. A job is returned to exactly one caller.
    async fn claim_due(&self, now: DateTime<Utc>, limit: usize)
        -> Result<Vec<DeferredJob>, QueueError>;
}

/// Builds jobs with the configured delay and enqueues them.
#[derive(Clone)]
pub struct JobDispatcher {
    queue: Arc<dyn JobQueue>,
    delay: Duration,
}

impl JobDispatcher {
    pub fn new(queue: Arc<dyn JobQueue>, delay: Duration) -> Self {
        Self { queue, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Enqueues a job for `payload` and returns it once the queue has accepted it.
    /// The job itself runs later, on a worker.
    pub async fn dispatch(&self, payload: TaskJobPayload) -> Result<DeferredJob, QueueError> {
        let job = DeferredJob::new(payload, self.delay)?;
        self.queue.enqueue(&job).await?;
        log::debug!("Enqueued job {} to run at {}", job.id, job.run_at);
        Ok(job)
    }
}
