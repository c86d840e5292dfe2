use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};

use super::{DeferredJob, JobQueue, QueueError};

/// Process-local queue, used when no `REDIS_URL` is configured and in tests.
/// Jobs do not survive a restart.
#[derive(Debug, Clone, Default)]
pub struct InMemoryJobQueue {
    jobs: Arc<Mutex<Vec<DeferredJob>>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of jobs waiting, due or not.
    pub fn len(&self) -> Result<usize, QueueError> {
        let jobs = self
            .jobs
            .lock()
            .map_err(|e| QueueError::Poisoned(e.to_string()))?;
        Ok(jobs.len())
    }

    pub fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: &DeferredJob) -> Result<(), QueueError> {
        let mut jobs = self
            .jobs
            .lock()
            .map_err(|e| QueueError::Poisoned(e.to_string()))?;
        jobs.push(job.clone());
        Ok(())
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DeferredJob>, QueueError> {
        let mut jobs = self
            .jobs
            .lock()
            .map_err(|e| QueueError::Poisoned(e.to_string()))?;

        let (mut due, pending): (Vec<_>, Vec<_>) =
            jobs.drain(..).partition(|job| job.is_due(now));
        due.sort_by_key(|job| job.run_at);

        let rest = due.split_off(due.len().min(limit));
        *jobs = pending;
        jobs.extend(rest);
        Ok(due)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::TaskJobPayload;
    use chrono::Duration;
    use std::time::Duration as StdDuration;

    fn job(title: &str, delay_secs: u64) -> DeferredJob {
        DeferredJob::new(
            TaskJobPayload {
                title: title.to_string(),
                description: "d".to_string(),
                user_id: 1,
                created: 0,
            },
            StdDuration::from_secs(delay_secs),
        )
        .unwrap()
    }

    #[actix_rt::test]
    async fn test_claim_only_due_jobs_once() {
        let queue = InMemoryJobQueue::new();
        let soon = job("soon", 1);
        let later = job("later", 60);
        queue.enqueue(&later).await.unwrap();
        queue.enqueue(&soon).await.unwrap();

        let now = Utc::now() + Duration::seconds(5);
        let claimed = queue.claim_due(now, 10).await.unwrap();
        assert_eq!(claimed, vec![soon]);
        assert!(queue.claim_due(now, 10).await.unwrap().is_empty());
        assert_eq!(queue.len().unwrap(), 1);
    }

    #[actix_rt::test]
    async fn test_claim_respects_limit_and_order() {
        let queue = InMemoryJobQueue::new();
        let second = job("second", 2);
        let first = job("first", 1);
        let third = job("third", 3);
        for j in [&second, &first, &third] {
            queue.enqueue(j).await.unwrap();
        }

        let now = Utc::now() + Duration::seconds(10);
        let batch = queue.claim_due(now, 2).await.unwrap();
        assert_eq!(batch, vec![first, second]);
        assert_eq!(queue.claim_due(now, 2).await.unwrap(), vec![third]);
        assert!(queue.is_empty().unwrap());
    }
}
