use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use super::{DeferredJob, JobQueue, QueueError};

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Polls a [`JobQueue`] and processes jobs whose delay has elapsed.
pub struct JobWorker {
    queue: Arc<dyn JobQueue>,
    poll_interval: Duration,
    batch_size: usize,
}

impl JobWorker {
    pub fn new(queue: Arc<dyn JobQueue>, poll_interval: Duration, batch_size: usize) -> Self {
        Self {
            queue,
            poll_interval: poll_interval.max(MIN_POLL_INTERVAL),
            batch_size: batch_size.max(1),
        }
    }

    /// Claims and processes one batch of due jobs. Returns how many were processed.
    pub async fn run_once(&self) -> Result<usize, QueueError> {
        let jobs = self.queue.claim_due(Utc::now(), self.batch_size).await?;
        for job in &jobs {
            self.process(job);
        }
        Ok(jobs.len())
    }

    /// Polls forever. Queue errors are logged and the next tick retries.
    pub async fn run(self) {
        log::info!(
            "Job worker started (poll every {:?}, batch of {})",
            self.poll_interval,
            self.batch_size
        );
        let mut ticker = tokio::time::interval(self.poll_interval);
        loop {
            ticker.tick().await;
            if let Err(e) = self.run_once().await {
                log::error!("Job worker failed to claim jobs: {}", e);
            }
        }
    }

    fn process(&self, job: &DeferredJob) {
        let lag = Utc::now() - job.run_at;
        log::info!("Start processing job {} ({} ms after run_at)", job.id, lag.num_milliseconds());
        log::info!(
            "Job {} payload: user {} created \"{}\": {}",
            job.id,
            job.payload.user_id,
            job.payload.title,
            job.payload.description
        );
        log::info!("Job {} completed", job.id);
    }
}
