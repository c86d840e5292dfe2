//! Redis-backed job queue.
//!
//! Delayed jobs live in one sorted set. The member is the JSON-encoded job and
//! the score is its `run_at` in epoch milliseconds, so `ZRANGEBYSCORE -inf now`
//! lists exactly the jobs that are due.
//!
//! Claiming is read-then-`ZREM`: several workers may read the same member, but
//! only the one whose `ZREM` removes it (returns 1) gets to process it.

use ::redis::aio::ConnectionManager;
use ::redis::{AsyncCommands, Client};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{DeferredJob, JobQueue, QueueError};

pub const DEFAULT_QUEUE_KEY: &str = "taskboard:jobs:delayed";

#[derive(Clone)]
pub struct RedisJobQueue {
    conn: ConnectionManager,
    key: String,
}

impl RedisJobQueue {
    /// Connects to `redis_url` using the default queue key.
    pub async fn connect(redis_url: &str) -> Result<Self, QueueError> {
        Self::connect_with_key(redis_url, DEFAULT_QUEUE_KEY).await
    }

    pub async fn connect_with_key(redis_url: &str, key: &str) -> Result<Self, QueueError> {
        let client = Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        log::info!("Connected to Redis job queue \"{}\"", key);
        Ok(Self {
            conn,
            key: key.to_string(),
        })
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, job: &DeferredJob) -> Result<(), QueueError> {
        let member = serde_json::to_string(job)?;
        let mut conn = self.conn.clone();
        conn.zadd::<_, _, _, ()>(&self.key, member, job.run_at.timestamp_millis())
            .await?;
        Ok(())
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<DeferredJob>, QueueError> {
        let mut conn = self.conn.clone();
        let count = isize::try_from(limit).unwrap_or(isize::MAX);
        let members: Vec<String> = conn
            .zrangebyscore_limit(&self.key, "-inf", now.timestamp_millis(), 0, count)
            .await?;

        let mut claimed = Vec::with_capacity(members.len());
        for member in members {
            let removed: i64 = conn.zrem(&self.key, &member).await?;
            if removed == 0 {
                // Another worker claimed it first.
                continue;
            }
            match serde_json::from_str::<DeferredJob>(&member) {
                Ok(job) => claimed.push(job),
                Err(e) => log::error!("Dropping malformed job from \"{}\": {}", self.key, e),
            }
        }
        Ok(claimed)
    }
}
