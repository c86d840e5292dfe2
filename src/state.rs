use std::sync::Arc;

use thiserror::Error;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::queue::{InMemoryJobQueue, JobDispatcher, JobQueue, JobWorker, QueueError, RedisJobQueue};
use crate::services::{AuthService, TaskService};
use crate::store::{
    postgres, InMemoryTaskStore, InMemoryUserStore, PgTaskStore, PgUserStore, StoreError,
    TaskStore, UserStore,
};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to set up database: {0}")]
    Store(#[from] StoreError),
    #[error("failed to set up job queue: {0}")]
    Queue(#[from] QueueError),
}

/// Shared application state, registered once as `web::Data<AppState>`.
pub struct AppState {
    pub auth: AuthService,
    pub tasks: TaskService,
    queue: Arc<dyn JobQueue>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        queue: Arc<dyn JobQueue>,
        config: &Config,
    ) -> Self {
        let tokens = TokenIssuer::new(&config.jwt_secret, config.jwt_expires_in_secs);
        Self {
            auth: AuthService::new(users, tokens, config.bcrypt_cost),
            tasks: TaskService::new(tasks, JobDispatcher::new(queue.clone(), config.job_delay)),
            queue,
        }
    }

    /// Picks PostgreSQL when `DATABASE_URL` is set and Redis when `REDIS_URL`
    /// is set, falling back to the in-memory implementations otherwise.
    pub async fn from_config(config: &Config) -> Result<Self, StartupError> {
        let (users, tasks): (Arc<dyn UserStore>, Arc<dyn TaskStore>) = match &config.database_url {
            Some(url) => {
                let pool = postgres::connect(url).await?;
                log::info!("Using PostgreSQL stores");
                (
                    Arc::new(PgUserStore::new(pool.clone())),
                    Arc::new(PgTaskStore::new(pool)),
                )
            }
            None => {
                log::warn!("DATABASE_URL not set; users and tasks are kept in memory");
                (
                    Arc::new(InMemoryUserStore::new()),
                    Arc::new(InMemoryTaskStore::new()),
                )
            }
        };

        let queue: Arc<dyn JobQueue> = match &config.redis_url {
            Some(url) => Arc::new(RedisJobQueue::connect(url).await?),
            None => {
                log::warn!("REDIS_URL not set; deferred jobs are kept in memory");
                Arc::new(InMemoryJobQueue::new())
            }
        };

        Ok(Self::new(users, tasks, queue, config))
    }

    /// A worker consuming the same queue the task service enqueues to.
    pub fn job_worker(&self, config: &Config) -> JobWorker {
        JobWorker::new(
            self.queue.clone(),
            config.worker_poll_interval,
            config.worker_batch_size,
        )
    }
}
