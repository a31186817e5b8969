use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::seed::{self, SeedError};
use crate::services::{Scheduler, SchedulingError};
use crate::store::{Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("store: {0}")]
    Store(#[from] StoreError),
    #[error("seed: {0}")]
    Seed(#[from] SeedError),
    #[error("scheduler: {0}")]
    Scheduling(#[from] SchedulingError),
}

#[derive(Clone, Debug)]
pub struct AppState {
    scheduler: Arc<Scheduler>,
    started_at: Instant,
}

impl AppState {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler: Arc::new(scheduler),
            started_at: Instant::now(),
        }
    }

    /// Connect the store, seed the corpus if configured, and load the scheduler.
    pub async fn from_config(config: &Config) -> Result<Self, StartupError> {
        let store = Store::connect(config.database_url.as_deref()).await?;
        if let Some(path) = &config.vocab_path {
            seed::seed_corpus(&store, path).await?;
        }
        let scheduler = Scheduler::load(store, &config.scheduling).await?;
        tracing::info!(
            store = scheduler.store().kind().as_str(),
            words = scheduler.corpus().len(),
            strategy = scheduler.strategy_name(),
            "application state ready"
        );
        Ok(Self::new(scheduler))
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
