use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::SchedulerConfig;
use crate::monitor::{CycleReport, Monitor};
use crate::utils::error::CycleError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerStats {
    pub runs: u64,
    pub successes: u64,
    pub failures: u64,
    pub new_listings: u64,
    pub last_run: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Runs monitoring cycles on a cron schedule.
pub struct CycleScheduler {
    scheduler: JobScheduler,
    monitor: Arc<Monitor>,
    stats: Arc<RwLock<SchedulerStats>>,
    config: SchedulerConfig,
}

impl CycleScheduler {
    pub async fn new(monitor: Arc<Monitor>, config: SchedulerConfig) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;

        Ok(Self {
            scheduler,
            monitor,
            stats: Arc::new(RwLock::new(SchedulerStats::default())),
            config,
        })
    }

    pub async fn start(&mut self) -> Result<()> {
        let monitor = Arc::clone(&self.monitor);
        let stats = Arc::clone(&self.stats);

        let job = Job::new_async(self.config.cron.as_str(), move |_uuid, _l| {
            let monitor = Arc::clone(&monitor);
            let stats = Arc::clone(&stats);

            Box::pin(async move {
                let result = monitor.run_cycle().await;
                Self::record_run(&stats, &result).await;
            })
        })?;

        self.scheduler.add(job).await?;
        self.scheduler.start().await?;

        tracing::info!(cron = %self.config.cron, "Cycle scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler.shutdown().await?;
        tracing::info!("Cycle scheduler shutdown");
        Ok(())
    }

    pub async fn stats(&self) -> SchedulerStats {
        self.stats.read().await.clone()
    }

    async fn record_run(stats: &RwLock<SchedulerStats>, result: &Result<CycleReport, CycleError>) {
        let mut stats = stats.write().await;
        stats.runs += 1;
        stats.last_run = Some(Utc::now());

        match result {
            Ok(report) => {
                stats.successes += 1;
                stats.new_listings += report.new_listings as u64;
                stats.last_error = None;
            }
            Err(e) => {
                if let CycleError::Notification { report, .. } = e {
                    stats.new_listings += report.new_listings as u64;
                }
                stats.failures += 1;
                stats.last_error = Some(e.to_string());
                tracing::error!(error = %e, "Scheduled cycle failed");
            }
        }
    }
}
