//! Scheduler Service - cron dispatch of the pipeline using tokio-cron-scheduler
//!
//! Jobs fire on six-field cron expressions evaluated in UTC. Runs that were
//! missed while the process was down are not replayed, and a job that fires
//! while its previous run is still in progress is skipped.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AppResult;

/// Type alias for job identifiers (same as tokio-cron-scheduler's JobId)
pub type JobId = Uuid;

/// Core scheduler service that manages cron-based job scheduling
pub struct SchedulerService {
    scheduler: Arc<Mutex<JobScheduler>>,
    is_running: Arc<RwLock<bool>>,
}

impl SchedulerService {
    /// Create a new scheduler service instance
    pub async fn new() -> AppResult<Self> {
        debug!("Creating scheduler service");
        let scheduler = JobScheduler::new().await?;

        Ok(SchedulerService {
            scheduler: Arc::new(Mutex::new(scheduler)),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Start processing scheduled jobs
    pub async fn start(&self) -> AppResult<()> {
        let mut is_running = self.is_running.write().await;

        if *is_running {
            warn!("Scheduler is already running");
            return Ok(());
        }

        let scheduler = self.scheduler.lock().await;
        scheduler.start().await?;

        *is_running = true;
        info!("Scheduler service started");
        Ok(())
    }

    /// Stop the scheduler
    pub async fn stop(&self) -> AppResult<()> {
        let mut is_running = self.is_running.write().await;

        if !*is_running {
            warn!("Scheduler is not running");
            return Ok(());
        }

        let mut scheduler = self.scheduler.lock().await;
        scheduler.shutdown().await?;

        *is_running = false;
        info!("Scheduler service stopped");
        Ok(())
    }

    /// Add a job that never overlaps with itself.
    ///
    /// When the schedule fires while the previous invocation of `job_fn` is
    /// still running, that firing is skipped with a warning.
    pub async fn add_exclusive_job<F, Fut>(&self, name: &str, cron_expression: &str, job_fn: F) -> AppResult<JobId>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        info!("Adding job '{}' with cron '{}'", name, cron_expression);

        let guard = Arc::new(Mutex::new(()));
        let job_fn = Arc::new(job_fn);
        let job_name = name.to_string();

        let job = Job::new_async(cron_expression, move |_uuid, _scheduler| {
            let guard = Arc::clone(&guard);
            let job_fn = Arc::clone(&job_fn);
            let job_name = job_name.clone();
            Box::pin(async move {
                let Ok(_running) = guard.try_lock() else {
                    warn!("Previous run of '{}' still in progress, skipping this one", job_name);
                    return;
                };
                job_fn().await;
            })
        })?;

        let scheduler = self.scheduler.lock().await;
        let job_id = scheduler.add(job).await?;

        info!("Added job '{}' with ID {}", name, job_id);
        Ok(job_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_scheduler_start_stop() {
        let scheduler = SchedulerService::new().await.unwrap();

        // Stopping before starting is a no-op
        tokio_test::assert_ok!(scheduler.stop().await);

        scheduler.start().await.unwrap();
        tokio_test::assert_ok!(scheduler.start().await);
        assert!(*scheduler.is_running.read().await);

        scheduler.stop().await.unwrap();
        assert!(!*scheduler.is_running.read().await);
    }

    #[tokio::test]
    async fn test_add_job_returns_distinct_ids() {
        let scheduler = SchedulerService::new().await.unwrap();

        let daily = tokio_test::assert_ok!(
            scheduler
                .add_exclusive_job("sales_revenue_pipeline", "0 0 0 * * *", || async {})
                .await
        );
        let hourly = tokio_test::assert_ok!(scheduler.add_exclusive_job("hourly", "0 0 * * * *", || async {}).await);

        assert_ne!(daily, hourly);
    }

    #[tokio::test]
    async fn test_invalid_cron_expression() {
        let scheduler = SchedulerService::new().await.unwrap();

        let result = scheduler
            .add_exclusive_job("invalid_job", "invalid_cron", || async {})
            .await;

        tokio_test::assert_err!(result);
    }

    #[tokio::test]
    async fn test_overlapping_runs_are_skipped() {
        let scheduler = SchedulerService::new().await.unwrap();
        let started = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&started);

        // Fires every second while each run takes several seconds
        scheduler
            .add_exclusive_job("slow_job", "* * * * * *", move || {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_secs(10)).await;
                }
            })
            .await
            .unwrap();

        scheduler.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(3500)).await;
        scheduler.stop().await.unwrap();

        assert_eq!(started.load(Ordering::SeqCst), 1);
    }
}
