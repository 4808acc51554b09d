//! Cron scheduler for the reminder and expiry sweeps

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};
use tracing::{error, info};
use warranty_common::{AppError, ScheduleConfig};
use warranty_service::{ServiceContext, ServiceResult, SweepReport};

use crate::jobs::{run_expiry_sweep, run_reminder_sweep, run_startup_sweep};

/// Time-driven sweeps over the shared store
pub struct ExpirationScheduler {
    scheduler: JobScheduler,
    ctx: Arc<ServiceContext>,
    schedule: ScheduleConfig,
}

impl std::fmt::Debug for ExpirationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpirationScheduler")
            .field("schedule", &self.schedule)
            .finish()
    }
}

impl ExpirationScheduler {
    /// Create a new scheduler; nothing runs until `start`
    pub async fn new(ctx: Arc<ServiceContext>, schedule: ScheduleConfig) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to create scheduler: {e}")))?;

        Ok(Self {
            scheduler,
            ctx,
            schedule,
        })
    }

    /// Register the reminder and expiry sweeps
    pub async fn register_default_jobs(&self) -> Result<(), AppError> {
        let reminder_cron = self.schedule.reminder_cron.clone();
        self.register("reminder_sweep", &reminder_cron, |ctx| async move {
            run_reminder_sweep(&ctx, Utc::now()).await.map(|_| ())
        })
        .await?;

        let expiry_cron = self.schedule.expiry_cron.clone();
        self.register("expiry_sweep", &expiry_cron, |ctx| async move {
            run_expiry_sweep(&ctx, Utc::now()).await.map(|_| ())
        })
        .await?;

        info!("All scheduled sweeps registered");
        Ok(())
    }

    /// Run the integrity sweep once, before the timers start
    pub async fn run_startup_sweep(&self) -> ServiceResult<SweepReport> {
        run_startup_sweep(&self.ctx, Utc::now()).await
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to start scheduler: {e}")))?;

        info!("Expiration scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to shutdown scheduler: {e}")))?;

        info!("Expiration scheduler shut down");
        Ok(())
    }

    async fn register<F, Fut>(&self, name: &'static str, cron: &str, run: F) -> Result<(), AppError>
    where
        F: Fn(Arc<ServiceContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ServiceResult<()>> + Send + 'static,
    {
        let ctx = Arc::clone(&self.ctx);
        let run = Arc::new(run);
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let ctx = Arc::clone(&ctx);
            let run = Arc::clone(&run);
            Box::pin(async move {
                if let Err(e) = run(ctx).await {
                    error!(job = name, error = %e, "Scheduled sweep failed");
                }
            })
        })
        .map_err(|e| AppError::Scheduler(format!("Invalid schedule for {name} ({cron}): {e}")))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::Scheduler(format!("Failed to add {name}: {e}")))?;

        info!(job = name, cron, "Registered sweep");
        Ok(())
    }
}
