//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the daily
//! sync. Deployments driven by an external scheduler can ignore this and
//! hit the cron route instead; both paths run the same day sync.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use adboard_meta::{MetaClient, MetaConfig};

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// a job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<adboard_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_daily_sync_job(&scheduler, pool, config).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the daily ad-performance sync.
///
/// Runs every day at 03:30 UTC — 00:30 in the business timezone, past
/// midnight there so "yesterday" is a complete day on the source side.
async fn register_daily_sync_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<adboard_core::AppConfig>,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 30 3 * * *", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting daily sync run");
            run_daily_sync(&pool, &config).await;
            tracing::info!("scheduler: daily sync run complete");
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

/// Drive one day sync for timezone-local yesterday.
async fn run_daily_sync(pool: &PgPool, config: &adboard_core::AppConfig) {
    let meta_config = match MetaConfig::from_app_config(config) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(error = %e, "scheduler: Meta credentials not configured; skipping");
            return;
        }
    };

    let client = match MetaClient::new(meta_config, config.meta_request_timeout_secs) {
        Ok(c) => c.with_retry_policy(config.meta_max_retries, config.meta_retry_backoff_base_ms),
        Err(e) => {
            tracing::error!(error = %e, "scheduler: failed to construct Meta client");
            return;
        }
    };

    let date = adboard_core::yesterday_local();
    match adboard_sync::sync_day(pool, &client, date).await {
        Ok(report) => {
            tracing::info!(
                date = %report.date,
                campaigns = report.campaigns,
                ad_rows = report.ad_rows,
                results = report.results,
                conversations_started = report.conversations_started,
                "scheduler: daily sync succeeded"
            );
        }
        Err(e) => {
            tracing::error!(date = %date, error = %e, "scheduler: daily sync failed");
        }
    }
}
