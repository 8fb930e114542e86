//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the two
//! recurring jobs: the stats refresh cycle and the exchange-rate load. The
//! returned handle must be kept alive for the lifetime of the process —
//! dropping it shuts down all jobs.

mod rates;
mod refresh;

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::JobScheduler;

/// Builds and starts the background job scheduler.
///
/// The exchange-rate job is only registered when a `CoinGecko` API key is
/// configured; without one the refresh job still runs.
///
/// # Errors
///
/// Returns an error if the scheduler cannot be initialised, a job cannot be
/// registered, the rates HTTP client cannot be built, or the scheduler fails
/// to start.
pub async fn build_scheduler(
    pool: PgPool,
    ads: Arc<adstats_scraper::AdsClient>,
    config: Arc<adstats_core::AppConfig>,
) -> anyhow::Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    refresh::register_refresh_job(&scheduler, pool.clone(), ads, &config).await?;

    if let Some(api_key) = &config.coingecko_api_key {
        rates::register_rates_job(&scheduler, pool, api_key, &config).await?;
    } else {
        tracing::warn!("scheduler: COINGECKO_API_KEY not set; exchange-rate job disabled");
    }

    scheduler.start().await?;
    Ok(scheduler)
}
