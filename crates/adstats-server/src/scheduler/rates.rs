//! The recurring exchange-rate load.
//!
//! Much lighter than the stats refresh: two single-value fetches and two
//! upserts per trigger, with per-date failure isolation.

use std::sync::Arc;

use chrono::{Days, Utc};
use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler};

use adstats_coingecko::RatesClient;

/// Default request timeout for the rates client.
const RATES_TIMEOUT_SECS: u64 = 30;

/// Register the recurring exchange-rate job.
///
/// Runs shortly after midnight UTC by default (`0 10 0 * * *`), overridable
/// via `ADSTATS_RATES_CRON`. Each trigger upserts the rate for yesterday and
/// today, so the final value for a date settles on the day after it.
pub(super) async fn register_rates_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    api_key: &str,
    config: &adstats_core::AppConfig,
) -> anyhow::Result<()> {
    let cron = config.rates_cron.clone();
    let client = Arc::new(RatesClient::new(api_key, RATES_TIMEOUT_SECS)?);
    let pool = Arc::new(pool);

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let client = Arc::clone(&client);

        Box::pin(async move {
            tracing::info!("rates: starting exchange-rate load");
            run_rates_job(&pool, &client).await;
            tracing::info!("rates: exchange-rate load complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, "scheduler: registered exchange-rate job");
    Ok(())
}

/// Fetch and upsert the TON/USD rate for yesterday and today.
async fn run_rates_job(pool: &PgPool, client: &RatesClient) {
    let today = Utc::now().date_naive();
    let yesterday = today.checked_sub_days(Days::new(1)).unwrap_or(today);

    for date in [yesterday, today] {
        let rate = match client.ton_usd_rate(date).await {
            Ok(rate) => rate,
            Err(e) => {
                tracing::error!(%date, error = %e, "rates: fetch failed");
                continue;
            }
        };

        match adstats_db::upsert_exchange_rate(pool, date, rate).await {
            Ok(()) => tracing::info!(%date, %rate, "rates: upserted"),
            Err(e) => tracing::error!(%date, error = %e, "rates: db upsert failed"),
        }
    }
}
