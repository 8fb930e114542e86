//! The recurring stats refresh cycle.
//!
//! On each trigger the job lists every registered campaign and fans the list
//! out across a fixed-size worker pool fed from one shared queue. Each
//! worker pulls a campaign, re-extracts its control page for fresh export
//! URLs, downloads and reconciles both exports, and upserts the per-day
//! records in one batch. A failure at any stage is logged with campaign
//! context and the worker moves on — no campaign can abort the cycle.

use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::{mpsc, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use adstats_db::{CampaignRow, NewDailyStat};
use adstats_scraper::AdsClient;

/// Register the recurring stats refresh job.
///
/// Runs at minute 55 of every hour by default (`0 55 * * * *`), overridable
/// via `ADSTATS_REFRESH_CRON`. Overlapping cycles are disallowed: a trigger
/// that fires while the previous cycle is still draining is skipped with a
/// warning rather than queued behind it.
pub(super) async fn register_refresh_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    ads: Arc<AdsClient>,
    config: &adstats_core::AppConfig,
) -> Result<(), JobSchedulerError> {
    let cron = config.refresh_cron.clone();
    let workers = config.refresh_workers;
    let pool = Arc::new(pool);
    let in_flight = Arc::new(Mutex::new(()));

    let job = Job::new_async(cron.as_str(), move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let ads = Arc::clone(&ads);
        let in_flight = Arc::clone(&in_flight);

        Box::pin(async move {
            let Ok(_guard) = in_flight.try_lock() else {
                tracing::warn!("refresh: previous cycle still running; skipping this trigger");
                return;
            };
            tracing::info!("refresh: starting stats refresh cycle");
            run_refresh_cycle(&pool, &ads, workers).await;
            tracing::info!("refresh: stats refresh cycle complete");
        })
    })?;

    scheduler.add(job).await?;
    tracing::info!(cron = %cron, workers, "scheduler: registered stats refresh job");
    Ok(())
}

/// Run one full refresh cycle: list, fan out, join.
///
/// A listing failure degrades the cycle to a no-op rather than an error.
/// Completion means every worker has observed queue exhaustion and finished
/// its current item; there is no per-cycle result object, only storage
/// writes and log lines.
pub(crate) async fn run_refresh_cycle(pool: &PgPool, ads: &Arc<AdsClient>, workers: usize) {
    let campaigns = match adstats_db::fetch_campaigns(pool).await {
        Ok(campaigns) => campaigns,
        Err(e) => {
            tracing::error!(error = %e, "refresh: failed to list campaigns; skipping cycle");
            return;
        }
    };

    if campaigns.is_empty() {
        tracing::info!("refresh: no campaigns registered; skipping");
        return;
    }

    tracing::info!(count = campaigns.len(), "refresh: fanning out campaigns");

    let pool = pool.clone();
    let ads = Arc::clone(ads);
    fan_out(campaigns, workers, move |campaign: CampaignRow| {
        let pool = pool.clone();
        let ads = Arc::clone(&ads);
        async move { refresh_campaign(&pool, &ads, &campaign).await }
    })
    .await;
}

/// Fan a batch of items out across a fixed-size worker pool.
///
/// Rendezvous-style queue: capacity 1 so the producer hands items over as
/// workers become free. Workers share the receiving end and compete for
/// items; the action owns failure handling, so one item's failure never
/// stops the others. Returns only once every worker has observed queue
/// exhaustion and finished its current item.
async fn fan_out<T, F, Fut>(items: Vec<T>, workers: usize, action: F)
where
    T: Send + 'static,
    F: Fn(T) -> Fut + Clone + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel::<T>(1);
    let rx = Arc::new(Mutex::new(rx));

    let mut handles = Vec::with_capacity(workers.max(1));
    for _ in 0..workers.max(1) {
        let rx = Arc::clone(&rx);
        let action = action.clone();

        handles.push(tokio::spawn(async move {
            loop {
                // Hold the lock only for the pull, not while processing.
                let item = { rx.lock().await.recv().await };
                match item {
                    Some(item) => action(item).await,
                    None => break,
                }
            }
        }));
    }
    drop(rx);

    for item in items {
        if tx.send(item).await.is_err() {
            break;
        }
    }
    // Closing the queue signals workers to drain and exit.
    drop(tx);

    // Join barrier: the batch is complete only once every worker is done.
    let _ = futures::future::join_all(handles).await;
}

/// Refresh a single campaign: extract → fetch → reconcile → persist.
///
/// Errors are logged, never propagated — failure isolation lives here, at
/// the worker boundary. Display fields from the re-extracted page are
/// deliberately not persisted; registration is the only write of those.
async fn refresh_campaign(pool: &PgPool, ads: &AdsClient, campaign: &CampaignRow) {
    let page = match ads.campaign(&ads.share_link(&campaign.id)).await {
        Ok(page) => page,
        Err(e) => {
            tracing::error!(campaign = %campaign.id, error = %e, "refresh: page extraction failed");
            return;
        }
    };

    let stats = match ads
        .daily_stats(&page.stats_export_url, &page.budget_export_url)
        .await
    {
        Ok(stats) => stats,
        Err(e) => {
            tracing::error!(campaign = %campaign.id, error = %e, "refresh: export reconciliation failed");
            return;
        }
    };

    if stats.is_empty() {
        tracing::debug!(campaign = %campaign.id, "refresh: no stat rows yet");
        return;
    }

    let records: Vec<NewDailyStat> = stats
        .into_iter()
        .map(|stat| NewDailyStat {
            date: stat.date,
            views: stat.views,
            clicks: stat.clicks,
            actions: stat.actions,
            spend: stat.spend,
            cpm: stat.cpm,
        })
        .collect();

    match adstats_db::upsert_daily_stats(pool, &campaign.id, &records).await {
        Ok(()) => {
            tracing::info!(campaign = %campaign.id, rows = records.len(), "refresh: stats upserted");
        }
        Err(e) => {
            tracing::error!(campaign = %campaign.id, error = %e, "refresh: db upsert failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Mutex;

    use super::fan_out;

    #[tokio::test]
    async fn one_failing_item_does_not_abort_the_others() {
        let persisted = Arc::new(Mutex::new(Vec::new()));
        let failed = Arc::new(AtomicUsize::new(0));

        let persisted_handle = Arc::clone(&persisted);
        let failed_handle = Arc::clone(&failed);
        fan_out((0..5).collect::<Vec<usize>>(), 2, move |item| {
            let persisted = Arc::clone(&persisted_handle);
            let failed = Arc::clone(&failed_handle);
            async move {
                // Item 2 takes the logged-and-skipped error path a worker
                // uses for a broken campaign.
                if item == 2 {
                    failed.fetch_add(1, Ordering::SeqCst);
                    return;
                }
                persisted.lock().await.push(item);
            }
        })
        .await;

        let mut done = persisted.lock().await.clone();
        done.sort_unstable();
        assert_eq!(done, vec![0, 1, 3, 4]);
        assert_eq!(failed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn join_barrier_waits_for_every_worker() {
        let completed = Arc::new(AtomicUsize::new(0));

        let completed_handle = Arc::clone(&completed);
        fan_out((0..8).collect::<Vec<usize>>(), 3, move |_item| {
            let completed = Arc::clone(&completed_handle);
            async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                completed.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

        // Every item finished before fan_out returned, slow workers included.
        assert_eq!(completed.load(Ordering::SeqCst), 8);
    }

    #[tokio::test]
    async fn pool_never_exceeds_the_configured_worker_count() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let in_flight_handle = Arc::clone(&in_flight);
        let peak_handle = Arc::clone(&peak);
        fan_out((0..20).collect::<Vec<usize>>(), 4, move |_item| {
            let in_flight = Arc::clone(&in_flight_handle);
            let peak = Arc::clone(&peak_handle);
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
        assert!(
            peak.load(Ordering::SeqCst) <= 4,
            "worker pool overran its bound: {peak:?}"
        );
    }

    #[tokio::test]
    async fn empty_batch_completes_immediately() {
        let touched = Arc::new(AtomicUsize::new(0));

        let touched_handle = Arc::clone(&touched);
        fan_out(Vec::<usize>::new(), 4, move |_item| {
            let touched = Arc::clone(&touched_handle);
            async move {
                touched.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

        assert_eq!(touched.load(Ordering::SeqCst), 0);
    }
}
