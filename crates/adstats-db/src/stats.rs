//! Database operations for the `daily_stats` table.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// One reconciled per-day record ready to persist.
#[derive(Debug, Clone)]
pub struct NewDailyStat {
    pub date: NaiveDate,
    pub views: i64,
    pub clicks: i64,
    pub actions: i64,
    pub spend: Decimal,
    pub cpm: Decimal,
}

/// Upsert a batch of per-day stats for one campaign in a single statement.
///
/// Uses `INSERT … SELECT * FROM UNNEST(…) ON CONFLICT` so the whole batch is
/// one round-trip regardless of size. On an existing `(campaign_id, date)`
/// key every measured field is overwritten — replaying the same exports is
/// idempotent, and a later refresh supersedes an earlier one for the same day.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_daily_stats(
    pool: &PgPool,
    campaign_id: &str,
    stats: &[NewDailyStat],
) -> Result<(), DbError> {
    if stats.is_empty() {
        return Ok(());
    }

    // Collect each column into a parallel Vec for UNNEST binding.
    let mut dates: Vec<NaiveDate> = Vec::with_capacity(stats.len());
    let mut views: Vec<i64> = Vec::with_capacity(stats.len());
    let mut clicks: Vec<i64> = Vec::with_capacity(stats.len());
    let mut actions: Vec<i64> = Vec::with_capacity(stats.len());
    let mut spends: Vec<Decimal> = Vec::with_capacity(stats.len());
    let mut cpms: Vec<Decimal> = Vec::with_capacity(stats.len());

    for stat in stats {
        dates.push(stat.date);
        views.push(stat.views);
        clicks.push(stat.clicks);
        actions.push(stat.actions);
        spends.push(stat.spend);
        cpms.push(stat.cpm);
    }

    sqlx::query(
        "INSERT INTO daily_stats (campaign_id, \"date\", views, clicks, actions, spend, cpm) \
         SELECT $1, * FROM UNNEST(\
             $2::date[], $3::bigint[], $4::bigint[], $5::bigint[], \
             $6::numeric[], $7::numeric[]) \
         ON CONFLICT (campaign_id, \"date\") DO UPDATE SET \
             views   = EXCLUDED.views, \
             clicks  = EXCLUDED.clicks, \
             actions = EXCLUDED.actions, \
             spend   = EXCLUDED.spend, \
             cpm     = EXCLUDED.cpm",
    )
    .bind(campaign_id)
    .bind(&dates)
    .bind(&views)
    .bind(&clicks)
    .bind(&actions)
    .bind(&spends)
    .bind(&cpms)
    .execute(pool)
    .await?;

    Ok(())
}
