//! Database operations for the `exchange_rates` table.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// Upsert the exchange rate for one calendar date, overwriting on conflict.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_exchange_rate(
    pool: &PgPool,
    date: NaiveDate,
    rate: Decimal,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO exchange_rates (\"date\", rate) \
         VALUES ($1, $2) \
         ON CONFLICT (\"date\") DO UPDATE SET rate = EXCLUDED.rate",
    )
    .bind(date)
    .bind(rate)
    .execute(pool)
    .await?;

    Ok(())
}
