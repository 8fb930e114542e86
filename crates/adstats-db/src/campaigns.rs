//! Database operations for the `campaigns` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `campaigns` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CampaignRow {
    pub id: String,
    pub name: String,
    pub stats_export_url: String,
    pub budget_export_url: String,
    pub text: String,
    pub button_text: String,
    pub link: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields captured at registration time for a new campaign.
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub id: String,
    pub name: String,
    pub stats_export_url: String,
    pub budget_export_url: String,
    pub text: String,
    pub button_text: String,
    pub link: String,
    pub active: bool,
}

/// Insert a campaign, ignoring the write when the id already exists.
///
/// Registration is create-once: a duplicate id is not an error, and the
/// existing row is left untouched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_campaign(pool: &PgPool, campaign: &NewCampaign) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO campaigns \
             (id, name, stats_export_url, budget_export_url, text, button_text, link, active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(&campaign.id)
    .bind(&campaign.name)
    .bind(&campaign.stats_export_url)
    .bind(&campaign.budget_export_url)
    .bind(&campaign.text)
    .bind(&campaign.button_text)
    .bind(&campaign.link)
    .bind(campaign.active)
    .execute(pool)
    .await?;

    Ok(())
}

/// List every registered campaign, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn fetch_campaigns(pool: &PgPool) -> Result<Vec<CampaignRow>, DbError> {
    let rows = sqlx::query_as::<_, CampaignRow>(
        "SELECT id, name, stats_export_url, budget_export_url, text, button_text, \
                link, active, created_at \
         FROM campaigns \
         ORDER BY created_at, id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
