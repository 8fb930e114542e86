//! Campaign registration and listing handlers.

use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use adstats_db::NewCampaign;
use adstats_scraper::ScrapeError;

use super::{map_db_error, ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CreateCampaignRequest {
    pub link: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct CreateCampaignResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct CampaignItem {
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

fn map_scrape_error(error: &ScrapeError) -> ApiError {
    match error {
        ScrapeError::InvalidShareLink { link } => ApiError::new(
            "validation_error",
            format!("'{link}' is not a campaign share link"),
        ),
        ScrapeError::CampaignNotFound { .. } => {
            ApiError::new("not_found", "campaign does not exist")
        }
        other => {
            tracing::error!(error = %other, "campaign page extraction failed");
            ApiError::new("upstream_error", "failed to extract campaign page")
        }
    }
}

/// POST /api/v1/campaigns — register a campaign from its share link.
///
/// Extracts the control page once and persists the snapshot; a duplicate id
/// is silently ignored (create-once semantics).
pub(in crate::api) async fn create_campaign(
    State(state): State<AppState>,
    Json(body): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<CreateCampaignResponse>), ApiError> {
    let link = body.link.trim();
    if link.is_empty() {
        return Err(ApiError::new("validation_error", "link is required"));
    }

    let page = state
        .ads
        .campaign(link)
        .await
        .map_err(|e| map_scrape_error(&e))?;

    let campaign = NewCampaign {
        id: page.id.clone(),
        name: body.name,
        stats_export_url: page.stats_export_url,
        budget_export_url: page.budget_export_url,
        text: page.text,
        button_text: page.button_text,
        link: page.link,
        active: page.active,
    };

    adstats_db::create_campaign(&state.pool, &campaign)
        .await
        .map_err(|e| map_db_error(&e))?;

    Ok((
        StatusCode::CREATED,
        Json(CreateCampaignResponse { id: page.id }),
    ))
}

/// GET /api/v1/campaigns — list registered campaigns.
pub(in crate::api) async fn list_campaigns(
    State(state): State<AppState>,
) -> Result<Json<Vec<CampaignItem>>, ApiError> {
    let campaigns = adstats_db::fetch_campaigns(&state.pool)
        .await
        .map_err(|e| map_db_error(&e))?;

    let items = campaigns
        .into_iter()
        .map(|row| CampaignItem {
            id: row.id,
            name: row.name,
            stats_export_url: row.stats_export_url,
            budget_export_url: row.budget_export_url,
            text: row.text,
            button_text: row.button_text,
            link: row.link,
            active: row.active,
            created_at: row.created_at,
        })
        .collect();

    Ok(Json(items))
}
