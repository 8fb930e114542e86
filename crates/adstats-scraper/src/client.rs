//! HTTP client for campaign control pages and their TSV exports.

use std::time::Duration;

use regex::Regex;
use reqwest::Client;
use scraper::Html;

use crate::error::ScrapeError;
use crate::extract;
use crate::reconcile::reconcile;
use crate::types::{CampaignPage, DailyStat};

const DEFAULT_ORIGIN: &str = "https://ads.telegram.org";

/// Exact content type the platform declares on its tab-separated exports.
const EXPORT_CONTENT_TYPE: &str = "text/csv";

/// Client for the advertising platform's server-rendered stats pages.
///
/// One fetch per operation, no retries: a failed campaign is retried
/// naturally on the next scheduled cycle, and the caller is responsible for
/// isolating per-campaign failures. Every request carries the client's
/// timeout, so a stalled upstream cannot block a worker indefinitely.
pub struct AdsClient {
    client: Client,
    origin: String,
    share_link_pattern: Regex,
}

impl AdsClient {
    /// Creates a client pointed at the production platform origin.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ScrapeError> {
        Self::with_origin(timeout_secs, user_agent, DEFAULT_ORIGIN)
    }

    /// Creates a client with a custom origin (for testing with wiremock).
    ///
    /// Share links, the campaign-id pattern, and export URLs all resolve
    /// against this origin.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`ScrapeError::InvalidExportUrl`] if
    /// `origin` cannot anchor the share-link pattern.
    pub fn with_origin(
        timeout_secs: u64,
        user_agent: &str,
        origin: &str,
    ) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let origin = origin.trim_end_matches('/').to_owned();
        let pattern = format!("^{}/stats/([A-Za-z0-9]+)$", regex::escape(&origin));
        let share_link_pattern =
            Regex::new(&pattern).map_err(|e| ScrapeError::InvalidExportUrl {
                url: origin.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            client,
            origin,
            share_link_pattern,
        })
    }

    /// Deterministic public control-page URL for a campaign id.
    #[must_use]
    pub fn share_link(&self, id: &str) -> String {
        format!("{}/stats/{id}", self.origin)
    }

    /// Parses the campaign id out of a share link.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::InvalidShareLink`] if the link does not match
    /// `<origin>/stats/<id>`.
    pub fn campaign_id(&self, link: &str) -> Result<String, ScrapeError> {
        self.share_link_pattern
            .captures(link)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_owned())
            .ok_or_else(|| ScrapeError::InvalidShareLink {
                link: link.to_owned(),
            })
    }

    /// Fetches a campaign control page and extracts everything the pipeline
    /// needs from it: identity, display fields, and the two export URLs with
    /// `period=day` forced.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Http`] / [`ScrapeError::UnexpectedStatus`] on fetch
    ///   failure.
    /// - [`ScrapeError::CampaignNotFound`] when the page carries the
    ///   not-found marker; nothing further is extracted.
    /// - [`ScrapeError::InvalidShareLink`] when `link` does not match the
    ///   share-link pattern.
    /// - [`ScrapeError::MissingField`] / [`ScrapeError::ExportMarkers`] /
    ///   [`ScrapeError::UnterminatedExportPath`] when the page structure has
    ///   drifted.
    pub async fn campaign(&self, link: &str) -> Result<CampaignPage, ScrapeError> {
        let body = self.fetch_page(link).await?;

        // DOM work happens in a sync block: `Html` is not `Send` and must
        // not be held across an await point. The id parse sits between the
        // not-found check and field extraction, so a bad share link surfaces
        // as `InvalidShareLink` even on a structurally drifted page.
        let (id, fields, paths) = {
            let doc = Html::parse_document(&body);

            if extract::is_not_found_page(&doc)? {
                return Err(ScrapeError::CampaignNotFound {
                    url: link.to_owned(),
                });
            }

            let id = self.campaign_id(link)?;
            (
                id,
                extract::page_fields(&doc)?,
                extract::extract_export_paths(&body)?,
            )
        };

        let (stats_path, budget_path) = paths;

        Ok(CampaignPage {
            id,
            stats_export_url: extract::export_url(&self.origin, &stats_path)?,
            budget_export_url: extract::export_url(&self.origin, &budget_path)?,
            text: fields.text,
            button_text: fields.button_text,
            link: fields.link,
            active: fields.active,
        })
    }

    /// Downloads both exports and reconciles them into per-day records.
    ///
    /// # Errors
    ///
    /// Propagates fetch/format errors from [`AdsClient::fetch_table`] and
    /// every reconciliation error from [`crate::reconcile::reconcile`].
    pub async fn daily_stats(
        &self,
        stats_url: &str,
        budget_url: &str,
    ) -> Result<Vec<DailyStat>, ScrapeError> {
        let stats_table = self.fetch_table(stats_url).await?;
        let budget_table = self.fetch_table(budget_url).await?;
        reconcile(&stats_table, &budget_table)
    }

    /// Fetches one export URL and parses the body as a tab-delimited table.
    ///
    /// Returns every row including the header as ordered string cells; no
    /// column semantics are applied here.
    ///
    /// # Errors
    ///
    /// - [`ScrapeError::Http`] / [`ScrapeError::UnexpectedStatus`] on fetch
    ///   failure.
    /// - [`ScrapeError::UnexpectedContentType`] if the response does not
    ///   declare `text/csv`.
    /// - [`ScrapeError::Table`] on malformed tabular encoding (unterminated
    ///   quote, ragged rows).
    pub async fn fetch_table(&self, url: &str) -> Result<Vec<Vec<String>>, ScrapeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        if content_type != EXPORT_CONTENT_TYPE {
            return Err(ScrapeError::UnexpectedContentType {
                content_type,
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_reader(body.as_bytes());

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_owned).collect());
        }

        tracing::debug!(url, rows = rows.len(), "parsed export table");
        Ok(rows)
    }

    async fn fetch_page(&self, url: &str) -> Result<String, ScrapeError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }
        Ok(response.text().await?)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
