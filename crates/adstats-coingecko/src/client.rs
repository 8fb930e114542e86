//! HTTP client for `CoinGecko`'s coin-history endpoint.

use std::time::Duration;

use chrono::NaiveDate;
use reqwest::{Client, Url};
use rust_decimal::Decimal;

use crate::error::RatesError;
use crate::types::CoinHistoryResponse;

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3/";

/// `CoinGecko` coin id for Toncoin.
const TON_COIN_ID: &str = "the-open-network";

/// Date format the history endpoint expects, e.g. `31-01-2025`.
const HISTORY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Client for `CoinGecko`'s REST API.
///
/// Use [`RatesClient::new`] for production or
/// [`RatesClient::with_base_url`] to point at a mock server in tests.
pub struct RatesClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl RatesClient {
    /// Creates a new client pointed at the production `CoinGecko` API.
    ///
    /// # Errors
    ///
    /// Returns [`RatesError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(api_key: &str, timeout_secs: u64) -> Result<Self, RatesError> {
        Self::with_base_url(api_key, timeout_secs, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`RatesError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`RatesError::InvalidBaseUrl`] if
    /// `base_url` does not parse.
    pub fn with_base_url(
        api_key: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, RatesError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("adstats/0.1 (ads-reporting)")
            .build()?;

        // Normalise: exactly one trailing slash so Url::join keeps the full
        // base path instead of replacing its last segment.
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| RatesError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            api_key: api_key.to_owned(),
            base_url,
        })
    }

    /// Fetches the TON/USD spot price recorded for one calendar date.
    ///
    /// The only field consumed from the history payload is
    /// `market_data.current_price.usd`; dates old enough to have no market
    /// data yield zero.
    ///
    /// # Errors
    ///
    /// - [`RatesError::Http`] on network failure.
    /// - [`RatesError::UnexpectedStatus`] on a non-2xx response.
    /// - [`RatesError::Deserialize`] if the body is not the expected shape.
    pub async fn ton_usd_rate(&self, date: NaiveDate) -> Result<Decimal, RatesError> {
        let mut url = self
            .base_url
            .join(&format!("coins/{TON_COIN_ID}/history"))
            .map_err(|e| RatesError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("date", &date.format(HISTORY_DATE_FORMAT).to_string());

        let response = self
            .client
            .get(url.clone())
            .header("x-coingecko-api-key", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RatesError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        let parsed: CoinHistoryResponse =
            serde_json::from_str(&body).map_err(|e| RatesError::Deserialize {
                context: format!("coin history for {date}"),
                source: e,
            })?;

        Ok(parsed
            .market_data
            .map(|m| m.current_price.usd)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_date_format_is_day_month_year() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(date.format(HISTORY_DATE_FORMAT).to_string(), "31-01-2025");
    }
}
