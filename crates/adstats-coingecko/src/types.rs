//! Response types for `CoinGecko`'s `/coins/{id}/history` endpoint.
//!
//! The history payload is large; only the path down to the USD spot price is
//! modeled. Every level defaults so that a thin or historical payload (older
//! dates omit `market_data` entirely) deserializes rather than erroring —
//! the client treats an absent price as zero-rate and the caller decides
//! whether to persist it.

use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct CoinHistoryResponse {
    #[serde(default)]
    pub market_data: Option<MarketData>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MarketData {
    #[serde(default)]
    pub current_price: CurrentPrice,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CurrentPrice {
    #[serde(default)]
    pub usd: Decimal,
}
