//! Data extracted from a campaign's control page and its exports.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Fields extracted from one campaign control page.
///
/// `text` is the raw HTML fragment of the creative description, preserved
/// verbatim as extracted. The export URLs are absolute and always carry
/// `period=day`.
#[derive(Debug, Clone)]
pub struct CampaignPage {
    pub id: String,
    pub stats_export_url: String,
    pub budget_export_url: String,
    pub text: String,
    pub button_text: String,
    pub link: String,
    pub active: bool,
}

/// One reconciled per-day performance record.
///
/// `cpm` is `spend * 1000 / views`; when `views == 0` the divisor is
/// substituted with 1 (a spend-only proxy, not a true zero — see the
/// reconciler tests).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyStat {
    pub date: NaiveDate,
    pub views: i64,
    pub clicks: i64,
    pub actions: i64,
    pub spend: Decimal,
    pub cpm: Decimal,
}
