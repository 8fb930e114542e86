use chrono::NaiveDate;
use thiserror::Error;

/// Errors produced while scraping campaign pages and their tabular exports.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The page carries the platform's "campaign not found" marker.
    #[error("campaign not found at {url}")]
    CampaignNotFound { url: String },

    /// The share link does not match `<origin>/stats/<id>`.
    #[error("invalid campaign share link: {link}")]
    InvalidShareLink { link: String },

    /// The page did not contain exactly two export-link markers. Any other
    /// count means the inline-script format has drifted.
    #[error("expected exactly 2 export-link markers in page, found {found}")]
    ExportMarkers { found: usize },

    /// An export path opened by a marker never reaches a closing quote.
    #[error("export path at byte {offset} is not quote-terminated")]
    UnterminatedExportPath { offset: usize },

    /// A structurally expected page element is missing.
    #[error("missing expected page field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid CSS selector: {selector}")]
    Selector { selector: &'static str },

    /// An extracted export path did not form a valid absolute URL.
    #[error("invalid export URL {url:?}: {reason}")]
    InvalidExportUrl { url: String, reason: String },

    /// The export endpoint declared something other than tab-separated text.
    #[error("unexpected content type {content_type:?} from {url}")]
    UnexpectedContentType { content_type: String, url: String },

    /// The export body is not a well-formed tab-delimited table.
    #[error("malformed export table: {0}")]
    Table(#[from] csv::Error),

    #[error("{table} table has {found} columns, expected at most {max}")]
    UnexpectedColumns {
        table: &'static str,
        found: usize,
        max: usize,
    },

    /// A data row is narrower than the columns the reconciler reads.
    #[error("{table} table row {row} has no column {column}")]
    MissingColumn {
        table: &'static str,
        row: usize,
        column: usize,
    },

    #[error("invalid date {value:?} in {table} table row {row}")]
    InvalidDate {
        table: &'static str,
        row: usize,
        value: String,
    },

    #[error("invalid integer {value:?} in stats table row {row}")]
    InvalidNumber { row: usize, value: String },

    #[error("invalid decimal {value:?} in budget table row {row}")]
    InvalidDecimal { row: usize, value: String },

    /// The budget table's date diverged from the stats table's date at the
    /// same row index. The whole merge is discarded.
    #[error("budget date {budget_date} does not match stats date {stats_date} at row {row}")]
    DateMismatch {
        row: usize,
        stats_date: NaiveDate,
        budget_date: NaiveDate,
    },

    /// The budget table has more data rows than the stats table.
    #[error("budget table row {row} has no matching stats row")]
    BudgetRowOverrun { row: usize },
}
