//! Structural extraction from a campaign control page.
//!
//! Two kinds of extraction live here. The DOM fields (`link`, `active`,
//! creative text) come from parsed HTML via CSS selectors. The two TSV
//! export links do NOT — they sit inside an inline script blob, so they are
//! recovered by scanning the raw page text for a fixed marker. The page
//! format is an undocumented soft contract; everything in this module is
//! written so that drift surfaces as a typed error, never a panic, and the
//! marker scan is isolated here so a format change touches one routine.

use scraper::{Html, Selector};

use crate::error::ScrapeError;

/// Literal preceding each export path in the page's inline script. The
/// trailing backslash belongs to the marker: the paths are JSON-escaped, and
/// consuming the first escape leaves the scan positioned on the leading `/`.
const EXPORT_MARKER: &str = "\"csvExport\":\"\\";

/// Marker element present only on the platform's "campaign not found" page.
const NOT_FOUND_SELECTOR: &str = "meta[property=\"og:title\"]";

const LINK_SELECTOR: &str = "div.pr-ad-info-value > a";
const STATUS_BLOCK_SELECTOR: &str = "div.pr-review-ad-info-multi";
const STATUS_VALUE_SELECTOR: &str = "div.pr-ad-info-value";
const TEXT_SELECTOR: &str = "div.ad-msg-link-preview-desc";
const BUTTON_TEXT_SELECTOR: &str = "div.ad-msg-link-preview-btn";

/// Status label that maps to `active = true`; any other value is inactive.
const ACTIVE_LABEL: &str = "Active";

/// DOM-level fields of a campaign control page.
#[derive(Debug)]
pub(crate) struct PageFields {
    pub link: String,
    pub active: bool,
    pub text: String,
    pub button_text: String,
}

fn selector(css: &'static str) -> Result<Selector, ScrapeError> {
    Selector::parse(css).map_err(|_| ScrapeError::Selector { selector: css })
}

/// Whether the page is the platform's "campaign not found" placeholder.
///
/// # Errors
///
/// Returns [`ScrapeError::Selector`] only if the marker selector itself is
/// malformed, which would be a programming error surfaced in tests.
pub(crate) fn is_not_found_page(doc: &Html) -> Result<bool, ScrapeError> {
    let marker = selector(NOT_FOUND_SELECTOR)?;
    Ok(doc.select(&marker).next().is_some())
}

/// Extract the DOM fields of a live campaign page.
///
/// The click-through `link` is required; its absence means the page layout
/// has changed. The creative text and button text default to empty when
/// their elements are missing, and an unrecognized status label simply maps
/// to inactive.
///
/// # Errors
///
/// Returns [`ScrapeError::MissingField`] when the click-through link element
/// or its `href` is absent.
pub(crate) fn page_fields(doc: &Html) -> Result<PageFields, ScrapeError> {
    let link = doc
        .select(&selector(LINK_SELECTOR)?)
        .next()
        .and_then(|el| el.value().attr("href"))
        .ok_or(ScrapeError::MissingField { field: "link" })?
        .to_owned();

    let status_value = selector(STATUS_VALUE_SELECTOR)?;
    let active = doc
        .select(&selector(STATUS_BLOCK_SELECTOR)?)
        .next()
        .and_then(|block| block.select(&status_value).next())
        .is_some_and(|el| el.text().collect::<String>().trim() == ACTIVE_LABEL);

    let text = doc
        .select(&selector(TEXT_SELECTOR)?)
        .next()
        .map(|el| el.inner_html())
        .unwrap_or_default();

    let button_text = doc
        .select(&selector(BUTTON_TEXT_SELECTOR)?)
        .next()
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default();

    Ok(PageFields {
        link,
        active,
        text,
        button_text,
    })
}

/// Locate the two export paths embedded in the page's inline script.
///
/// The page must contain exactly two occurrences of the export marker: the
/// first opens the stats export path, the second the budget export path.
/// Each path runs from the end of its marker to the next `"` and is
/// JSON-unescaped (`\/` → `/`).
///
/// # Errors
///
/// - [`ScrapeError::ExportMarkers`] if the marker count is not exactly 2 —
///   a strict check that the page format has not drifted.
/// - [`ScrapeError::UnterminatedExportPath`] if a path never reaches a
///   closing quote.
pub fn extract_export_paths(body: &str) -> Result<(String, String), ScrapeError> {
    let mut starts = Vec::new();
    let mut from = 0;
    while let Some(pos) = body[from..].find(EXPORT_MARKER) {
        let start = from + pos + EXPORT_MARKER.len();
        starts.push(start);
        from = start;
    }

    if starts.len() != 2 {
        return Err(ScrapeError::ExportMarkers {
            found: starts.len(),
        });
    }

    let mut paths = starts.iter().map(|&start| -> Result<String, ScrapeError> {
        let end = body[start..]
            .find('"')
            .ok_or(ScrapeError::UnterminatedExportPath { offset: start })?;
        Ok(body[start..start + end].replace("\\/", "/"))
    });

    // Exactly two by the count check above.
    let stats = paths
        .next()
        .ok_or(ScrapeError::ExportMarkers { found: 0 })??;
    let budget = paths
        .next()
        .ok_or(ScrapeError::ExportMarkers { found: 1 })??;

    Ok((stats, budget))
}

/// Turn a relative export path into an absolute URL with `period=day` forced.
///
/// Any existing `period` parameter is replaced; all other query parameters
/// are preserved.
///
/// # Errors
///
/// Returns [`ScrapeError::InvalidExportUrl`] if the combined URL does not
/// parse.
pub(crate) fn export_url(origin: &str, path: &str) -> Result<String, ScrapeError> {
    let raw = format!("{}{path}", origin.trim_end_matches('/'));
    let mut url = reqwest::Url::parse(&raw).map_err(|e| ScrapeError::InvalidExportUrl {
        url: raw.clone(),
        reason: e.to_string(),
    })?;

    let params: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "period")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(params);
        pairs.append_pair("period", "day");
    }

    Ok(url.to_string())
}
