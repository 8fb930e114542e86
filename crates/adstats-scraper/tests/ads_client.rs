//! Integration tests for `AdsClient` against a wiremock server.
//!
//! Each test stands up a local HTTP server and points the client's origin at
//! it, so share links, the not-found check, export-link extraction, and the
//! TSV export pipeline are exercised end to end without real network traffic.

use rust_decimal::Decimal;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use adstats_scraper::{AdsClient, ScrapeError};

fn test_client(origin: &str) -> AdsClient {
    AdsClient::with_origin(5, "adstats-test/0.1", origin).expect("failed to build test AdsClient")
}

/// A structurally complete campaign page whose two export links point back
/// at the mock server.
fn campaign_page_body() -> &'static str {
    r#"<!DOCTYPE html>
<html><body>
  <div class="pr-review-ad-info-multi">
    <div class="pr-ad-info-value">Active</div>
  </div>
  <div class="pr-ad-info-value"><a href="https://t.me/example_channel">@example_channel</a></div>
  <div class="ad-msg-link-preview-desc">Try <b>Example</b> today</div>
  <div class="ad-msg-link-preview-btn">Open Channel</div>
  <script>
    var statsData = {"csvExport":"\/export\/stats?owner=1&period=hour","title":"Views"};
    var budgetData = {"csvExport":"\/export\/budget?owner=1","title":"Spend"};
  </script>
</body></html>"#
}

fn not_found_page_body() -> &'static str {
    r#"<html><head><meta property="og:title" content="Telegram Ads"></head>
<body>Campaign not found</body></html>"#
}

const STATS_TSV: &str =
    "Date\tViews\tClicks\tActions\n01 Jan 2025\t1,234\t56\t7\n02 Jan 2025\t100\t8\t1\n";
const BUDGET_TSV: &str = "Date\tSpent\tRemaining\n01 Jan 2025\t12,50\t87,50\n02 Jan 2025\t50.00\t37,50\n";

#[tokio::test]
async fn campaign_extracts_fields_and_export_urls() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stats/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(campaign_page_body()))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let campaign = client
        .campaign(&client.share_link("abc123"))
        .await
        .expect("structurally complete page extracts");

    assert_eq!(campaign.id, "abc123");
    assert_eq!(campaign.link, "https://t.me/example_channel");
    assert!(campaign.active);
    assert_eq!(campaign.text, "Try <b>Example</b> today");
    assert_eq!(campaign.button_text, "Open Channel");
    assert_eq!(
        campaign.stats_export_url,
        format!("{}/export/stats?owner=1&period=day", server.uri())
    );
    assert_eq!(
        campaign.budget_export_url,
        format!("{}/export/budget?owner=1&period=day", server.uri())
    );
}

#[tokio::test]
async fn campaign_not_found_marker_yields_typed_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stats/gone99"))
        .respond_with(ResponseTemplate::new(200).set_body_string(not_found_page_body()))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.campaign(&client.share_link("gone99")).await;

    assert!(
        matches!(result, Err(ScrapeError::CampaignNotFound { .. })),
        "expected CampaignNotFound, got: {result:?}"
    );
}

#[tokio::test]
async fn campaign_page_fetch_failure_is_an_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/stats/abc123"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.campaign(&client.share_link("abc123")).await;

    assert!(
        matches!(result, Err(ScrapeError::UnexpectedStatus { status: 503, .. })),
        "expected UnexpectedStatus(503), got: {result:?}"
    );
}

#[tokio::test]
async fn invalid_link_wins_over_page_drift() {
    let server = MockServer::start().await;

    // A live-looking page that is structurally broken: no not-found marker,
    // no click-through link element. The share link itself is also invalid
    // (trailing path segment), and that is the error that must surface.
    Mock::given(method("GET"))
        .and(path("/stats/abc123/extra"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><p>layout changed</p></body></html>"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .campaign(&format!("{}/stats/abc123/extra", server.uri()))
        .await;

    assert!(
        matches!(result, Err(ScrapeError::InvalidShareLink { .. })),
        "expected InvalidShareLink, got: {result:?}"
    );
}

#[tokio::test]
async fn page_with_one_export_marker_is_a_structure_error() {
    let server = MockServer::start().await;

    let drifted = r#"<html><body>
      <div class="pr-ad-info-value"><a href="https://t.me/x">x</a></div>
      <script>var statsData = {"csvExport":"\/export\/stats?owner=1"};</script>
    </body></html>"#;

    Mock::given(method("GET"))
        .and(path("/stats/abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(drifted))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client.campaign(&client.share_link("abc123")).await;

    assert!(
        matches!(result, Err(ScrapeError::ExportMarkers { found: 1 })),
        "expected ExportMarkers(1), got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_table_parses_tab_delimited_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/export/stats"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(STATS_TSV, "text/csv"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let rows = client
        .fetch_table(&format!("{}/export/stats", server.uri()))
        .await
        .expect("well-formed TSV parses");

    assert_eq!(rows.len(), 3, "header plus two data rows");
    assert_eq!(rows[0], vec!["Date", "Views", "Clicks", "Actions"]);
    assert_eq!(rows[1], vec!["01 Jan 2025", "1,234", "56", "7"]);
}

#[tokio::test]
async fn fetch_table_rejects_wrong_content_type() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/export/stats"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("<html>maintenance</html>", "text/html"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .fetch_table(&format!("{}/export/stats", server.uri()))
        .await;

    assert!(
        matches!(
            result,
            Err(ScrapeError::UnexpectedContentType { ref content_type, .. })
                if content_type == "text/html"
        ),
        "expected UnexpectedContentType, got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_table_rejects_non_success_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/export/stats"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .fetch_table(&format!("{}/export/stats", server.uri()))
        .await;

    assert!(
        matches!(result, Err(ScrapeError::UnexpectedStatus { status: 500, .. })),
        "expected UnexpectedStatus(500), got: {result:?}"
    );
}

#[tokio::test]
async fn fetch_table_surfaces_ragged_rows_as_parse_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/export/stats"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw("Date\tViews\n01 Jan 2025\t1\textra\n", "text/csv"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .fetch_table(&format!("{}/export/stats", server.uri()))
        .await;

    assert!(
        matches!(result, Err(ScrapeError::Table(_))),
        "expected Table parse error, got: {result:?}"
    );
}

#[tokio::test]
async fn daily_stats_runs_the_full_export_pipeline() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/export/stats"))
        .and(query_param("period", "day"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(STATS_TSV, "text/csv"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/export/budget"))
        .and(query_param("period", "day"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(BUDGET_TSV, "text/csv"),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let stats = client
        .daily_stats(
            &format!("{}/export/stats?owner=1&period=day", server.uri()),
            &format!("{}/export/budget?owner=1&period=day", server.uri()),
        )
        .await
        .expect("aligned exports reconcile");

    assert_eq!(stats.len(), 2);
    assert_eq!(stats[0].views, 1234);
    assert_eq!(stats[0].spend, Decimal::new(1250, 2));
    assert_eq!(stats[1].views, 100);
    assert_eq!(stats[1].spend, Decimal::new(5000, 2));
    assert_eq!(stats[1].cpm, Decimal::from(500));
}

#[tokio::test]
async fn daily_stats_fails_when_exports_misalign() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/export/stats"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(STATS_TSV, "text/csv"),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/export/budget"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(
                    "Date\tSpent\tRemaining\n03 Jan 2025\t12,50\t87,50\n04 Jan 2025\t1,00\t86,50\n",
                    "text/csv",
                ),
        )
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let result = client
        .daily_stats(
            &format!("{}/export/stats", server.uri()),
            &format!("{}/export/budget", server.uri()),
        )
        .await;

    assert!(
        matches!(result, Err(ScrapeError::DateMismatch { row: 0, .. })),
        "expected DateMismatch, got: {result:?}"
    );
}
