//! Reconciliation of the stats and budget exports into per-day records.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;

use crate::error::ScrapeError;
use crate::types::DailyStat;

/// The platform's export date format, e.g. `"02 Jan 2006"`.
const DATE_FORMAT: &str = "%d %b %Y";

const STATS_MAX_COLUMNS: usize = 4;
const BUDGET_MAX_COLUMNS: usize = 3;

/// Merge a stats table and a budget table into ordered per-day records.
///
/// Both tables include their header as row 0. The stats table drives the
/// output: one record per data row, in table order (ascending date, as the
/// platform emits it). The budget table is aligned strictly by row index —
/// its date at index `i` must equal the stats date at index `i`, otherwise
/// the whole merge fails and nothing is returned.
///
/// An empty table (header only, or nothing at all) is not an error: empty
/// stats yield an empty result, and an empty budget leaves spend and CPM at
/// zero on every record.
///
/// # Errors
///
/// - [`ScrapeError::UnexpectedColumns`] when a non-empty table is wider than
///   the platform's schema (4 stats columns, 3 budget columns).
/// - [`ScrapeError::MissingColumn`] when a data row is narrower than the
///   columns read from it.
/// - [`ScrapeError::InvalidDate`] / [`ScrapeError::InvalidNumber`] /
///   [`ScrapeError::InvalidDecimal`] on unparseable cells.
/// - [`ScrapeError::DateMismatch`] / [`ScrapeError::BudgetRowOverrun`] when
///   the two tables do not align row for row.
pub fn reconcile(
    stats: &[Vec<String>],
    budget: &[Vec<String>],
) -> Result<Vec<DailyStat>, ScrapeError> {
    let mut records = Vec::new();

    if stats.len() > 1 {
        if stats[0].len() > STATS_MAX_COLUMNS {
            return Err(ScrapeError::UnexpectedColumns {
                table: "stats",
                found: stats[0].len(),
                max: STATS_MAX_COLUMNS,
            });
        }

        for (row_idx, row) in stats[1..].iter().enumerate() {
            let date = parse_date("stats", row, row_idx, 0)?;
            let views = parse_count(cell("stats", row, row_idx, 1)?, row_idx)?;
            let clicks = parse_count(cell("stats", row, row_idx, 2)?, row_idx)?;
            let actions = parse_count(cell("stats", row, row_idx, 3)?, row_idx)?;

            records.push(DailyStat {
                date,
                views,
                clicks,
                actions,
                spend: Decimal::ZERO,
                cpm: Decimal::ZERO,
            });
        }
    }

    if budget.len() > 1 {
        if budget[0].len() > BUDGET_MAX_COLUMNS {
            return Err(ScrapeError::UnexpectedColumns {
                table: "budget",
                found: budget[0].len(),
                max: BUDGET_MAX_COLUMNS,
            });
        }

        for (row_idx, row) in budget[1..].iter().enumerate() {
            let date = parse_date("budget", row, row_idx, 0)?;

            let record = records
                .get_mut(row_idx)
                .ok_or(ScrapeError::BudgetRowOverrun { row: row_idx })?;
            if record.date != date {
                return Err(ScrapeError::DateMismatch {
                    row: row_idx,
                    stats_date: record.date,
                    budget_date: date,
                });
            }

            let raw_spend = cell("budget", row, row_idx, 1)?;
            // Locale normalization: the platform emits a comma decimal mark.
            let normalized = raw_spend.replace(',', ".");
            record.spend =
                Decimal::from_str(&normalized).map_err(|_| ScrapeError::InvalidDecimal {
                    row: row_idx,
                    value: raw_spend.to_owned(),
                })?;

            // CPM with divisor substitution: a zero-view day divides by 1,
            // yielding spend * 1000 rather than a special-cased zero.
            let divisor = if record.views > 0 {
                Decimal::from(record.views)
            } else {
                Decimal::ONE
            };
            record.cpm = record.spend * Decimal::ONE_THOUSAND / divisor;
        }
    }

    Ok(records)
}

fn cell<'a>(
    table: &'static str,
    row: &'a [String],
    row_idx: usize,
    column: usize,
) -> Result<&'a str, ScrapeError> {
    row.get(column)
        .map(String::as_str)
        .ok_or(ScrapeError::MissingColumn {
            table,
            row: row_idx,
            column,
        })
}

fn parse_date(
    table: &'static str,
    row: &[String],
    row_idx: usize,
    column: usize,
) -> Result<NaiveDate, ScrapeError> {
    let value = cell(table, row, row_idx, column)?;
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| ScrapeError::InvalidDate {
        table,
        row: row_idx,
        value: value.to_owned(),
    })
}

/// Parse an integer cell after stripping every non-digit character, so
/// `"1,234"` parses to 1234. A cell with no digits at all is an error.
fn parse_count(value: &str, row_idx: usize) -> Result<i64, ScrapeError> {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<i64>().map_err(|_| ScrapeError::InvalidNumber {
        row: row_idx,
        value: value.to_owned(),
    })
}
