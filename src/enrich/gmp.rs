// =============================================================================
// enrich/gmp.rs — THE GREY MARKET WIRE TAP
// =============================================================================
//
// The primary tables print a GMP column, but it goes stale fast; a pair of
// dedicated GMP pages update through the day. This enricher backfills the
// premium for records that still lack one, from those pages, in configured
// priority order — the first page to report a number for a record wins and
// later pages never overwrite it.
//
// The GMP pages share no identifier with us, not even a clean company name.
// What they do print, reliably, is the close date as a compact "24-Feb"
// token in a known column. So the join key is the close date: harvest a
// date → premium map per page, then hand premiums to every non-Listed
// record whose close date matches and whose gmp is still absent. Listed
// records are past caring; their premium history is already frozen.
// =============================================================================

use chrono::{Datelike, DateTime, NaiveDate, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

use crate::enrich::SharedRecords;
use crate::extract::{cell_text, row_cells};
use crate::fetch::PageFetcher;
use crate::models::IpoStatus;
use crate::normalize::month_number;
use crate::stats::RunStats;

// GMP cell looks like "₹8.5 (10.76%)" — we want the signed amount only.
static GMP_CELL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"₹\s*(-?[\d.]+)").unwrap());

// Column positions on the GMP pages. Rows with fewer cells are decoration.
const MIN_CELLS: usize = 9;
const COL_GMP: usize = 1;
const COL_CLOSE: usize = 8;

/// Parse the compact close token, e.g. "24-Feb", against a known year.
/// These pages only ever show the current window, so the run's year is
/// the right one.
pub(crate) fn parse_close_token(raw: &str, year: i32) -> Option<NaiveDate> {
    let (day, month) = raw.trim().split_once('-')?;
    let day: u32 = day.trim().parse().ok()?;
    let month = month_number(month.trim())?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Harvest a close-date → premium map from one GMP page. A zero premium is
/// dropped here for the same reason parse_gmp drops it: the page prints 0
/// for "no signal" too.
pub(crate) fn harvest(html: &str, year: i32) -> HashMap<NaiveDate, f64> {
    let document = Html::parse_document(html);
    // Static selector; cannot fail to parse.
    let tr = Selector::parse("table tr").expect("static selector");
    let mut premiums = HashMap::new();

    for row in document.select(&tr) {
        let cells = row_cells(&row);
        if cells.len() < MIN_CELLS {
            continue;
        }
        let Some(close) = parse_close_token(&cell_text(cells[COL_CLOSE]), year) else {
            continue;
        };
        let gmp_text = cell_text(cells[COL_GMP]);
        let Some(caps) = GMP_CELL.captures(&gmp_text) else {
            continue;
        };
        let Ok(amount) = caps[1].parse::<f64>() else {
            continue;
        };
        if !amount.is_finite() || amount == 0.0 {
            continue;
        }
        // First row per close date wins within a page too.
        premiums.entry(close).or_insert(amount);
    }
    premiums
}

/// True while at least one record could still take a premium.
fn has_open_candidates(records: &SharedRecords) -> bool {
    records
        .read()
        .iter()
        .any(|r| r.status != IpoStatus::Listed && r.gmp.is_none() && r.close_date.is_some())
}

/// Fetch the configured GMP pages in priority order and backfill premiums
/// into whatever gaps remain. Stops early once nothing is left to fill.
pub async fn enrich_all(
    records: &SharedRecords,
    fetcher: &PageFetcher,
    urls: &[String],
    now: DateTime<Utc>,
    stats: &RunStats,
) {
    if !has_open_candidates(records) {
        debug!("no gmp backfill candidates this run");
        return;
    }
    let year = now.year();

    for url in urls {
        let Some(body) = fetcher.fetch_page_soft(url).await else {
            stats.page_failed();
            continue;
        };
        stats.page_fetched();

        let premiums = harvest(&body, year);
        if premiums.is_empty() {
            warn!(url = %url, "gmp page yielded no usable rows");
            continue;
        }

        let mut filled = 0usize;
        {
            let mut guard = records.write();
            for record in guard.iter_mut() {
                if record.status == IpoStatus::Listed || record.gmp.is_some() {
                    continue;
                }
                let Some(close) = record.close_date else {
                    continue;
                };
                if let Some(amount) = premiums.get(&close) {
                    record.gmp = Some(*amount);
                    stats.gmp_backfill();
                    filled += 1;
                }
            }
        }
        info!(url = %url, rows = premiums.len(), filled, "gmp backfill pass complete");

        if !has_open_candidates(records) {
            break;
        }
    }
}
