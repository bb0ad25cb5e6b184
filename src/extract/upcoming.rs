// =============================================================================
// extract/upcoming.rs — THE CRYSTAL BALL TABLES
// =============================================================================
//
// The upcoming page stacks two four-column tables (Mainboard and SME) on a
// single document: company, a compact year-less date range, issue size,
// price band. No GMP, no listing data — those IPOs haven't earned them yet.
//
// The year-less dates are the fun part: "25-27 Feb" printed in late December
// may mean this February or the next one, and the normalizer's 60-day rule
// decides. We pass `today` down so the decision is testable instead of
// cosmic.
// =============================================================================

use chrono::{DateTime, Utc};
use scraper::Html;
use tracing::debug;

use crate::extract::{cell_text, first_link, row_cells, table_rows};
use crate::models::{IpoRecord, IpoType};
use crate::normalize::{parse_issue_size, parse_price_band, parse_short_date_range};
use crate::stats::RunStats;
use crate::status::status_at;

/// Column map for an upcoming-IPOs table. Rows may trail extra cells
/// (platform badges, apply links); we only require the first four.
#[derive(Debug, Clone, Copy)]
pub struct UpcomingTableShape {
    pub table_id: &'static str,
    pub min_columns: usize,
    pub col_company: usize,
    pub col_date_range: usize,
    pub col_issue_size: usize,
    pub col_price_band: usize,
}

const UPCOMING_SHAPE: UpcomingTableShape = UpcomingTableShape {
    table_id: "",
    min_columns: 4,
    col_company: 0,
    col_date_range: 1,
    col_issue_size: 2,
    col_price_band: 3,
};

/// Mainboard upcoming table.
pub const MAINBOARD_UPCOMING: UpcomingTableShape = UpcomingTableShape {
    table_id: "tablepress-22",
    ..UPCOMING_SHAPE
};

/// SME upcoming table, on the same page.
pub const SME_UPCOMING: UpcomingTableShape = UpcomingTableShape {
    table_id: "tablepress-23",
    ..UPCOMING_SHAPE
};

/// Walk the identified table and emit one record per usable row. Both
/// upcoming tables live on one page, so callers parse once and run this
/// twice with different shapes.
pub fn extract(
    document: &Html,
    shape: &UpcomingTableShape,
    ipo_type: IpoType,
    page_url: &str,
    now: DateTime<Utc>,
    stats: &RunStats,
) -> Vec<IpoRecord> {
    let today = now.date_naive();
    let mut records = Vec::new();

    for row in table_rows(document, shape.table_id) {
        let cells = row_cells(&row);
        if cells.len() < shape.min_columns {
            debug!(
                table_id = shape.table_id,
                cells = cells.len(),
                "row has too few cells — skipped"
            );
            stats.row_skipped();
            continue;
        }

        let company_name = cell_text(cells[shape.col_company]);
        if company_name.is_empty() {
            debug!(table_id = shape.table_id, "row has empty name cell — skipped");
            stats.row_skipped();
            continue;
        }

        let range = parse_short_date_range(&cell_text(cells[shape.col_date_range]), today);
        let status = status_at(range.open, range.close, None, now);

        let mut record = IpoRecord::new(company_name, ipo_type, status);
        record.detail_url = first_link(cells[shape.col_company], page_url);
        record.open_date = range.open;
        record.close_date = range.close;
        record.issue_size = parse_issue_size(&cell_text(cells[shape.col_issue_size]));
        let (low, high) = parse_price_band(&cell_text(cells[shape.col_price_band]));
        record.price_band_low = low;
        record.price_band_high = high;

        stats.row_extracted();
        records.push(record);
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IpoStatus;
    use chrono::{NaiveDate, TimeZone};

    fn now() -> DateTime<Utc> {
        // Feb 20, noon UTC — between the cutovers, nothing ambiguous.
        Utc.with_ymd_and_hms(2026, 2, 20, 12, 0, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn page() -> Html {
        Html::parse_document(
            r#"<html><body>
            <table id="tablepress-22"><tbody>
                <tr>
                    <td><a href="https://www.ipowatch.in/gaudium-ipo/">Gaudium IVF</a></td>
                    <td>25-27 Feb</td><td>₹120 Cr.</td><td>₹95 to ₹100</td>
                </tr>
                <tr><td>Too Short</td><td>25-27 Feb</td></tr>
            </tbody></table>
            <table id="tablepress-23"><tbody>
                <tr>
                    <td>Shree Ram Twistex</td>
                    <td>28 Feb-03 Mar</td><td>₹40 Cr</td><td>₹114</td>
                </tr>
            </tbody></table>
            </body></html>"#,
        )
    }

    #[test]
    fn test_mainboard_table_only_reads_its_own_rows() {
        let doc = page();
        let stats = RunStats::new();
        let records = extract(&doc, &MAINBOARD_UPCOMING, IpoType::Mainboard, "https://x.test/", now(), &stats);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.company_name, "Gaudium IVF");
        assert_eq!(r.open_date, Some(d(2026, 2, 25)));
        assert_eq!(r.close_date, Some(d(2026, 2, 27)));
        assert_eq!(r.status, IpoStatus::Upcoming);
        assert_eq!(r.issue_size.as_deref(), Some("₹120 Cr"));
        assert_eq!(stats.snapshot().rows_skipped, 1);
    }

    #[test]
    fn test_sme_table_cross_month_range() {
        let doc = page();
        let stats = RunStats::new();
        let records = extract(&doc, &SME_UPCOMING, IpoType::Sme, "https://x.test/", now(), &stats);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.ipo_type, IpoType::Sme);
        assert_eq!(r.open_date, Some(d(2026, 2, 28)));
        assert_eq!(r.close_date, Some(d(2026, 3, 3)));
        assert_eq!(r.price_band_low, Some(114.0));
        assert_eq!(r.detail_url, None);
    }

    #[test]
    fn test_status_open_when_past_open_cutover() {
        let doc = Html::parse_document(
            r#"<table id="tablepress-22"><tbody>
                <tr><td>Live Co</td><td>19-23 Feb</td><td>-</td><td>₹50</td></tr>
            </tbody></table>"#,
        );
        let stats = RunStats::new();
        let records = extract(&doc, &MAINBOARD_UPCOMING, IpoType::Mainboard, "https://x.test/", now(), &stats);
        assert_eq!(records[0].status, IpoStatus::Open);
    }
}
