// =============================================================================
// extract/listed.rs — THE POST-MORTEM TABLES
// =============================================================================
//
// The "listed" tables cover IPOs that have been through the whole lifecycle
// (or are most of the way there): full long-form dates, a grey-market
// premium column, and — for the ones that actually listed — a listing price
// and gain. One table for Mainboard, one for SME, same eight-column shape,
// different table ids.
//
// A populated listing price is a stronger signal than date arithmetic: the
// exchange does not print a price for a company that isn't trading. So this
// extractor declares Listed on that evidence directly and only falls back
// to the classifier when the price cell is empty.
// =============================================================================

use chrono::{DateTime, Utc};
use scraper::Html;
use tracing::debug;

use crate::extract::{cell_text, first_link, row_cells, table_rows};
use crate::models::{IpoRecord, IpoStatus, IpoType};
use crate::normalize::{
    parse_gmp, parse_issue_size, parse_long_date, parse_percent, parse_price, parse_price_band,
};
use crate::stats::RunStats;
use crate::status::status_at;

/// Column map for a listed-IPOs table. Hand-verified against the live page;
/// update here (and only here) when the source reshuffles.
#[derive(Debug, Clone, Copy)]
pub struct ListedTableShape {
    pub table_id: &'static str,
    pub min_columns: usize,
    pub col_company: usize,
    pub col_open_date: usize,
    pub col_close_date: usize,
    pub col_issue_size: usize,
    pub col_price_band: usize,
    pub col_gmp: usize,
    pub col_listing_price: usize,
    pub col_listing_gain: usize,
}

const LISTED_SHAPE: ListedTableShape = ListedTableShape {
    table_id: "",
    min_columns: 8,
    col_company: 0,
    col_open_date: 1,
    col_close_date: 2,
    col_issue_size: 3,
    col_price_band: 4,
    col_gmp: 5,
    col_listing_price: 6,
    col_listing_gain: 7,
};

/// Mainboard listed table on the mainboard page.
pub const MAINBOARD_LISTED: ListedTableShape = ListedTableShape {
    table_id: "tablepress-17",
    ..LISTED_SHAPE
};

/// SME listed table on the SME page. Same shape, different id.
pub const SME_LISTED: ListedTableShape = ListedTableShape {
    table_id: "tablepress-18",
    ..LISTED_SHAPE
};

/// Walk the identified table and emit one record per usable row.
pub fn extract(
    html: &str,
    shape: &ListedTableShape,
    ipo_type: IpoType,
    page_url: &str,
    now: DateTime<Utc>,
    stats: &RunStats,
) -> Vec<IpoRecord> {
    let document = Html::parse_document(html);
    let mut records = Vec::new();

    for row in table_rows(&document, shape.table_id) {
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

        let open_date = parse_long_date(&cell_text(cells[shape.col_open_date]));
        let close_date = parse_long_date(&cell_text(cells[shape.col_close_date]));
        let listing_price = parse_price(&cell_text(cells[shape.col_listing_price]));

        // Listing price trumps the calendar: the exchange has spoken.
        let status = if listing_price.is_some() {
            IpoStatus::Listed
        } else {
            status_at(open_date, close_date, None, now)
        };

        let mut record = IpoRecord::new(company_name, ipo_type, status);
        record.detail_url = first_link(cells[shape.col_company], page_url);
        record.open_date = open_date;
        record.close_date = close_date;
        record.issue_size = parse_issue_size(&cell_text(cells[shape.col_issue_size]));
        let (low, high) = parse_price_band(&cell_text(cells[shape.col_price_band]));
        record.price_band_low = low;
        record.price_band_high = high;
        record.gmp = parse_gmp(&cell_text(cells[shape.col_gmp]));
        record.listing_price = listing_price;
        record.listing_gain_percent = parse_percent(&cell_text(cells[shape.col_listing_gain]));

        stats.row_extracted();
        records.push(record);
    }

    records
}
