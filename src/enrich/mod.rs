// =============================================================================
// enrich/mod.rs — THE SECONDARY-SOURCE GRAVY TRAIN
// =============================================================================
//
// Reconciliation produces a correct-but-sparse record set. The three
// enrichers in here fill the gaps from secondary pages:
//
//   detail        — per-record company pages: listing date, lot size
//   subscription  — live multipliers for IPOs that are currently Open
//   gmp           — grey-market premium backfill from dedicated GMP pages
//
// Shared ground rules:
// - Every enricher is pure gravy. Any of them can fail wholesale and the
//   run still ships a correct (just thinner) record set.
// - They mutate a shared record set behind a lock, and the lock is held
//   only for field writes — never across an await. The fetches happen
//   outside; the writes are microseconds.
// - Fill-absent-only discipline: an enricher never overwrites a field the
//   reconciliation pass already populated.
// =============================================================================

pub mod detail;
pub mod gmp;
pub mod subscription;

use parking_lot::RwLock;
use std::sync::Arc;

use crate::models::IpoRecord;

/// The in-run record set the enrichers operate on. Indices are stable for
/// the whole enrichment phase — nothing inserts or removes between dedup
/// and the final strip.
pub type SharedRecords = Arc<RwLock<Vec<IpoRecord>>>;

/// Flatten a whole page into one space-normalized text blob. The detail
/// and subscription enrichers match prose sentences, not markup, so this
/// is their entire view of the page.
pub(crate) fn page_text(html: &str) -> String {
    let document = scraper::Html::parse_document(html);
    let raw: String = document
        .root_element()
        .text()
        .collect::<Vec<_>>()
        .join(" ");
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_text_flattens_markup() {
        let html = "<html><body><p>The IPO is <b>expected</b>\n to list   on</p><p>March 2, 2026.</p></body></html>";
        assert_eq!(page_text(html), "The IPO is expected to list on March 2, 2026.");
    }
}
