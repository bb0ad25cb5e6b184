// =============================================================================
// enrich/detail.rs — THE PROSE MINER
// =============================================================================
//
// Each primary-source row links to a per-company article, and buried in that
// article's prose are two facts the tables never print: the expected listing
// date ("...is expected to list on March 2, 2026") and the lot size ("the
// minimum market lot size is 130 shares"). No markup to anchor on, just
// sentence templates that have held stable for years. We mine them with two
// regexes and a cheap substring pre-check so the regex engine never runs on
// a page that obviously lacks the sentence.
//
// Candidates: Upcoming or Open records that carry a detail link and are
// still missing at least one of the two fields. Listed and Closed records
// have nothing to gain here. Fetches run concurrently with the short
// timeout — there can be dozens of these pages and they are pure gravy.
// =============================================================================

use chrono::NaiveDate;
use futures::future::join_all;
use memchr::memmem;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

use crate::enrich::{page_text, SharedRecords};
use crate::fetch::PageFetcher;
use crate::models::IpoStatus;
use crate::normalize::parse_long_date;
use crate::stats::RunStats;

// "…is expected to list on the exchanges on March 2, 2026." — anything may
// sit between "to list" and "on", as long as the sentence doesn't end first.
static LISTING_SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)to list\b[^.]*?\bon\s+([A-Za-z]{3,9} \d{1,2}, \d{4})").unwrap()
});

// "The minimum market lot size is 130 shares" / "lot is 1,000 shares".
static LOT_SENTENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:minimum market )?lot (?:size )?is ([\d,]+)\s*shares").unwrap()
});

/// Pull the expected listing date out of page prose, if the sentence is
/// there. The date itself rides through the long-form date parser, so a
/// malformed capture degrades to absent like everything else.
pub(crate) fn extract_listing_date(text: &str) -> Option<NaiveDate> {
    // Substring gate before the regex engine warms up. The regex is
    // case-insensitive, so the gate tolerates both cases too.
    if memmem::find(text.as_bytes(), b"list").is_none()
        && memmem::find(text.as_bytes(), b"List").is_none()
    {
        return None;
    }
    let caps = LISTING_SENTENCE.captures(text)?;
    parse_long_date(&caps[1])
}

/// Pull the lot size out of page prose. Thousands separators tolerated,
/// zero rejected — a lot of zero shares is a typo, not an offering.
pub(crate) fn extract_lot_size(text: &str) -> Option<u32> {
    if memmem::find(text.as_bytes(), b"lot").is_none()
        && memmem::find(text.as_bytes(), b"Lot").is_none()
    {
        return None;
    }
    let caps = LOT_SENTENCE.captures(text)?;
    let digits: String = caps[1].chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u32>().ok().filter(|n| *n > 0)
}

/// Fetch every candidate's detail page concurrently and fill whichever of
/// the two fields each page can supply. Per-record failures are logged and
/// skipped; the batch never notices.
pub async fn enrich_all(records: &SharedRecords, fetcher: &PageFetcher, stats: &RunStats) {
    let candidates: Vec<(usize, String)> = {
        let guard = records.read();
        guard
            .iter()
            .enumerate()
            .filter(|(_, r)| matches!(r.status, IpoStatus::Upcoming | IpoStatus::Open))
            .filter(|(_, r)| r.listing_date.is_none() || r.lot_size.is_none())
            .filter_map(|(i, r)| r.detail_url.clone().map(|url| (i, url)))
            .collect()
    };
    if candidates.is_empty() {
        debug!("no detail enrichment candidates this run");
        return;
    }
    info!(candidates = candidates.len(), "detail enrichment starting");

    let tasks = candidates.into_iter().map(|(idx, url)| {
        let records = Arc::clone(records);
        async move {
            let Some(body) = fetcher.fetch_page_soft(&url).await else {
                stats.page_failed();
                return;
            };
            stats.page_fetched();

            let text = page_text(&body);
            let listing_date = extract_listing_date(&text);
            let lot_size = extract_lot_size(&text);
            if listing_date.is_none() && lot_size.is_none() {
                debug!(url = %url, "detail page had neither sentence");
                return;
            }

            let mut guard = records.write();
            let Some(record) = guard.get_mut(idx) else {
                return;
            };
            let mut touched = false;
            if record.listing_date.is_none() && listing_date.is_some() {
                record.listing_date = listing_date;
                touched = true;
            }
            if record.lot_size.is_none() && lot_size.is_some() {
                record.lot_size = lot_size;
                touched = true;
            }
            if touched {
                debug!(slug = %record.slug, ?listing_date, ?lot_size, "detail fields filled");
                stats.detail_enriched();
            }
        }
    });
    join_all(tasks).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_listing_date_from_prose() {
        // Detail pages mostly spell the month out; some abbreviate.
        let text = "Gaudium IVF is expected to list on the BSE and NSE on March 2, 2026. Stay tuned.";
        assert_eq!(extract_listing_date(text), Some(d(2026, 3, 2)));
        let text = "The shares are set to list on Mar 2, 2026.";
        assert_eq!(extract_listing_date(text), Some(d(2026, 3, 2)));
    }

    #[test]
    fn test_listing_sentence_in_headline_case() {
        // Webmasters love Title Case; the gate and regex both tolerate it.
        let text = "The Shares Are Expected To List on June 15, 2026.";
        assert_eq!(extract_listing_date(text), Some(d(2026, 6, 15)));
    }

    #[test]
    fn test_listing_date_stops_at_sentence_end() {
        // The "on <date>" lives in the NEXT sentence; no match.
        let text = "The company plans to list soon. More details on March 2, 2026 follow.";
        assert_eq!(extract_listing_date(text), None);
    }

    #[test]
    fn test_lot_size_variants() {
        assert_eq!(
            extract_lot_size("The minimum market lot size is 130 shares per application."),
            Some(130)
        );
        assert_eq!(extract_lot_size("the lot is 1,000 shares"), Some(1000));
        assert_eq!(extract_lot_size("Lot size is 40 shares."), Some(40));
    }

    #[test]
    fn test_lot_size_rejects_zero_and_absence() {
        assert_eq!(extract_lot_size("lot size is 0 shares"), None);
        assert_eq!(extract_lot_size("a page about something else entirely"), None);
    }

    #[tokio::test]
    async fn test_enrich_all_fills_only_absent_fields() {
        use crate::models::{IpoRecord, IpoType};
        use parking_lot::RwLock;
        use std::time::Duration;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/acme-ipo/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<html><body><p>Acme is expected to list on the exchanges on March 2, 2026. \
                 The minimum market lot size is 130 shares.</p></body></html>",
            ))
            .mount(&server)
            .await;

        let mut r = IpoRecord::new("Acme", IpoType::Mainboard, IpoStatus::Upcoming);
        r.lot_size = Some(99); // already known from a better source
        r.detail_url = Some(format!("{}/acme-ipo/", server.uri()));
        let records: SharedRecords = Arc::new(RwLock::new(vec![r]));

        let fetcher = PageFetcher::new(Duration::from_secs(5)).unwrap();
        let stats = RunStats::new();
        enrich_all(&records, &fetcher, &stats).await;

        let guard = records.read();
        assert_eq!(guard[0].listing_date, Some(d(2026, 3, 2)));
        assert_eq!(guard[0].lot_size, Some(99)); // never overwritten
        assert_eq!(stats.snapshot().details_enriched, 1);
    }

    #[tokio::test]
    async fn test_one_dead_page_does_not_block_the_rest() {
        use crate::models::{IpoRecord, IpoType};
        use parking_lot::RwLock;
        use std::time::Duration;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/dead-ipo/"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/alive-ipo/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<p>The minimum market lot size is 40 shares.</p>",
            ))
            .mount(&server)
            .await;

        let mut dead = IpoRecord::new("Dead Co", IpoType::Mainboard, IpoStatus::Upcoming);
        dead.detail_url = Some(format!("{}/dead-ipo/", server.uri()));
        let mut alive = IpoRecord::new("Alive Co", IpoType::Sme, IpoStatus::Upcoming);
        alive.detail_url = Some(format!("{}/alive-ipo/", server.uri()));
        let records: SharedRecords = Arc::new(RwLock::new(vec![dead, alive]));

        let fetcher = PageFetcher::new(Duration::from_secs(5)).unwrap();
        let stats = RunStats::new();
        enrich_all(&records, &fetcher, &stats).await;

        let guard = records.read();
        assert_eq!(guard[0].lot_size, None);
        assert_eq!(guard[1].lot_size, Some(40));
        let snap = stats.snapshot();
        assert_eq!(snap.page_failures, 1);
        assert_eq!(snap.details_enriched, 1);
    }

    #[tokio::test]
    async fn test_one_timed_out_page_does_not_block_the_rest() {
        use crate::models::{IpoRecord, IpoType};
        use parking_lot::RwLock;
        use std::time::Duration;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        // Answers eventually — but well past our patience budget.
        Mock::given(method("GET"))
            .and(path("/glacial-ipo/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<p>The minimum market lot size is 10 shares.</p>")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/brisk-ipo/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                "<p>The minimum market lot size is 40 shares.</p>",
            ))
            .mount(&server)
            .await;

        let mut glacial = IpoRecord::new("Glacial Co", IpoType::Mainboard, IpoStatus::Upcoming);
        glacial.detail_url = Some(format!("{}/glacial-ipo/", server.uri()));
        let mut brisk = IpoRecord::new("Brisk Co", IpoType::Sme, IpoStatus::Upcoming);
        brisk.detail_url = Some(format!("{}/brisk-ipo/", server.uri()));
        let records: SharedRecords = Arc::new(RwLock::new(vec![glacial, brisk]));

        let fetcher = PageFetcher::new(Duration::from_secs(1)).unwrap();
        let stats = RunStats::new();
        enrich_all(&records, &fetcher, &stats).await;

        let guard = records.read();
        assert_eq!(guard[0].lot_size, None); // the clock ran out on it
        assert_eq!(guard[1].lot_size, Some(40));
        let snap = stats.snapshot();
        assert_eq!(snap.page_failures, 1);
        assert_eq!(snap.details_enriched, 1);
    }
}
