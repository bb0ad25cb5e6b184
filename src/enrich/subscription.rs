// =============================================================================
// enrich/subscription.rs — THE OVERSUBSCRIPTION TELEGRAPH
// =============================================================================
//
// While an IPO is Open, one secondary source publishes live subscription
// multipliers per investor category, phrased in a sentence template that has
// survived every redesign of their site: "...subscribed 12.41 times",
// "4.87 times in the retail category", "2.10 times in the QIB", and so on.
//
// The catch: their URLs embed a numeric id we cannot derive, so candidates
// are resolved through the hand-curated lookup table (see lookup.rs) by
// exact close date, with a name-hint tiebreak for same-day closers. A record
// the table doesn't know about simply goes without multipliers this run —
// that's a data-entry chore, not a failure.
//
// Candidates are exactly the Open records with a close date. Closed IPOs'
// final multipliers stay frozen in storage from the runs that observed them;
// we don't re-fetch history.
// =============================================================================

use futures::future::join_all;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::{debug, info};

use crate::enrich::{page_text, SharedRecords};
use crate::fetch::PageFetcher;
use crate::lookup::SubscriptionLookup;
use crate::models::IpoStatus;
use crate::stats::RunStats;

static TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)subscribed ([\d.]+) times").unwrap());
static RETAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d.]+) times in the retail").unwrap());
static QIB: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d.]+) times in(?: the)? QIB").unwrap());
static NII: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)([\d.]+) times in the NII").unwrap());

/// The four multipliers a subscription page may yield. Any subset can be
/// present; the page publishes categories as the data comes in.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct SubscriptionFigures {
    pub total: Option<f64>,
    pub retail: Option<f64>,
    pub nii: Option<f64>,
    pub qib: Option<f64>,
}

impl SubscriptionFigures {
    fn is_empty(&self) -> bool {
        self.total.is_none() && self.retail.is_none() && self.nii.is_none() && self.qib.is_none()
    }
}

fn first_multiplier(re: &Regex, text: &str) -> Option<f64> {
    let caps = re.captures(text)?;
    caps[1]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v >= 0.0)
}

/// Mine the four sentence templates out of page prose.
pub(crate) fn extract_figures(text: &str) -> SubscriptionFigures {
    SubscriptionFigures {
        total: first_multiplier(&TOTAL, text),
        retail: first_multiplier(&RETAIL, text),
        nii: first_multiplier(&NII, text),
        qib: first_multiplier(&QIB, text),
    }
}

/// Resolve and fetch a subscription page for every Open record the lookup
/// table knows about, concurrently, and write whatever figures came back.
pub async fn enrich_all(
    records: &SharedRecords,
    fetcher: &PageFetcher,
    lookup: &SubscriptionLookup,
    base_url: &str,
    stats: &RunStats,
) {
    if lookup.is_empty() {
        info!("subscription lookup table is empty — enrichment skipped");
        return;
    }

    let candidates: Vec<(usize, String)> = {
        let guard = records.read();
        guard
            .iter()
            .enumerate()
            .filter(|(_, r)| r.status == IpoStatus::Open)
            .filter_map(|(i, r)| {
                let close = r.close_date?;
                let entry = lookup.resolve(close, &r.company_name)?;
                Some((i, lookup.page_url(base_url, entry)))
            })
            .collect()
    };
    if candidates.is_empty() {
        debug!("no subscription enrichment candidates this run");
        return;
    }
    info!(candidates = candidates.len(), "subscription enrichment starting");

    let tasks = candidates.into_iter().map(|(idx, url)| {
        let records = Arc::clone(records);
        async move {
            let Some(body) = fetcher.fetch_page_soft(&url).await else {
                stats.page_failed();
                return;
            };
            stats.page_fetched();

            let figures = extract_figures(&page_text(&body));
            if figures.is_empty() {
                debug!(url = %url, "subscription page yielded no figures");
                return;
            }

            let mut guard = records.write();
            let Some(record) = guard.get_mut(idx) else {
                return;
            };
            if figures.total.is_some() {
                record.subscription_total = figures.total;
            }
            if figures.retail.is_some() {
                record.subscription_retail = figures.retail;
            }
            if figures.nii.is_some() {
                record.subscription_nii = figures.nii;
            }
            if figures.qib.is_some() {
                record.subscription_qib = figures.qib;
            }
            debug!(slug = %record.slug, ?figures, "subscription figures written");
            stats.subscription_enriched();
        }
    });
    join_all(tasks).await;
}
