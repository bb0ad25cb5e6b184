// ═══════════════════════════════════════════════════════════════
// RUN STATS - Because if you can't measure it, it didn't happen
// ═══════════════════════════════════════════════════════════════
//
// Atomic counters for everything a single pipeline run does. Lock-free
// because the enrichers increment these from concurrent tasks and we're
// THAT paranoid about contention over a dozen integers.
//
// The snapshot rides out in the run diagnostics, so the caller can see
// exactly how much of the run was signal and how much was websites
// letting us down.

use portable_atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Serialize};

/// Thread-safe atomic counters for one run.
/// Every counter is atomic because mutexes are for the weak.
#[derive(Debug, Default)]
pub struct RunStats {
    pages_fetched: AtomicU64,
    page_failures: AtomicU64,
    rows_extracted: AtomicU64,
    rows_skipped: AtomicU64,
    exact_merges: AtomicU64,
    fuzzy_merges: AtomicU64,
    details_enriched: AtomicU64,
    subscriptions_enriched: AtomicU64,
    gmp_backfilled: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page_fetched(&self) {
        self.pages_fetched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn page_failed(&self) {
        self.page_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn row_extracted(&self) {
        self.rows_extracted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn row_skipped(&self) {
        self.rows_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn exact_merge(&self) {
        self.exact_merges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fuzzy_merge(&self) {
        self.fuzzy_merges.fetch_add(1, Ordering::Relaxed);
    }

    pub fn detail_enriched(&self) {
        self.details_enriched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn subscription_enriched(&self) {
        self.subscriptions_enriched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn gmp_backfill(&self) {
        self.gmp_backfilled.fetch_add(1, Ordering::Relaxed);
    }

    /// Take a snapshot of all counters (lock-free reads).
    pub fn snapshot(&self) -> RunStatsSnapshot {
        RunStatsSnapshot {
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            page_failures: self.page_failures.load(Ordering::Relaxed),
            rows_extracted: self.rows_extracted.load(Ordering::Relaxed),
            rows_skipped: self.rows_skipped.load(Ordering::Relaxed),
            exact_merges: self.exact_merges.load(Ordering::Relaxed),
            fuzzy_merges: self.fuzzy_merges.load(Ordering::Relaxed),
            details_enriched: self.details_enriched.load(Ordering::Relaxed),
            subscriptions_enriched: self.subscriptions_enriched.load(Ordering::Relaxed),
            gmp_backfilled: self.gmp_backfilled.load(Ordering::Relaxed),
        }
    }
}

/// The serializable point-in-time view that goes into diagnostics.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStatsSnapshot {
    pub pages_fetched: u64,
    pub page_failures: u64,
    pub rows_extracted: u64,
    pub rows_skipped: u64,
    pub exact_merges: u64,
    pub fuzzy_merges: u64,
    pub details_enriched: u64,
    pub subscriptions_enriched: u64,
    pub gmp_backfilled: u64,
}
