// =============================================================================
// pipeline.rs — THE GRAND RECONCILIATION CONDUCTOR
// =============================================================================
//
// One run, start to finish:
//
//   fetch 3 primary pages (concurrently, politely, fatalistically)
//     → extract rows per table, in fixed source-priority order
//     → exact dedup → fuzzy dedup
//     → detail enrichment (needs the settled candidate set)
//     → subscription ∥ gmp enrichment (disjoint fields, spawned tasks)
//     → strip internal fields → PipelineOutcome
//
// The headline contract: run() NEVER returns Err. A pipeline that throws
// teaches its caller to wrap it in a try/catch and ignore the details; a
// pipeline that always returns records-plus-diagnostics teaches its caller
// to read the diagnostics. Partial source failures are line items; a total
// meltdown is an empty record set with `failed = true`, and the caller's
// standing orders are "zero records means skip the run, not wipe the data."
// =============================================================================

use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use scraper::Html;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::dedup::{dedup_by_slug, fuzzy_dedup_by_prefix};
use crate::enrich::{self, SharedRecords};
use crate::extract::listed::{self, MAINBOARD_LISTED, SME_LISTED};
use crate::extract::upcoming::{self, MAINBOARD_UPCOMING, SME_UPCOMING};
use crate::fetch::PageFetcher;
use crate::lookup::SubscriptionLookup;
use crate::models::{IpoRecord, IpoType, PipelineOutcome, RunDiagnostics, SourceFailure};
use crate::stats::RunStats;

/// The conductor. Construct once, run per schedule tick.
pub struct Pipeline {
    config: Config,
    lookup: SubscriptionLookup,
}

impl Pipeline {
    /// Build a pipeline from configuration. A missing or malformed lookup
    /// table costs us subscription enrichment, not the run — it loads as
    /// empty with a warning and life goes on.
    pub fn new(config: Config) -> Self {
        let lookup = match SubscriptionLookup::load_from_file(&config.subscription_lookup_path) {
            Ok(lookup) => lookup,
            Err(e) => {
                warn!(error = %e, "subscription lookup unavailable — enrichment will be skipped");
                SubscriptionLookup::default()
            }
        };
        Self { config, lookup }
    }

    /// For tests: a pipeline with an explicitly supplied lookup table.
    pub fn with_lookup(config: Config, lookup: SubscriptionLookup) -> Self {
        Self { config, lookup }
    }

    /// Execute one full reconciliation run. Infallible by contract.
    pub async fn run(&self) -> PipelineOutcome {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let stats = Arc::new(RunStats::new());
        let mut source_failures = Vec::new();
        info!(%run_id, "reconciliation run starting");

        let records = match self
            .run_inner(started_at, &stats, &mut source_failures)
            .await
        {
            Ok(records) => records,
            Err(e) => {
                error!(%run_id, error = %e, "run failed wholesale — degrading to empty record set");
                let diagnostics = RunDiagnostics {
                    run_id,
                    started_at,
                    failed: true,
                    source_failures,
                    stale_cleanup_hints: Vec::new(),
                    stats: stats.snapshot(),
                };
                return PipelineOutcome {
                    records: Vec::new(),
                    diagnostics,
                };
            }
        };

        let snapshot = stats.snapshot();
        info!(
            %run_id,
            records = records.len(),
            source_failures = source_failures.len(),
            rows_extracted = snapshot.rows_extracted,
            exact_merges = snapshot.exact_merges,
            fuzzy_merges = snapshot.fuzzy_merges,
            details_enriched = snapshot.details_enriched,
            subscriptions_enriched = snapshot.subscriptions_enriched,
            gmp_backfilled = snapshot.gmp_backfilled,
            "reconciliation run complete"
        );

        let diagnostics = RunDiagnostics {
            run_id,
            started_at,
            failed: false,
            source_failures,
            stale_cleanup_hints: stale_cleanup_hints(&records),
            stats: snapshot,
        };
        PipelineOutcome {
            records,
            diagnostics,
        }
    }

    async fn run_inner(
        &self,
        now: DateTime<Utc>,
        stats: &Arc<RunStats>,
        source_failures: &mut Vec<SourceFailure>,
    ) -> anyhow::Result<Vec<IpoRecord>> {
        let primary = PageFetcher::new(self.config.primary_timeout)
            .context("building primary fetcher")?;

        // All three primary pages in flight at once. Each failure becomes a
        // diagnostics line item; the run proceeds with whatever answered.
        let (mainboard, sme, upcoming_page) = tokio::join!(
            primary.fetch_page(&self.config.mainboard_url),
            primary.fetch_page(&self.config.sme_url),
            primary.fetch_page(&self.config.upcoming_url),
        );

        let mut note = |source: &str, result: &Result<String, crate::fetch::FetchError>| {
            match result {
                Ok(_) => stats.page_fetched(),
                Err(e) => {
                    warn!(source = source, error = %e, "primary source contributed nothing");
                    stats.page_failed();
                    source_failures.push(SourceFailure {
                        source: source.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        };
        note("mainboard-listed", &mainboard);
        note("sme-listed", &sme);
        note("upcoming", &upcoming_page);

        // Extraction order IS the merge priority: later sources win exact-
        // merge conflicts, so this sequence is a policy, not a style choice.
        let mut raw: Vec<IpoRecord> = Vec::new();
        if let Ok(html) = &mainboard {
            raw.extend(listed::extract(
                html,
                &MAINBOARD_LISTED,
                IpoType::Mainboard,
                &self.config.mainboard_url,
                now,
                stats,
            ));
        }
        if let Ok(html) = &sme {
            raw.extend(listed::extract(
                html,
                &SME_LISTED,
                IpoType::Sme,
                &self.config.sme_url,
                now,
                stats,
            ));
        }
        if let Ok(html) = &upcoming_page {
            // Both upcoming tables share one document; parse once.
            let document = Html::parse_document(html);
            raw.extend(upcoming::extract(
                &document,
                &MAINBOARD_UPCOMING,
                IpoType::Mainboard,
                &self.config.upcoming_url,
                now,
                stats,
            ));
            raw.extend(upcoming::extract(
                &document,
                &SME_UPCOMING,
                IpoType::Sme,
                &self.config.upcoming_url,
                now,
                stats,
            ));
        }
        info!(rows = raw.len(), "extraction complete");

        let reconciled = fuzzy_dedup_by_prefix(dedup_by_slug(raw, stats), stats);
        info!(records = reconciled.len(), "reconciliation complete");

        let records: SharedRecords = Arc::new(parking_lot::RwLock::new(reconciled));

        // Detail first: it wants the settled candidate set and nobody
        // competes for its fields.
        let detail_fetcher =
            PageFetcher::new(self.config.detail_timeout).context("building detail fetcher")?;
        enrich::detail::enrich_all(&records, &detail_fetcher, stats).await;

        // Subscription and GMP touch disjoint fields, so they run as two
        // spawned tasks. A panic in one is a logged casualty, not a crash.
        let subscription_task = {
            let records = Arc::clone(&records);
            let stats = Arc::clone(stats);
            let lookup = self.lookup.clone();
            let base_url = self.config.subscription_base_url.clone();
            let fetcher = PageFetcher::new(self.config.subscription_timeout)
                .context("building subscription fetcher")?;
            tokio::spawn(async move {
                enrich::subscription::enrich_all(&records, &fetcher, &lookup, &base_url, &stats)
                    .await;
            })
        };
        let gmp_task = {
            let records = Arc::clone(&records);
            let stats = Arc::clone(stats);
            let urls = self.config.gmp_urls.clone();
            let fetcher =
                PageFetcher::new(self.config.gmp_timeout).context("building gmp fetcher")?;
            tokio::spawn(async move {
                enrich::gmp::enrich_all(&records, &fetcher, &urls, now, &stats).await;
            })
        };
        if let Err(e) = subscription_task.await {
            error!(error = %e, "subscription enrichment task died — records ship without it");
        }
        if let Err(e) = gmp_task.await {
            error!(error = %e, "gmp enrichment task died — records ship without it");
        }

        // Strip internals before anything leaves the building.
        let mut records = Arc::try_unwrap(records)
            .map(parking_lot::RwLock::into_inner)
            .unwrap_or_else(|shared| shared.read().clone());
        for record in &mut records {
            record.detail_url = None;
        }
        Ok(records)
    }
}

/// The close dates represented in this run's output, deduplicated and
/// sorted. The persistence collaborator uses them to spot renamed ghosts:
/// a stored non-Listed record whose slug vanished from the run but whose
/// close date is in this list got renamed upstream and is safe to delete.
fn stale_cleanup_hints(records: &[IpoRecord]) -> Vec<NaiveDate> {
    let dates: BTreeSet<NaiveDate> = records.iter().filter_map(|r| r.close_date).collect();
    dates.into_iter().collect()
}
