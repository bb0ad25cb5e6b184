// =============================================================================
// dedup.rs — THE RECONCILIATION FORTRESS
// =============================================================================
//
// The sources disagree about entity identity in two distinct ways, so this
// module deduplicates in two distinct stages:
//
// 1. EXACT: the same company scraped from two tables under the same derived
//    slug. Field-wise merge, last-seen non-absent value wins. "Last-seen" is
//    not an accident of the event loop — records arrive in a fixed source
//    priority order (mainboard listed, SME listed, mainboard upcoming, SME
//    upcoming), so later really does mean "the source we trust to be
//    fresher."
//
// 2. FUZZY: the same company under a shorter and a longer name across
//    tables — one source drops the corporate suffix, the other doesn't.
//    Two records match iff one slug is a strict hyphen-delimited prefix of
//    the other AND the same prefix relation holds word-wise on the raw
//    company names. The second condition is the bouncer: "sun-pharma" never
//    merges with "sunrise-pharma" just because they share four letters.
//
// When a fuzzy pair matches, the shorter-named record donates its populated
// fields into the longer-named record's gaps and is then shown the door.
// Chains (A prefix of B prefix of C) collapse into the LONGEST name: every
// shorter record merges directly into its longest matching superset, so the
// outcome doesn't depend on iteration-order luck.
//
// The fuzzy pass is O(n²). The run handles tens of records, not millions;
// if that assumption ever dies, so does this comment.
// =============================================================================

use std::collections::HashMap;
use tracing::{debug, info};

use crate::models::IpoRecord;
use crate::stats::RunStats;

/// Stage one: collapse records sharing an exact slug. Output preserves
/// first-encounter order; merged fields follow later-source-wins.
pub fn dedup_by_slug(records: Vec<IpoRecord>, stats: &RunStats) -> Vec<IpoRecord> {
    let mut merged: Vec<IpoRecord> = Vec::with_capacity(records.len());
    let mut index_by_slug: HashMap<String, usize> = HashMap::new();

    for record in records {
        match index_by_slug.get(&record.slug) {
            Some(&idx) => {
                debug!(slug = %record.slug, "exact-slug duplicate — merging, later source wins");
                merged[idx].overlay(&record);
                stats.exact_merge();
            }
            None => {
                index_by_slug.insert(record.slug.clone(), merged.len());
                merged.push(record);
            }
        }
    }

    merged
}

/// True iff `short` is a strict hyphen-delimited prefix of `long`:
/// "gaudium-ivf" prefixes "gaudium-ivf-women-health", but not
/// "gaudium-ivfx-anything".
fn slug_is_prefix(short: &str, long: &str) -> bool {
    long.len() > short.len() && long.starts_with(short) && long.as_bytes()[short.len()] == b'-'
}

/// The word-level confirmation on the raw names, case-insensitive:
/// "Gaudium IVF" is a word prefix of "Gaudium IVF & Women Health";
/// "Sun" is not a word prefix of "Sunrise Pharma".
fn name_is_word_prefix(short: &str, long: &str) -> bool {
    let short = short.to_lowercase();
    let long = long.to_lowercase();
    long.len() > short.len() && long.starts_with(&short) && long[short.len()..].starts_with(' ')
}

/// Stage two: cross-source prefix merge. Each matching shorter record
/// donates into (and is absorbed by) its longest matching superset.
pub fn fuzzy_dedup_by_prefix(records: Vec<IpoRecord>, stats: &RunStats) -> Vec<IpoRecord> {
    let mut records = records;
    let mut removed = vec![false; records.len()];

    for i in 0..records.len() {
        if removed[i] {
            continue;
        }

        // Longest superset wins, so chains collapse in one pass.
        let mut target: Option<usize> = None;
        for j in 0..records.len() {
            if i == j || removed[j] {
                continue;
            }
            if !slug_is_prefix(&records[i].slug, &records[j].slug) {
                continue;
            }
            if !name_is_word_prefix(&records[i].company_name, &records[j].company_name) {
                continue;
            }
            match target {
                Some(t) if records[t].slug.len() >= records[j].slug.len() => {}
                _ => target = Some(j),
            }
        }

        if let Some(j) = target {
            info!(
                donor = %records[i].company_name,
                kept = %records[j].company_name,
                "fuzzy duplicate merged"
            );
            let donor = records[i].clone();
            records[j].fill_gaps_from(&donor);
            removed[i] = true;
            stats.fuzzy_merge();
        }
    }

    records
        .into_iter()
        .zip(removed)
        .filter_map(|(record, gone)| (!gone).then_some(record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IpoStatus, IpoType};
    use chrono::NaiveDate;

    fn record(name: &str) -> IpoRecord {
        IpoRecord::new(name, IpoType::Mainboard, IpoStatus::Upcoming)
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_exact_merge_unions_fields_later_wins() {
        let mut first = record("Acme IPO");
        first.price_band_low = Some(100.0);
        first.price_band_high = Some(110.0);
        first.gmp = Some(5.0);
        let mut second = record("Acme IPO");
        second.gmp = Some(8.0);
        second.lot_size = Some(130);

        let stats = RunStats::new();
        let merged = dedup_by_slug(vec![first, second], &stats);
        assert_eq!(merged.len(), 1);
        let r = &merged[0];
        // union of non-absent fields, overlap resolved toward the later record
        assert_eq!(r.gmp, Some(8.0));
        assert_eq!(r.lot_size, Some(130));
        assert_eq!(r.price_band_low, Some(100.0));
        assert_eq!(stats.snapshot().exact_merges, 1);
    }

    #[test]
    fn test_exact_merge_keeps_first_encounter_order() {
        let stats = RunStats::new();
        let merged = dedup_by_slug(vec![record("Beta Co"), record("Alpha Co"), record("Beta Co")], &stats);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].company_name, "Beta Co");
        assert_eq!(merged[1].company_name, "Alpha Co");
    }

    #[test]
    fn test_fuzzy_merges_suffix_dropped_variant() {
        let mut short = record("Gaudium IVF");
        short.open_date = Some(d(2026, 2, 25));
        short.detail_url = Some("https://x.test/gaudium/".into());
        let mut long = record("Gaudium IVF Women Health");
        long.gmp = Some(8.5);

        let stats = RunStats::new();
        let merged = fuzzy_dedup_by_prefix(vec![short, long], &stats);
        assert_eq!(merged.len(), 1);
        let r = &merged[0];
        assert_eq!(r.slug, "gaudium-ivf-women-health");
        assert_eq!(r.company_name, "Gaudium IVF Women Health");
        // donor filled the gaps, kept record's own fields untouched
        assert_eq!(r.open_date, Some(d(2026, 2, 25)));
        assert_eq!(r.gmp, Some(8.5));
        assert_eq!(r.detail_url.as_deref(), Some("https://x.test/gaudium/"));
        assert_eq!(stats.snapshot().fuzzy_merges, 1);
    }

    #[test]
    fn test_fuzzy_never_merges_on_shared_leading_letters() {
        let stats = RunStats::new();
        let merged = fuzzy_dedup_by_prefix(vec![record("Sun Pharma"), record("Sunrise Pharma")], &stats);
        assert_eq!(merged.len(), 2);
        assert_eq!(stats.snapshot().fuzzy_merges, 0);
    }

    #[test]
    fn test_fuzzy_requires_word_level_name_confirmation() {
        // Slugs agree on the prefix relation, names do not: no merge.
        let mut a = record("AcmeSteel");
        a.slug = "acme-steel".into();
        let mut b = record("Acme Steel Works");
        b.slug = "acme-steel-works".into();
        // "acmesteel " is not a word prefix of "acme steel works"
        let stats = RunStats::new();
        let merged = fuzzy_dedup_by_prefix(vec![a, b], &stats);
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn test_fuzzy_chain_collapses_into_longest() {
        let mut a = record("Gaudium");
        a.lot_size = Some(150);
        let mut b = record("Gaudium IVF");
        b.open_date = Some(d(2026, 2, 25));
        let c = record("Gaudium IVF Women Health");

        let stats = RunStats::new();
        let merged = fuzzy_dedup_by_prefix(vec![a, b, c], &stats);
        assert_eq!(merged.len(), 1);
        let r = &merged[0];
        assert_eq!(r.slug, "gaudium-ivf-women-health");
        assert_eq!(r.lot_size, Some(150));
        assert_eq!(r.open_date, Some(d(2026, 2, 25)));
        assert_eq!(stats.snapshot().fuzzy_merges, 2);
    }
}
