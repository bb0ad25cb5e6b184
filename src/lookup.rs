// =============================================================================
// lookup.rs — THE HAND-CURATED ROSETTA STONE
// =============================================================================
//
// The subscription source assigns every IPO its own non-predictable numeric
// id, discoverable only by browser-rendering their listing pages. There is
// no API, no shared identifier space, no mercy. So: a human maintains a
// small JSON table mapping close dates to that source's {slug, id} pairs,
// and this module loads it.
//
// The table is static reference data, not derived state. It lives in a file
// (path is configuration) precisely so it can be updated without touching
// a line of reconciliation logic. Hardcoding it inline was considered and
// rejected on grounds of self-respect.
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// One entry in the hand-maintained table. `close_date` is the primary
/// match key; `name_hint` breaks ties when two IPOs close the same day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionLookupEntry {
    /// The subscription source's own URL slug, e.g. "gaudium-ivf-ipo".
    pub slug: String,
    /// The subscription source's numeric id, e.g. 2019.
    pub id: u32,
    /// Close date in ISO form — the primary match key against our records.
    pub close_date: NaiveDate,
    /// Short lowercase fragment of the company name, used only to
    /// disambiguate entries that share a close date.
    pub name_hint: String,
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("failed to read lookup table {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse lookup table {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// The loaded table. Read-only for the lifetime of a run.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionLookup {
    entries: Vec<SubscriptionLookupEntry>,
}

impl SubscriptionLookup {
    /// Load the table from a JSON file. A missing or malformed file is an
    /// error here; the caller decides whether that's fatal (it isn't — the
    /// pipeline runs without subscription enrichment and says so in logs).
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, LookupError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| LookupError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let entries: Vec<SubscriptionLookupEntry> =
            serde_json::from_str(&raw).map_err(|source| LookupError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        info!(path = %path.display(), entries = entries.len(), "subscription lookup table loaded");
        Ok(Self { entries })
    }

    /// Build directly from entries. The test suite's front door.
    pub fn from_entries(entries: Vec<SubscriptionLookupEntry>) -> Self {
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a record to its lookup entry: exact close-date match first,
    /// name-hint substring check when several IPOs close the same day.
    /// No match means the table simply hasn't been updated for this IPO yet.
    pub fn resolve(&self, close_date: NaiveDate, company_name: &str) -> Option<&SubscriptionLookupEntry> {
        let candidates: Vec<&SubscriptionLookupEntry> = self
            .entries
            .iter()
            .filter(|e| e.close_date == close_date)
            .collect();
        match candidates.len() {
            0 => None,
            1 => Some(candidates[0]),
            _ => {
                let name = company_name.to_lowercase();
                candidates
                    .iter()
                    .find(|e| name.contains(&e.name_hint))
                    .copied()
                    .or(Some(candidates[0]))
            }
        }
    }

    /// The per-IPO subscription page URL on the secondary source.
    pub fn page_url(&self, base_url: &str, entry: &SubscriptionLookupEntry) -> String {
        format!(
            "{}/ipo_subscription/{}/{}/",
            base_url.trim_end_matches('/'),
            entry.slug,
            entry.id
        )
    }
}
