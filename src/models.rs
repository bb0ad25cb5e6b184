// =============================================================================
// models.rs — THE SACRED DATA STRUCTURES OF THE PRIMARY MARKET
// =============================================================================
//
// These structs represent everything we know (or can pry out of three
// uncooperative websites) about an Indian IPO. Each field is optional unless
// the universe guarantees it, and the universe guarantees very little when
// your upstream data format is "whatever the webmaster felt like in 2019."
//
// Is it overkill to track four separate subscription multipliers on one
// record? Yes. Do we care? Absolutely not.
// =============================================================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::status::status_at;

/// Which exchange board the issue lists on. Mainboard IPOs are the ones that
/// make the evening news; SME IPOs are the ones that make the group chats.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum IpoType {
    Mainboard,
    #[serde(rename = "SME")]
    Sme,
}

impl fmt::Display for IpoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpoType::Mainboard => write!(f, "Mainboard"),
            IpoType::Sme => write!(f, "SME"),
        }
    }
}

/// Lifecycle state of an IPO. Always derived from the dates at read time —
/// a stored status is stale the moment the market clock ticks past a cutover,
/// so nothing in this pipeline ever trusts one it didn't just compute.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum IpoStatus {
    /// Bidding hasn't opened yet. The GMP speculation, however, has.
    Upcoming,
    /// Bidding is live. Subscription multipliers exist only in this state.
    Open,
    /// Bidding closed, allotment pending. The refresh-button era.
    Closed,
    /// Trading on the exchange. The record now carries a listing price and
    /// everyone pretends they predicted the pop.
    Listed,
}

impl fmt::Display for IpoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpoStatus::Upcoming => write!(f, "Upcoming"),
            IpoStatus::Open => write!(f, "Open"),
            IpoStatus::Closed => write!(f, "Closed"),
            IpoStatus::Listed => write!(f, "Listed"),
        }
    }
}

/// The canonical IPO record. This is what gets reconciled across sources,
/// enriched from secondary pages, and finally handed to the persistence
/// collaborator, which upserts it keyed by `slug`.
///
/// Field names serialize in camelCase because the consumer on the other side
/// speaks JavaScript and we were raised to be accommodating.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IpoRecord {
    /// The company's display name exactly as the source printed it,
    /// corporate suffixes, ampersands, and all.
    pub company_name: String,

    /// Lowercase hyphen-normalized identifier derived from the name.
    /// This is the dedup key and the only identity that survives across
    /// sources, because the sources share no identifier space whatsoever.
    pub slug: String,

    pub ipo_type: IpoType,

    /// Price band low/high. Equal for fixed-price issues. Low ≤ high when
    /// the source cooperates, which is most of the time.
    pub price_band_low: Option<f64>,
    pub price_band_high: Option<f64>,

    /// Shares per lot. Scraped from a prose sentence on the detail page,
    /// which is exactly as robust as it sounds.
    pub lot_size: Option<u32>,

    /// Free-text issue size, e.g. "₹250.80 Cr". Normalized but not parsed —
    /// the UI displays it verbatim.
    pub issue_size: Option<String>,

    pub open_date: Option<NaiveDate>,
    pub close_date: Option<NaiveDate>,
    pub listing_date: Option<NaiveDate>,

    /// Grey-market premium, a signed currency amount. Absent means "no
    /// signal" — and so does zero, by source convention, so we never store
    /// a zero here.
    pub gmp: Option<f64>,

    /// Subscription multipliers. Non-negative, populated only while Open.
    pub subscription_retail: Option<f64>,
    pub subscription_nii: Option<f64>,
    pub subscription_qib: Option<f64>,
    pub subscription_total: Option<f64>,

    pub listing_price: Option<f64>,
    pub listing_gain_percent: Option<f64>,

    /// Derived lifecycle state. Recomputed every run; never trusted from
    /// storage or from a source's own status column.
    pub status: IpoStatus,

    /// Internal only: the per-record secondary page used for detail
    /// enrichment. Stripped before the record leaves the pipeline.
    #[serde(skip)]
    pub detail_url: Option<String>,
}

impl IpoRecord {
    /// Bare record with nothing but an identity and a status. Extractors
    /// start from this and fill in whatever their table actually has.
    pub fn new(company_name: impl Into<String>, ipo_type: IpoType, status: IpoStatus) -> Self {
        let company_name = company_name.into();
        let slug = crate::normalize::slugify(&company_name);
        Self {
            company_name,
            slug,
            ipo_type,
            price_band_low: None,
            price_band_high: None,
            lot_size: None,
            issue_size: None,
            open_date: None,
            close_date: None,
            listing_date: None,
            gmp: None,
            subscription_retail: None,
            subscription_nii: None,
            subscription_qib: None,
            subscription_total: None,
            listing_price: None,
            listing_gain_percent: None,
            status,
            detail_url: None,
        }
    }

    /// Build a record from hand-entered fields (the admin one-off path).
    /// Status is computed, not supplied — see the classifier's whole deal.
    #[allow(clippy::too_many_arguments)]
    pub fn from_manual_entry(
        company_name: impl Into<String>,
        ipo_type: IpoType,
        price_band_low: Option<f64>,
        price_band_high: Option<f64>,
        lot_size: Option<u32>,
        issue_size: Option<String>,
        open_date: Option<NaiveDate>,
        close_date: Option<NaiveDate>,
        listing_date: Option<NaiveDate>,
        gmp: Option<f64>,
    ) -> Self {
        let status = status_at(open_date, close_date, listing_date, Utc::now());
        let mut record = Self::new(company_name, ipo_type, status);
        record.price_band_low = price_band_low;
        record.price_band_high = price_band_high;
        record.lot_size = lot_size;
        record.issue_size = issue_size;
        record.open_date = open_date;
        record.close_date = close_date;
        record.listing_date = listing_date;
        record.gmp = gmp;
        record
    }

    /// Overlay `other`'s populated fields onto `self`, later-source-wins.
    /// Used by the exact-key merge: when two sources describe the same slug,
    /// the one processed later is presumed fresher.
    pub fn overlay(&mut self, other: &IpoRecord) {
        // Always-present fields: the later source wins outright.
        self.company_name = other.company_name.clone();
        self.ipo_type = other.ipo_type;
        self.status = other.status;

        macro_rules! take_if_some {
            ($($field:ident),* $(,)?) => {
                $(if other.$field.is_some() {
                    self.$field = other.$field.clone();
                })*
            };
        }
        take_if_some!(
            price_band_low,
            price_band_high,
            lot_size,
            issue_size,
            open_date,
            close_date,
            listing_date,
            gmp,
            subscription_retail,
            subscription_nii,
            subscription_qib,
            subscription_total,
            listing_price,
            listing_gain_percent,
            detail_url,
        );
    }

    /// Copy `other`'s populated fields into `self`'s gaps only. Used by the
    /// fuzzy merge (donor record is discarded afterwards) — the kept record's
    /// own data always outranks the donor's.
    pub fn fill_gaps_from(&mut self, other: &IpoRecord) {
        macro_rules! fill_if_none {
            ($($field:ident),* $(,)?) => {
                $(if self.$field.is_none() && other.$field.is_some() {
                    self.$field = other.$field.clone();
                })*
            };
        }
        fill_if_none!(
            price_band_low,
            price_band_high,
            lot_size,
            issue_size,
            open_date,
            close_date,
            listing_date,
            gmp,
            subscription_retail,
            subscription_nii,
            subscription_qib,
            subscription_total,
            listing_price,
            listing_gain_percent,
            detail_url,
        );
    }
}

impl fmt::Display for IpoRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] ({}) — {}",
            self.company_name, self.slug, self.ipo_type, self.status
        )
    }
}

/// One primary source that failed this run. Collected instead of raised,
/// because a dead website is a data gap, not an emergency.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFailure {
    /// Which source (e.g. "mainboard-listed").
    pub source: String,
    /// Human-readable reason, straight from the fetch layer.
    pub reason: String,
}

/// Everything a run wants to tell the caller besides the records themselves.
/// The "never throw, always degrade" discipline lives here: tests and the
/// persistence collaborator inspect this instead of catching exceptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunDiagnostics {
    /// Unique id for this run. Shows up in log lines as `run_id` so a bad
    /// run can be grepped out of the noise.
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// True only when something unexpected escaped the pipeline internals
    /// and the run degraded to an empty record set.
    pub failed: bool,
    pub source_failures: Vec<SourceFailure>,
    /// Close dates present in this run's output. The persistence
    /// collaborator uses these for its stale-record cleanup heuristic:
    /// a non-Listed stored record whose slug is absent from the run but
    /// whose close date appears here is a renamed ghost, safe to delete.
    pub stale_cleanup_hints: Vec<NaiveDate>,
    pub stats: crate::stats::RunStatsSnapshot,
}

/// The pipeline's one and only return type. Records plus diagnostics,
/// never an error. Zero records means "skip this run," never "delete
/// everything" — that decision belongs to the caller and we put it in
/// writing here so nobody relitigates it at 2 AM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub records: Vec<IpoRecord>,
    pub diagnostics: RunDiagnostics,
}
