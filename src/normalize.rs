// =============================================================================
// normalize.rs — THE FIELD LAUNDROMAT
// =============================================================================
//
// Every cell that comes out of the source tables passes through here on its
// way to becoming a typed value. The sources cannot agree on a date format,
// a currency notation, or whether a dash means "zero", "unknown", or "the
// intern was on leave" — so every parser in this file is total: malformed
// input comes out as None, never as a panic, never as an error.
//
// No I/O, no clocks except where explicitly injected. These functions are
// the one part of the pipeline you can reason about in the bathtub.
// =============================================================================

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

/// Open/close pair produced by the compact-range parser. Either side can be
/// absent when the source cell is garbage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub open: Option<NaiveDate>,
    pub close: Option<NaiveDate>,
}

// "25-27 Feb" — both days in one month, no year in sight.
static SAME_MONTH_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})-(\d{1,2})\s+([A-Za-z]{3})$").unwrap());

// "28 Feb-03 Mar" — the range straddles a month boundary, still no year.
static CROSS_MONTH_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\s+([A-Za-z]{3})-(\d{1,2})\s+([A-Za-z]{3})$").unwrap());

// "₹216 to ₹227", after currency/whitespace stripping: "216to227".
static PRICE_BAND_RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(\d+(?:\.\d+)?)to(\d+(?:\.\d+)?)$").unwrap());

/// Lowercase, hyphen-normalized identifier. "Gaudium IVF & Women Health"
/// becomes "gaudium-ivf-women-health". This is the dedup key, so the rules
/// are deliberately dumb and deliberately frozen.
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('-') && !out.is_empty() {
            out.push('-');
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Month abbreviation → 1-based month number. Case-insensitive, because the
/// sources are not above printing "FEB" in one table and "Feb" in the next.
pub(crate) fn month_number(abbr: &str) -> Option<u32> {
    match abbr.to_ascii_lowercase().as_str() {
        "jan" => Some(1),
        "feb" => Some(2),
        "mar" => Some(3),
        "apr" => Some(4),
        "may" => Some(5),
        "jun" => Some(6),
        "jul" => Some(7),
        "aug" => Some(8),
        "sep" => Some(9),
        "oct" => Some(10),
        "nov" => Some(11),
        "dec" => Some(12),
        _ => None,
    }
}

/// Parses a long-form date like "Dec 22, 2025" or "December 22, 2025" —
/// the tables print abbreviations, detail-page prose spells the month out,
/// and both land here. Empty cells, "-", "N/A", and anything chrono can't
/// stomach come back as None.
pub fn parse_long_date(raw: &str) -> Option<NaiveDate> {
    let cleaned = raw.trim();
    if cleaned.is_empty() || cleaned == "-" || cleaned == "N/A" {
        return None;
    }
    NaiveDate::parse_from_str(cleaned, "%b %d, %Y")
        .or_else(|_| NaiveDate::parse_from_str(cleaned, "%B %d, %Y"))
        .ok()
}

/// Parses the upcoming-table compact range: "25-27 Feb" (same month) or
/// "28 Feb-03 Mar" (cross month). No year is printed, so one is inferred:
///
/// - Same-month form: take `today`'s year, but if that puts the open date
///   more than 60 days in the past, roll to next year. Year-boundary pages
///   love showing last December's leftovers in January.
/// - Cross-month form: the close rolls to next year iff its month number is
///   lower than the open's (the Dec→Jan wrap).
pub fn parse_short_date_range(raw: &str, today: NaiveDate) -> DateRange {
    let cleaned = raw.trim();
    if cleaned.is_empty() || cleaned == "-" {
        return DateRange::default();
    }
    let base_year = today.year();

    if let Some(caps) = SAME_MONTH_RANGE.captures(cleaned) {
        let (Ok(start_day), Ok(end_day)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
            return DateRange::default();
        };
        let Some(month) = month_number(&caps[3]) else {
            return DateRange::default();
        };
        let Some(candidate) = NaiveDate::from_ymd_opt(base_year, month, start_day) else {
            return DateRange::default();
        };
        let stale_cutoff = today.checked_sub_days(Days::new(60)).unwrap_or(today);
        let year = if candidate < stale_cutoff {
            base_year + 1
        } else {
            base_year
        };
        return DateRange {
            open: NaiveDate::from_ymd_opt(year, month, start_day),
            close: NaiveDate::from_ymd_opt(year, month, end_day),
        };
    }

    if let Some(caps) = CROSS_MONTH_RANGE.captures(cleaned) {
        let (Ok(start_day), Ok(end_day)) = (caps[1].parse::<u32>(), caps[3].parse::<u32>()) else {
            return DateRange::default();
        };
        let (Some(sm), Some(em)) = (month_number(&caps[2]), month_number(&caps[4])) else {
            return DateRange::default();
        };
        let end_year = if em < sm { base_year + 1 } else { base_year };
        return DateRange {
            open: NaiveDate::from_ymd_opt(base_year, sm, start_day),
            close: NaiveDate::from_ymd_opt(end_year, em, end_day),
        };
    }

    DateRange::default()
}

/// Strips the decorations off a numeric cell: rupee signs, thousands
/// commas, and whitespace. What's left is either a number or a confession.
fn strip_currency(raw: &str) -> String {
    raw.chars()
        .filter(|c| *c != '₹' && *c != ',' && !c.is_whitespace())
        .collect()
}

/// Parses "₹216 to ₹227" → (216, 227), or a single positive number "₹114"
/// → (114, 114) for fixed-price issues. Anything else → (None, None).
pub fn parse_price_band(raw: &str) -> (Option<f64>, Option<f64>) {
    let cleaned = strip_currency(raw);
    if let Some(caps) = PRICE_BAND_RANGE.captures(&cleaned) {
        let low = caps[1].parse::<f64>().ok();
        let high = caps[2].parse::<f64>().ok();
        return (low, high);
    }
    match cleaned.parse::<f64>() {
        Ok(fixed) if fixed.is_finite() && fixed > 0.0 => (Some(fixed), Some(fixed)),
        _ => (None, None),
    }
}

/// Issue size stays free text; we only normalize the unit suffix so
/// "₹250.80 Cr." and "₹250.80 Cr" stop being two different strings.
pub fn parse_issue_size(raw: &str) -> Option<String> {
    let cleaned = raw.trim();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    Some(cleaned.strip_suffix("Cr.").map_or_else(
        || cleaned.to_string(),
        |head| format!("{}Cr", head).trim().to_string(),
    ))
}

/// Grey-market premium: signed currency amount. An exact zero parses to
/// None on purpose — the source prints 0 both for "no premium" and "we
/// didn't check", and we refuse to pretend we can tell them apart.
pub fn parse_gmp(raw: &str) -> Option<f64> {
    let cleaned = strip_currency(raw);
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() && v != 0.0 => Some(v),
        _ => None,
    }
}

/// Parses "5.26%" or "-3.65%" → number. Negatives are very much a thing.
pub fn parse_percent(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != '%' && !c.is_whitespace()).collect();
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a plain price cell like "₹120". Zero and negative prices are
/// rejected — a listing price of ₹0 is a parse artifact, not a market event.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned = strip_currency(raw);
    if cleaned.is_empty() || cleaned == "-" {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}
