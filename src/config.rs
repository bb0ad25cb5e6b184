// =============================================================================
// config.rs — THE GRAND CONFIGURATION CATHEDRAL
// =============================================================================
//
// Every tunable in the engine lives here: source URLs, per-stage timeouts,
// and the path to the hand-curated subscription lookup table. All of it can
// be overridden via IPO_RADAR_* environment variables, because hardcoding
// configuration is how you end up on the front page of Hacker News for the
// wrong reasons.
//
// Default timeouts were chosen through a rigorous process of "how long are
// we willing to stare at a spinner before declaring the website dead."
// =============================================================================

use std::env;
use std::time::Duration;

/// The Grand Configuration Struct. If you need to change which websites we
/// pester or how patiently we pester them, this is where you come.
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // PRIMARY SOURCE PAGES
    // Three listing pages, each with its own hand-mapped table layout.
    // Column order is configuration, not detection — if the webmaster
    // reshuffles a table, extraction silently degrades until someone
    // updates the shape in extract/. This is a known deal with the devil.
    // =========================================================================
    /// Mainboard listed-IPOs page (tablepress-17).
    pub mainboard_url: String,
    /// SME listed-IPOs page (tablepress-18).
    pub sme_url: String,
    /// Upcoming-IPOs page — carries both the Mainboard (tablepress-22)
    /// and SME (tablepress-23) upcoming tables.
    pub upcoming_url: String,

    // =========================================================================
    // SECONDARY SOURCE PAGES
    // =========================================================================
    /// Live-GMP listing pages, in priority order. First page to report a
    /// premium for a record wins; later pages never overwrite it.
    pub gmp_urls: Vec<String>,
    /// Base URL for per-IPO subscription pages; the lookup table supplies
    /// the slug and numeric id appended to it.
    pub subscription_base_url: String,

    // =========================================================================
    // TIMEOUTS
    // One unresponsive website must never stall the batch. Primary pages
    // get the most patience; detail pages get the least, because there can
    // be dozens of them and they're pure gravy.
    // =========================================================================
    /// Timeout for the three primary listing pages. Default: 15s.
    pub primary_timeout: Duration,
    /// Timeout for per-record detail pages. Default: 7s.
    pub detail_timeout: Duration,
    /// Timeout for the GMP listing pages. Default: 10s.
    pub gmp_timeout: Duration,
    /// Timeout for subscription pages. Default: 15s.
    pub subscription_timeout: Duration,

    // =========================================================================
    // SUBSCRIPTION LOOKUP TABLE
    // =========================================================================
    /// Path to the JSON file mapping close dates to the subscription
    /// source's own {slug, id} pairs. Hand-curated, read-only, and very
    /// deliberately NOT hardcoded in the enrichment logic.
    pub subscription_lookup_path: String,
}

impl Config {
    /// Load configuration from environment variables with workable defaults.
    /// "Workable" meaning "runs out of the box against the real sources, but
    /// respects your wishes if you point it elsewhere" — which is exactly
    /// what the wiremock tests do.
    pub fn from_env() -> Self {
        // Tolerate a missing .env file. Not everyone has their life together.
        let _ = dotenvy::dotenv();

        Config {
            mainboard_url: env_or_default(
                "IPO_RADAR_MAINBOARD_URL",
                "https://www.ipowatch.in/mainboard-ipo/",
            ),
            sme_url: env_or_default("IPO_RADAR_SME_URL", "https://www.ipowatch.in/sme-ipo/"),
            upcoming_url: env_or_default(
                "IPO_RADAR_UPCOMING_URL",
                "https://www.ipowatch.in/upcoming-ipo/",
            ),

            gmp_urls: env_or_default(
                "IPO_RADAR_GMP_URLS",
                "https://www.investorgain.com/report/live-ipo-gmp/331/ipo/,https://www.investorgain.com/report/live-ipo-gmp/331/sme/",
            )
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),

            subscription_base_url: env_or_default(
                "IPO_RADAR_SUBSCRIPTION_BASE_URL",
                "https://www.chittorgarh.com",
            ),

            primary_timeout: Duration::from_secs(
                env_or_default("IPO_RADAR_PRIMARY_TIMEOUT_SECS", "15").parse().unwrap_or(15),
            ),
            detail_timeout: Duration::from_secs(
                env_or_default("IPO_RADAR_DETAIL_TIMEOUT_SECS", "7").parse().unwrap_or(7),
            ),
            gmp_timeout: Duration::from_secs(
                env_or_default("IPO_RADAR_GMP_TIMEOUT_SECS", "10").parse().unwrap_or(10),
            ),
            subscription_timeout: Duration::from_secs(
                env_or_default("IPO_RADAR_SUBSCRIPTION_TIMEOUT_SECS", "15").parse().unwrap_or(15),
            ),

            subscription_lookup_path: env_or_default(
                "IPO_RADAR_SUBSCRIPTION_LOOKUP_PATH",
                "data/subscription_lookup.json",
            ),
        }
    }
}

/// Helper to read an environment variable with a default fallback.
/// Because unwrap_or on env::var is ugly and we have standards.
fn env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = Config::from_env();
        assert!(config.mainboard_url.starts_with("http"));
        assert_eq!(config.gmp_urls.len(), 2);
        assert!(config.detail_timeout < config.primary_timeout);
    }
}
