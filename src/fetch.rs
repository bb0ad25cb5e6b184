// =============================================================================
// fetch.rs — THE POLITE CHROME IMPERSONATOR
// =============================================================================
//
// Every outbound page retrieval in the pipeline goes through here. The rules
// of engagement:
//
// 1. Look like a browser. Some of our sources serve robots a 403 and a
//    lecture; a Chrome user-agent and a plausible Accept header get the
//    same HTML a human would.
// 2. Bound every request with a timeout. One napping webserver must cost us
//    seconds, not the whole batch.
// 3. Fail soft, uniformly. Timeout, connection refused, 503, 404 — all of
//    them collapse into "no page", get logged with enough context to
//    diagnose, and contribute exactly zero records. The next scheduled run
//    is the retry policy.
// =============================================================================

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, PRAGMA, USER_AGENT};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Browser-like headers. The user-agent is a real Chrome signature because
/// at least one source rejects anything that smells like a default HTTP
/// client, and we are not here to litigate their robots policy.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
        ),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    headers
}

/// Why a fetch produced no page. Carried into diagnostics so a test (or an
/// operator at 7 AM) can tell a timeout from a 403 without replaying the run.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}

/// One HTTP client per concern, each with its own timeout. Primary pages,
/// detail pages, GMP pages, and subscription pages all have different
/// patience budgets, so they get different clients.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
}

impl PageFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(browser_headers())
            .build()?;
        Ok(Self { client })
    }

    /// Retrieve a page body, or say why not. Non-2xx is a failure here —
    /// a source that answers 404 has contributed as little as one that
    /// didn't answer at all.
    pub async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        debug!(url = url, "fetching page");
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            warn!(url = url, status = %response.status(), "non-success response — treating as no page");
            return Err(FetchError::Status(response.status()));
        }
        let body = response.text().await?;
        debug!(url = url, bytes = body.len(), "page fetched");
        Ok(body)
    }

    /// The soft-failure variant most of the pipeline wants: logs the reason
    /// and hands back None. The caller's only decision is "skip it."
    pub async fn fetch_page_soft(&self, url: &str) -> Option<String> {
        match self.fetch_page(url).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(url = url, error = %e, "fetch failed — source contributes nothing this run");
                None
            }
        }
    }
}
