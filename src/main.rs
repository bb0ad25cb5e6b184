// The thin shell around the engine: banner, tracing, config, one run,
// pretty JSON on stdout for the persistence collaborator to slurp.
// Scheduling is somebody else's cron job; we are a function, not a daemon.

use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use ipo_radar_engine::{Config, Pipeline};

fn print_banner() {
    let banner = r#"

    ╔══════════════════════════════════════════════════════════════════╗
    ║                                                                  ║
    ║   ██╗██████╗  ██████╗     ██████╗  █████╗ ██████╗  █████╗ ██████╗║
    ║   ██║██╔══██╗██╔═══██╗    ██╔══██╗██╔══██╗██╔══██╗██╔══██╗██╔══██╗
    ║   ██║██████╔╝██║   ██║    ██████╔╝███████║██║  ██║███████║██████╔╝
    ║   ██║██╔═══╝ ██║   ██║    ██╔══██╗██╔══██║██║  ██║██╔══██║██╔══██╗
    ║   ██║██║     ╚██████╔╝    ██║  ██║██║  ██║██████╔╝██║  ██║██║  ██║
    ║   ╚═╝╚═╝      ╚═════╝     ╚═╝  ╚═╝╚═╝  ╚═╝╚═════╝ ╚═╝  ╚═╝╚═╝  ╚═╝
    ║                                                                  ║
    ║          ⚡ PRIMARY MARKET RECONCILIATION ENGINE ⚡              ║
    ║                                                                  ║
    ║   Sources:  Mainboard | SME | Upcoming | GMP | Subscriptions     ║
    ║   Dedup:    Exact Slug + Fuzzy Prefix Two-Stage Merge            ║
    ║   Status:   Pure-Function Lifecycle Oracle (IST cutovers)        ║
    ║   Contract: Never Throws. Reads The Diagnostics.                 ║
    ║                                                                  ║
    ║   "Three websites disagree. We settle it."                       ║
    ║                                                                  ║
    ╚══════════════════════════════════════════════════════════════════╝

    "#;
    eprintln!("{}", banner);
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs on stderr, records on stdout. The consumer pipes stdout; the
    // operator reads stderr. Never the twain shall mix.
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_writer(std::io::stderr)
        .init();

    print_banner();

    info!("📈 IPO RADAR ENGINE initializing...");
    let config = Config::from_env();
    info!(
        "✅ Configuration loaded: {} primary pages, {} gmp pages",
        3,
        config.gmp_urls.len()
    );

    let pipeline = Pipeline::new(config);
    let outcome = pipeline.run().await;

    if outcome.diagnostics.failed {
        warn!("⚠️ run degraded to empty record set — consumer should skip this batch");
    }
    for failure in &outcome.diagnostics.source_failures {
        warn!(source = %failure.source, reason = %failure.reason, "source failure this run");
    }
    info!(
        "✅ {} records reconciled (run {})",
        outcome.records.len(),
        outcome.diagnostics.run_id
    );

    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
