// ██╗██████╗  ██████╗     ██████╗  █████╗ ██████╗  █████╗ ██████╗
// ██║██╔══██╗██╔═══██╗    ██╔══██╗██╔══██╗██╔══██╗██╔══██╗██╔══██╗
// ██║██████╔╝██║   ██║    ██████╔╝███████║██║  ██║███████║██████╔╝
// ██║██╔═══╝ ██║   ██║    ██╔══██╗██╔══██║██║  ██║██╔══██║██╔══██╗
// ██║██║     ╚██████╔╝    ██║  ██║██║  ██║██████╔╝██║  ██║██║  ██║
// ╚═╝╚═╝      ╚═════╝     ╚═╝  ╚═╝╚═╝  ╚═╝╚═════╝ ╚═╝  ╚═╝╚═╝  ╚═╝
//
// E N G I N E
//
// The most overkill IPO reconciliation engine ever conceived.
// Three uncooperative websites go in; one deduplicated, enriched,
// lifecycle-classified record set comes out. Every single run.

pub mod config;
pub mod dedup;
pub mod enrich;
pub mod extract;
pub mod fetch;
pub mod lookup;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod stats;
pub mod status;

pub use config::Config;
pub use models::{IpoRecord, IpoStatus, IpoType, PipelineOutcome, RunDiagnostics, SourceFailure};
pub use pipeline::Pipeline;
