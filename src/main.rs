//! # Ausbildung Scrape
//!
//! A tiered scraper for ausbildung.de job postings. The same data is exposed
//! through three unreliable, independently-changing channels; the scraper
//! discovers the most efficient one and falls back progressively:
//!
//! 1. **Structured data API**: the Next.js data endpoint, addressed with a
//!    build token recovered from the landing page
//! 2. **Embedded JSON-LD**: schema.org `JobPosting` blocks on detail pages
//! 3. **Heuristic markup**: cascading CSS selectors over raw HTML
//!
//! Records recovered across tiers are reconciled per field and appended to a
//! JSON-Lines result file.
//!
//! ## Usage
//!
//! ```sh
//! ausbildung_scrape -k mechatroniker -l dortmund --results-wanted 100
//! ```
//!
//! ## Architecture
//!
//! The run is a phase machine: discovery, then a sequential Tier 1 loop
//! against the data endpoint, then — if the quota is still unmet — a crawl
//! of list and detail pages with JSON-LD and selector extraction. All
//! phases share one dedup set and one saved-count, so no posting is ever
//! emitted twice.

use clap::Parser;
use std::error::Error;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod extract;
mod fetch;
mod models;
mod orchestrator;
mod outputs;
mod state;
mod utils;

use cli::Cli;
use fetch::Fetcher;
use orchestrator::{Orchestrator, RunConfig};
use outputs::jsonl::JsonlSink;
use state::CrawlState;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ausbildung_scrape starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.keyword, ?args.location, ?args.beruf, ?args.output_dir, "Parsed CLI arguments");

    // Early check: ensure the output dir is writable before any network work
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        tracing::error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    let results_wanted = args.resolved_results_wanted();
    let wanted_label = if results_wanted == usize::MAX {
        "unbounded".to_string()
    } else {
        results_wanted.to_string()
    };
    info!(
        results_wanted = %wanted_label,
        max_pages = args.max_pages,
        collect_details = !args.summaries_only,
        start_urls = args.start_urls.len(),
        proxies = args.proxy_urls.len(),
        "Run configuration"
    );

    let fetcher = Arc::new(Fetcher::new(&args.proxy_urls)?);
    let state = Arc::new(CrawlState::new(results_wanted));
    let sink = Arc::new(JsonlSink::open(&args.output_dir).await?);

    let config = RunConfig {
        keyword: args.keyword,
        location: args.location,
        beruf: args.beruf,
        max_pages: args.max_pages,
        collect_details: !args.summaries_only,
        start_urls: args.start_urls,
    };

    let orchestrator = Orchestrator::new(config, fetcher, Arc::clone(&state), Arc::clone(&sink));
    orchestrator.run().await;

    let elapsed = start_time.elapsed();
    info!(
        saved = state.saved(),
        output = %sink.path(),
        ?elapsed,
        secs = elapsed.as_secs(),
        "Finished"
    );

    Ok(())
}
