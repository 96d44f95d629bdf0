//! Command-line interface definitions.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Search parameters mirror the site's own query vocabulary (`was`, `wo`,
//! `beruf`); the remaining flags control quota, pagination, detail
//! collection, and the fetch channel.

use clap::Parser;

/// Command-line arguments for the ausbildung.de scraper.
///
/// # Examples
///
/// ```sh
/// # Search by keyword and location, collect 100 postings
/// ausbildung_scrape -k mechatroniker -l dortmund -o ./output
///
/// # List-level summaries only, no detail pages
/// ausbildung_scrape -k pflege --summaries-only
///
/// # Scrape explicit pages, bypassing discovery and the data API
/// ausbildung_scrape --start-url "https://www.ausbildung.de/suche/?was=koch"
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Free-text search keyword (the site's "was" parameter)
    #[arg(short, long, default_value = "")]
    pub keyword: String,

    /// Location filter (the site's "wo" parameter)
    #[arg(short, long, default_value = "")]
    pub location: String,

    /// Profession filter (the site's "beruf" parameter)
    #[arg(short, long, default_value = "")]
    pub beruf: String,

    /// Number of records to collect; zero or negative means unbounded
    #[arg(long, default_value_t = 100, allow_hyphen_values = true)]
    pub results_wanted: i64,

    /// Maximum number of list/API pages to visit
    #[arg(long, default_value_t = 50)]
    pub max_pages: u64,

    /// Emit list-level summaries without fetching detail pages
    #[arg(long)]
    pub summaries_only: bool,

    /// Explicit start URL(s); bypasses discovery and the data API
    #[arg(long = "start-url")]
    pub start_urls: Vec<String>,

    /// Proxy URL(s) rotated across requests
    #[arg(long = "proxy-url", env = "PROXY_URLS", value_delimiter = ',')]
    pub proxy_urls: Vec<String>,

    /// Output directory for the JSON-Lines result file
    #[arg(short, long, default_value = "./output")]
    pub output_dir: String,
}

impl Cli {
    /// The effective results quota. Zero or negative means unbounded.
    pub fn resolved_results_wanted(&self) -> usize {
        if self.results_wanted >= 1 {
            self.results_wanted as usize
        } else {
            usize::MAX
        }
    }
}
