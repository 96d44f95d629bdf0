//! Tier orchestration: discovery, the Tier 1 loop, and the Tier 2/3 crawl.
//!
//! The run is an explicit state machine over three phases:
//!
//! ```text
//! DISCOVER ──token found──▶ TIER1_LOOP ──quota met──▶ done
//!     │                         │
//!     └──token absent──▶────────┴──quota unmet──▶ TIER2_3_CRAWL ──▶ done
//! ```
//!
//! Explicit start URLs bypass discovery entirely and enter the crawl phase
//! directly. All phases share one [`CrawlState`], so postings discovered by
//! Tier 1 are never re-emitted by the crawl.
//!
//! Tier 1 is strictly sequential per page — the continuation decision
//! depends on the prior page's outcome — with a small inter-page delay to
//! reduce rate-limit risk. The crawl walks list pages sequentially along
//! next-links (same reason) but fetches each page's detail URLs through a
//! bounded concurrent pool; no such delay is needed there because the pool
//! ceiling and per-request retry policy already throttle.

use crate::extract::api::{ApiExtractor, LoopStep, Tier1Loop};
use crate::extract::{discovery, jsonld, markup, reconcile};
use crate::fetch::Fetcher;
use crate::models::{BasicInfo, JobRecord};
use crate::outputs::jsonl::JsonlSink;
use crate::state::CrawlState;
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Concurrent detail fetches in the crawl phase.
const MAX_CONCURRENCY: usize = 10;

/// Delay between Tier 1 endpoint requests.
const TIER1_PAGE_DELAY: Duration = Duration::from_millis(500);

/// Run phases. `Tier1Loop` is reachable only when no explicit start URLs
/// were supplied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Discover,
    Tier1Loop,
    Crawl,
    Done,
}

/// Where a run starts: explicit start URLs skip discovery and Tier 1.
pub fn initial_phase(has_start_urls: bool) -> Phase {
    if has_start_urls {
        Phase::Crawl
    } else {
        Phase::Discover
    }
}

/// The single transition function for the phase machine.
pub fn next_phase(current: Phase, token_found: bool, quota_met: bool) -> Phase {
    match current {
        Phase::Discover => {
            if token_found {
                Phase::Tier1Loop
            } else {
                Phase::Crawl
            }
        }
        Phase::Tier1Loop => {
            if quota_met {
                Phase::Done
            } else {
                Phase::Crawl
            }
        }
        Phase::Crawl | Phase::Done => Phase::Done,
    }
}

/// Build the search landing URL from free-text parameters, omitting empties.
pub fn build_search_url(keyword: &str, location: &str, beruf: &str) -> String {
    let mut params = Vec::new();
    if !keyword.trim().is_empty() {
        params.push(format!("was={}", urlencoding::encode(keyword.trim())));
    }
    if !location.trim().is_empty() {
        params.push(format!("wo={}", urlencoding::encode(location.trim())));
    }
    if !beruf.trim().is_empty() {
        params.push(format!("beruf={}", urlencoding::encode(beruf.trim())));
    }
    if params.is_empty() {
        discovery::SEARCH_URL.to_string()
    } else {
        format!("{}?{}", discovery::SEARCH_URL, params.join("&"))
    }
}

/// Run-level configuration consumed by the orchestrator.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub keyword: String,
    pub location: String,
    pub beruf: String,
    pub max_pages: u64,
    pub collect_details: bool,
    pub start_urls: Vec<String>,
}

/// Sequences the tiers and drives the pagination loops.
pub struct Orchestrator {
    config: RunConfig,
    fetcher: Arc<Fetcher>,
    state: Arc<CrawlState>,
    sink: Arc<JsonlSink>,
    wanted_label: String,
}

impl Orchestrator {
    pub fn new(
        config: RunConfig,
        fetcher: Arc<Fetcher>,
        state: Arc<CrawlState>,
        sink: Arc<JsonlSink>,
    ) -> Self {
        let wanted_label = if state.results_wanted() == usize::MAX {
            "unbounded".to_string()
        } else {
            state.results_wanted().to_string()
        };
        Self {
            config,
            fetcher,
            state,
            sink,
            wanted_label,
        }
    }

    /// Drive the phase machine to completion.
    #[instrument(level = "info", skip_all)]
    pub async fn run(&self) {
        let mut phase = initial_phase(!self.config.start_urls.is_empty());
        let mut token: Option<String> = None;

        loop {
            match phase {
                Phase::Discover => {
                    token = discovery::discover_build_token(&self.fetcher).await;
                    phase = next_phase(phase, token.is_some(), self.state.quota_met());
                }
                Phase::Tier1Loop => {
                    if let Some(build_id) = token.as_deref() {
                        self.run_tier1(build_id).await;
                    }
                    phase = next_phase(phase, false, self.state.quota_met());
                    if phase == Phase::Crawl {
                        info!(
                            saved = self.state.saved(),
                            "Falling back to HTML parsing for the remaining quota"
                        );
                    }
                }
                Phase::Crawl => {
                    self.run_crawl().await;
                    phase = Phase::Done;
                }
                Phase::Done => break,
            }
        }
    }

    /// Tier 1: sequential per-page loop against the data endpoint.
    #[instrument(level = "info", skip_all)]
    async fn run_tier1(&self, build_id: &str) {
        info!("=== Tier 1: querying the structured data endpoint ===");
        let api = ApiExtractor::default();
        let mut progress = Tier1Loop::new();

        loop {
            let page = match progress.next_page(self.state.quota_met(), self.config.max_pages) {
                Ok(page) => page,
                Err(reason) => {
                    info!(?reason, "Leaving Tier 1 loop");
                    break;
                }
            };

            let payload = api
                .fetch_page(
                    &self.fetcher,
                    build_id,
                    page,
                    &self.config.keyword,
                    &self.config.location,
                    &self.config.beruf,
                )
                .await;

            let Some(payload) = payload else {
                warn!(page, "Data endpoint returned no data");
                if let LoopStep::Stop(reason) = progress.register_failure() {
                    info!(?reason, "Too many consecutive endpoint failures");
                    break;
                }
                continue;
            };

            let outcome = api.parse_page(&payload);
            if outcome.jobs.is_empty() {
                info!(page, "No jobs parsed from endpoint response");
                if let LoopStep::Stop(reason) = progress.register_failure() {
                    info!(?reason, "Too many consecutive empty endpoint pages");
                    break;
                }
                continue;
            }

            let parsed_count = outcome.jobs.len();
            for job in outcome.jobs {
                if self.state.quota_met() {
                    break;
                }
                if !self.state.should_process(&job.url) {
                    continue;
                }
                self.emit(job).await;
            }

            info!(
                page,
                saved = self.state.saved(),
                wanted = %self.wanted_label,
                total_pages = ?outcome.total_pages,
                "Endpoint page processed"
            );

            if let LoopStep::Stop(reason) =
                progress.register_page(parsed_count, outcome.has_more, api.full_page_threshold)
            {
                info!(?reason, "Reached last page of endpoint results");
                break;
            }

            sleep(TIER1_PAGE_DELAY).await;
        }

        if self.state.quota_met() {
            info!(saved = self.state.saved(), "Tier 1 met the quota");
        } else if progress.produced_any() {
            info!(
                saved = self.state.saved(),
                remaining = self.state.remaining_quota(),
                "Tier 1 partial success"
            );
        } else {
            info!("Data endpoint yielded no results");
        }
    }

    /// Tier 2/3: crawl list pages along next-links, fetching detail pages
    /// through a bounded concurrent pool.
    #[instrument(level = "info", skip_all)]
    async fn run_crawl(&self) {
        info!("=== Tier 2/3: HTML crawl with JSON-LD and selector fallback ===");

        let starts: Vec<String> = if self.config.start_urls.is_empty() {
            vec![build_search_url(
                &self.config.keyword,
                &self.config.location,
                &self.config.beruf,
            )]
        } else {
            self.config.start_urls.clone()
        };

        for start in starts {
            if self.state.quota_met() {
                break;
            }
            if !self.state.should_process(&start) {
                continue;
            }
            let mut page_no: u64 = 1;
            let mut current = Some(start);
            while let Some(url) = current {
                if self.state.quota_met() {
                    break;
                }
                current = self.process_list_page(&url, page_no).await;
                page_no += 1;
            }
        }
    }

    /// Process one list page: extract cards, dispatch detail fetches (or
    /// emit summaries), and return the next list URL to visit, if any.
    #[instrument(level = "info", skip(self), fields(page = page_no))]
    async fn process_list_page(&self, url: &str, page_no: u64) -> Option<String> {
        let body = match self.fetcher.get_text_with_retry(url).await {
            Ok(body) => body,
            Err(e) => {
                error!(%url, error = %e, "List page fetch failed; abandoning this chain");
                return None;
            }
        };

        let (cards, next_url) = {
            let doc = Html::parse_document(&body);
            (markup::extract_list(&doc, url), markup::find_next_page(&doc, url))
        };
        info!(count = cards.len(), "Found job cards");

        // Quota and dedup are consulted before any work is enqueued; once
        // the quota is met nothing new enters the pool.
        let mut accepted = Vec::new();
        for card in cards {
            if self.state.quota_met() {
                break;
            }
            if !self.state.should_process(&card.url) {
                continue;
            }
            accepted.push(card);
        }

        if self.config.collect_details {
            use futures::stream::{self, StreamExt};
            stream::iter(accepted)
                .map(|basic| self.process_detail(basic))
                .buffer_unordered(MAX_CONCURRENCY)
                .collect::<Vec<_>>()
                .await;
        } else {
            for card in accepted {
                self.emit(card.into_record()).await;
            }
        }

        if !self.state.quota_met() && page_no < self.config.max_pages {
            if let Some(next) = next_url {
                if self.state.should_process(&next) {
                    return Some(next);
                }
            }
        }
        None
    }

    /// Fetch one detail page, run Tier 2 and Tier 3 against it, reconcile,
    /// and emit. A failure here is logged per URL and skips only this
    /// entity; the crawl continues.
    async fn process_detail(&self, basic: BasicInfo) {
        if self.state.quota_met() {
            return;
        }
        debug!(url = %basic.url, "Processing detail page");

        let body = match self.fetcher.get_text_with_retry(&basic.url).await {
            Ok(body) => body,
            Err(e) => {
                error!(url = %basic.url, error = %e, "Detail fetch failed; skipping entity");
                return;
            }
        };

        let record = {
            let doc = Html::parse_document(&body);
            let posting = jsonld::extract_job_posting(&doc);
            let detail = markup::extract_detail(&doc);
            reconcile::merge(basic.url.clone(), posting, detail, basic)
        };
        self.emit(record).await;
    }

    /// Push a record through the quota gate to the sink.
    async fn emit(&self, record: JobRecord) {
        let Some(saved) = self.state.claim_slot() else {
            return;
        };
        if let Err(e) = self.sink.push(&record).await {
            error!(url = %record.url, error = %e, "Failed to write record");
            return;
        }
        info!(
            saved,
            wanted = %self.wanted_label,
            title = record.title.as_deref().unwrap_or("-"),
            "Saved job"
        );
    }
}
