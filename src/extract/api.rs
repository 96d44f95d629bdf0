//! Tier 1: structured-data API extractor with shape probing.
//!
//! The data endpoint's response shape is not contractually fixed — it has
//! changed across site deployments. Instead of branching on observed shapes,
//! this module holds ranked probe tables:
//!
//! - [`JOB_ARRAY_PATHS`]: candidate property paths where the job array might
//!   live, tried in rank order with first-non-empty-match-wins semantics.
//! - Per-field [`JsonProbe`] lists: alternative source-property names (flat
//!   keys, nested paths, or boolean flags deriving a literal), taking the
//!   first defined value.
//!
//! New shapes are added by extending a table, never by touching control flow.
//!
//! The loop bookkeeping ([`Tier1Loop`]) is deliberately pure so the
//! termination rules — consecutive-failure threshold, page cap, heuristic
//! continuation — can be tested without any I/O.

use crate::fetch::Fetcher;
use crate::models::{ExtractionOutcome, JobRecord};
use crate::utils::{clean_text, to_abs, BASE_URL};
use itertools::Itertools;
use serde_json::Value;
use tracing::{debug, instrument, warn};

/// Consecutive no-data/zero-job pages tolerated before Tier 1 is abandoned.
/// A single transient empty page must not kill an otherwise-working channel.
pub const MAX_CONSECUTIVE_FAILURES: u32 = 2;

/// An ordered accessor into an untyped payload item.
#[derive(Debug, Clone, Copy)]
pub enum JsonProbe {
    /// A flat property name.
    Key(&'static str),
    /// A nested property path.
    Path(&'static [&'static str]),
    /// A boolean flag that, when true, derives a literal value.
    Flag(&'static str, &'static str),
}

/// Candidate paths to the job array, in rank order, resolved under
/// `pageProps` when present, else the document root.
pub const JOB_ARRAY_PATHS: &[&[&str]] = &[
    &["jobs"],
    &["data", "jobs"],
    &["searchResults", "jobs"],
    &["results"],
    &["data", "results"],
    &["positions"],
    &["listings"],
    &["data", "listings"],
    &["initialData", "jobs"],
    &["jobListings"],
];

const TITLE: &[JsonProbe] = &[
    JsonProbe::Key("title"),
    JsonProbe::Key("name"),
    JsonProbe::Key("jobTitle"),
];

const COMPANY: &[JsonProbe] = &[
    JsonProbe::Key("company"),
    JsonProbe::Key("employer"),
    JsonProbe::Key("companyName"),
    JsonProbe::Path(&["hiringOrganization", "name"]),
    JsonProbe::Key("firma"),
];

const LOCATION: &[JsonProbe] = &[
    JsonProbe::Path(&["location", "city"]),
    JsonProbe::Path(&["location", "name"]),
    JsonProbe::Key("location"),
    JsonProbe::Key("city"),
    JsonProbe::Path(&["address", "city"]),
    JsonProbe::Path(&["jobLocation", "address", "addressLocality"]),
    JsonProbe::Key("ort"),
];

const BUNDESLAND: &[JsonProbe] = &[
    JsonProbe::Key("bundesland"),
    JsonProbe::Key("state"),
    JsonProbe::Key("region"),
    JsonProbe::Key("federalState"),
    JsonProbe::Path(&["address", "region"]),
    JsonProbe::Path(&["location", "bundesland"]),
    JsonProbe::Path(&["location", "state"]),
    JsonProbe::Path(&["jobLocation", "address", "addressRegion"]),
];

const BERUF: &[JsonProbe] = &[
    JsonProbe::Key("beruf"),
    JsonProbe::Key("profession"),
    JsonProbe::Key("category"),
    JsonProbe::Key("berufsfeld"),
    JsonProbe::Key("jobCategory"),
    JsonProbe::Key("occupationalCategory"),
    JsonProbe::Key("branche"),
    JsonProbe::Key("field"),
    JsonProbe::Key("fachrichtung"),
];

const AUSBILDUNGSART: &[JsonProbe] = &[
    JsonProbe::Key("ausbildungsart"),
    JsonProbe::Key("trainingType"),
    JsonProbe::Key("stellenart"),
    JsonProbe::Key("positionType"),
    JsonProbe::Key("type"),
    JsonProbe::Key("employmentType"),
    JsonProbe::Key("contractType"),
    JsonProbe::Flag("isDualStudium", "Duales Studium"),
    JsonProbe::Flag("isAusbildung", "Ausbildung"),
];

const DATE_POSTED: &[JsonProbe] = &[
    JsonProbe::Key("datePosted"),
    JsonProbe::Key("publishedAt"),
    JsonProbe::Key("createdAt"),
    JsonProbe::Key("date"),
];

const START_DATE: &[JsonProbe] = &[
    JsonProbe::Key("startDate"),
    JsonProbe::Key("ausbildungsbeginn"),
    JsonProbe::Key("beginnDate"),
    JsonProbe::Key("start"),
];

const DESCRIPTION_HTML: &[JsonProbe] = &[
    JsonProbe::Key("description"),
    JsonProbe::Key("descriptionHtml"),
];

const SALARY: &[JsonProbe] = &[
    JsonProbe::Key("salary"),
    JsonProbe::Key("gehalt"),
    JsonProbe::Path(&["baseSalary", "value"]),
    JsonProbe::Key("verguetung"),
];

const JOB_TYPE: &[JsonProbe] = &[
    JsonProbe::Key("jobType"),
    JsonProbe::Key("employmentType"),
];

const URL: &[JsonProbe] = &[
    JsonProbe::Key("url"),
    JsonProbe::Key("href"),
    JsonProbe::Key("link"),
];

/// Pagination-metadata locations, in rank order.
const PAGINATION_PATHS: &[&[&str]] = &[
    &["pagination"],
    &["meta", "pagination"],
    &["data", "pagination"],
    &["paging"],
];

fn value_at<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for segment in path {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Render a scalar payload value as a field string. Objects, arrays, nulls,
/// and empty strings are "not defined" for probing purposes.
fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Evaluate an ordered probe list against one payload item, taking the first
/// defined value. Remaining probes are never consulted after a hit.
pub fn probe_first(item: &Value, probes: &[JsonProbe]) -> Option<String> {
    probes.iter().find_map(|probe| match probe {
        JsonProbe::Key(key) => item.get(key).and_then(scalar_string),
        JsonProbe::Path(path) => value_at(item, path).and_then(scalar_string),
        JsonProbe::Flag(key, literal) => match item.get(key) {
            Some(Value::Bool(true)) => Some((*literal).to_string()),
            _ => None,
        },
    })
}

/// Tier 1 extractor for the Next.js data endpoint.
#[derive(Debug)]
pub struct ApiExtractor {
    /// Record count at which a page with no explicit pagination signal is
    /// treated as full, i.e. "probably more pages exist". A guess about the
    /// channel's page size: too low issues one harmless extra request, too
    /// high stops one page early.
    pub full_page_threshold: usize,
}

impl Default for ApiExtractor {
    fn default() -> Self {
        Self {
            full_page_threshold: 20,
        }
    }
}

impl ApiExtractor {
    /// Build the per-page endpoint URL, omitting empty search parameters.
    pub fn endpoint_url(
        &self,
        build_id: &str,
        page: u64,
        keyword: &str,
        location: &str,
        beruf: &str,
    ) -> String {
        let mut url = format!("{BASE_URL}/_next/data/{build_id}/suche.json?page={page}");
        if !keyword.trim().is_empty() {
            url.push_str(&format!("&was={}", urlencoding::encode(keyword.trim())));
        }
        if !location.trim().is_empty() {
            url.push_str(&format!("&wo={}", urlencoding::encode(location.trim())));
        }
        if !beruf.trim().is_empty() {
            url.push_str(&format!("&beruf={}", urlencoding::encode(beruf.trim())));
        }
        url
    }

    /// Fetch one endpoint page as JSON.
    ///
    /// Network and parse failures are logged and yield `None` — the caller
    /// counts them toward the consecutive-failure threshold instead of
    /// aborting the run.
    #[instrument(level = "debug", skip(self, fetcher))]
    pub async fn fetch_page(
        &self,
        fetcher: &Fetcher,
        build_id: &str,
        page: u64,
        keyword: &str,
        location: &str,
        beruf: &str,
    ) -> Option<Value> {
        let url = self.endpoint_url(build_id, page, keyword, location, beruf);
        debug!(%url, "Fetching data endpoint page");
        match fetcher.get_json(&url).await {
            Ok(payload) => Some(payload),
            Err(e) => {
                warn!(page, error = %e, "Data endpoint fetch failed");
                None
            }
        }
    }

    /// Extract job records and the continuation signal from a payload.
    ///
    /// The job array is located via [`JOB_ARRAY_PATHS`] (first non-empty
    /// array wins); each item is mapped through the per-field probe tables.
    /// Items without a resolvable absolute URL are dropped, and duplicate
    /// URLs within the page collapse to the first occurrence.
    pub fn parse_page(&self, payload: &Value) -> ExtractionOutcome {
        let root = payload.get("pageProps").unwrap_or(payload);

        let items = JOB_ARRAY_PATHS
            .iter()
            .filter_map(|path| value_at(root, path))
            .filter_map(|v| v.as_array())
            .find(|arr| !arr.is_empty());

        let jobs: Vec<JobRecord> = match items {
            Some(items) => items
                .iter()
                .filter_map(|item| self.map_item(item))
                .unique_by(|job| job.url.clone())
                .collect(),
            None => Vec::new(),
        };

        let pagination = PAGINATION_PATHS
            .iter()
            .filter_map(|path| value_at(root, path))
            .find(|v| v.is_object());

        let (has_explicit_more, total_pages) = match pagination {
            Some(p) => {
                let explicit = p.get("hasNext").and_then(Value::as_bool) == Some(true)
                    || p.get("hasMore").and_then(Value::as_bool) == Some(true)
                    || p.get("nextPage").is_some()
                    || p.get("next").is_some();
                let total = ["totalPages", "total_pages", "lastPage"]
                    .iter()
                    .filter_map(|k| p.get(k))
                    .find_map(Value::as_u64);
                (explicit, total)
            }
            None => (false, None),
        };

        // Absent any explicit signal, a full page means "probably more".
        let got_full_page = jobs.len() >= self.full_page_threshold;

        ExtractionOutcome {
            has_more: has_explicit_more || got_full_page,
            total_pages,
            jobs,
        }
    }

    /// Map a single payload item into a record; `None` when no URL resolves.
    fn map_item(&self, item: &Value) -> Option<JobRecord> {
        let url = probe_first(item, URL)
            .or_else(|| {
                item.get("slug")
                    .and_then(scalar_string)
                    .map(|slug| format!("{BASE_URL}/stellen/{slug}/"))
            })
            .and_then(|href| to_abs(&href, BASE_URL))?;

        let description_html = probe_first(item, DESCRIPTION_HTML);
        let description_text = item
            .get("descriptionText")
            .and_then(scalar_string)
            .or_else(|| description_html.as_deref().map(clean_text))
            .filter(|s| !s.is_empty());

        Some(JobRecord {
            title: probe_first(item, TITLE),
            company: probe_first(item, COMPANY),
            location: probe_first(item, LOCATION),
            bundesland: probe_first(item, BUNDESLAND),
            beruf: probe_first(item, BERUF),
            ausbildungsart: probe_first(item, AUSBILDUNGSART),
            date_posted: probe_first(item, DATE_POSTED),
            start_date: probe_first(item, START_DATE),
            salary: probe_first(item, SALARY),
            job_type: probe_first(item, JOB_TYPE),
            sidebar_info: None,
            description_html,
            description_text,
            url,
        })
    }
}

/// Why the Tier 1 loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The quota was met.
    QuotaMet,
    /// The page cap was reached.
    PageCapReached,
    /// Consecutive failures hit [`MAX_CONSECUTIVE_FAILURES`].
    ChannelExhausted,
    /// The continuation signal said no-more and the page was short.
    LastPage,
}

/// Outcome of registering one page attempt with the loop bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStep {
    /// Request the next page.
    Continue,
    /// Exit the Tier 1 loop.
    Stop(StopReason),
}

/// Pure bookkeeping for the Tier 1 pagination loop.
///
/// Tracks the current page, the consecutive-failure count, and whether any
/// page produced records. The async loop in the orchestrator asks
/// [`Tier1Loop::next_page`] before each request and feeds the result back via
/// [`Tier1Loop::register_failure`] or [`Tier1Loop::register_page`].
#[derive(Debug)]
pub struct Tier1Loop {
    page: u64,
    consecutive_failures: u32,
    produced_any: bool,
}

impl Default for Tier1Loop {
    fn default() -> Self {
        Self::new()
    }
}

impl Tier1Loop {
    pub fn new() -> Self {
        Self {
            page: 1,
            consecutive_failures: 0,
            produced_any: false,
        }
    }

    /// The page to request next, or the reason not to.
    pub fn next_page(&self, quota_met: bool, max_pages: u64) -> Result<u64, StopReason> {
        if quota_met {
            Err(StopReason::QuotaMet)
        } else if self.page > max_pages {
            Err(StopReason::PageCapReached)
        } else {
            Ok(self.page)
        }
    }

    /// Whether any page in this run yielded records.
    pub fn produced_any(&self) -> bool {
        self.produced_any
    }

    /// Register a page that returned no data or zero parsed jobs.
    pub fn register_failure(&mut self) -> LoopStep {
        self.consecutive_failures += 1;
        if self.consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
            return LoopStep::Stop(StopReason::ChannelExhausted);
        }
        // Try the next page before giving up on the channel.
        self.page += 1;
        LoopStep::Continue
    }

    /// Register a page that yielded records.
    pub fn register_page(
        &mut self,
        parsed_count: usize,
        has_more: bool,
        full_page_threshold: usize,
    ) -> LoopStep {
        self.consecutive_failures = 0;
        self.produced_any = true;
        self.page += 1;
        if !has_more && parsed_count < full_page_threshold {
            return LoopStep::Stop(StopReason::LastPage);
        }
        LoopStep::Continue
    }
}
