//! Reconciler: merge tier results into one canonical record.
//!
//! Up to three partial views of the same posting exist when a detail page
//! has been processed: the embedded JSON-LD block (Tier 2), the markup
//! heuristics (Tier 3), and the [`BasicInfo`] carried over from the list
//! page. Each field resolves independently with precedence
//! **Tier 2 > Tier 3 > BasicInfo > null**: embedded structured data, when
//! present, is site-maintained and machine-readable, heuristic scraping is
//! more current than a stale list-page summary.
//!
//! Fields JSON-LD cannot express — `bundesland`, `beruf`, `ausbildungsart`,
//! `sidebar_info` — are sourced from Tier 3 only.

use crate::extract::jsonld::JsonLdPosting;
use crate::extract::markup::DetailFields;
use crate::models::{BasicInfo, JobRecord};
use crate::utils::clean_text;

/// Merge the tier views of one posting into its canonical record.
///
/// `description_text` is taken directly from Tier 3 when it derived one,
/// otherwise it is derived from whichever `description_html` won the merge.
pub fn merge(
    url: String,
    jsonld: Option<JsonLdPosting>,
    detail: DetailFields,
    basic: BasicInfo,
) -> JobRecord {
    let jsonld = jsonld.unwrap_or_default();

    let description_html = jsonld.description_html.or(detail.description_html);
    let description_text = detail
        .description_text
        .or_else(|| {
            description_html
                .as_deref()
                .map(clean_text)
                .filter(|t| !t.is_empty())
        });

    JobRecord {
        title: jsonld.title.or(detail.title).or(basic.title),
        company: jsonld.company.or(detail.company).or(basic.company),
        location: jsonld.location.or(detail.location).or(basic.location),
        bundesland: detail.bundesland,
        beruf: detail.beruf,
        ausbildungsart: detail.ausbildungsart,
        date_posted: jsonld.date_posted,
        start_date: jsonld.start_date.or(detail.start_date),
        salary: jsonld.salary,
        job_type: jsonld.job_type,
        sidebar_info: detail.sidebar_info,
        description_html,
        description_text,
        url,
    }
}
