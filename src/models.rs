//! Data models for job postings and tier-level intermediate results.
//!
//! This module defines the core data structures used throughout the scraper:
//! - [`JobRecord`]: The canonical output unit, one per accepted posting
//! - [`BasicInfo`]: Partial record captured from a list page, carried as
//!   context into the detail fetch for that URL
//! - [`ExtractionOutcome`]: Per-page result of a Tier 1 API request
//!
//! Field names follow the site's German domain vocabulary (`bundesland`,
//! `beruf`, `ausbildungsart`) so the serialized output matches what
//! downstream consumers of the dataset already expect.

use serde::Serialize;

/// A job posting in its canonical output shape.
///
/// Every field except `url` is optional: each of the three extraction tiers
/// can only recover a subset, and the reconciler fills what it can. Absent
/// fields serialize as explicit `null`s so the output rows keep a stable
/// column set.
///
/// # Identity
///
/// `url` is the record's identity key. It is always an absolute URL resolved
/// against the site base; candidates whose URL cannot be resolved are
/// discarded before they ever become a `JobRecord`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct JobRecord {
    /// The job title/headline.
    pub title: Option<String>,
    /// The hiring company's name.
    pub company: Option<String>,
    /// The posting's city or locality.
    pub location: Option<String>,
    /// The German federal state (Bundesland) the posting belongs to.
    pub bundesland: Option<String>,
    /// The profession category (Beruf).
    pub beruf: Option<String>,
    /// The training type (Ausbildungsart), e.g. "Duales Studium".
    pub ausbildungsart: Option<String>,
    /// Publication date as reported by the site.
    pub date_posted: Option<String>,
    /// Training start date.
    pub start_date: Option<String>,
    /// The posting description as raw HTML.
    pub description_html: Option<String>,
    /// Markup-stripped, whitespace-normalized form of the description.
    pub description_text: Option<String>,
    /// Salary/compensation text or amount.
    pub salary: Option<String>,
    /// Employment type, e.g. "FULL_TIME".
    pub job_type: Option<String>,
    /// Free text from the detail page's facts sidebar.
    pub sidebar_info: Option<String>,
    /// Canonical absolute URL of the posting. The record's identity key.
    pub url: String,
}

/// Partial job data captured from a list-page card.
///
/// Owned by the pagination loop for the lifetime of one detail request and
/// superseded by the reconciler's merged result. When detail collection is
/// disabled it is emitted directly via [`BasicInfo::into_record`].
#[derive(Debug, Clone, Default)]
pub struct BasicInfo {
    /// Absolute detail-page URL resolved from the card's link.
    pub url: String,
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
}

impl BasicInfo {
    /// Promote list-level data to a full record with all detail fields empty.
    pub fn into_record(self) -> JobRecord {
        JobRecord {
            title: self.title,
            company: self.company,
            location: self.location,
            url: self.url,
            ..JobRecord::default()
        }
    }
}

/// The per-page result of a Tier 1 API request.
///
/// Consumed immediately by the orchestrator to decide whether to request the
/// next page or fall back to the crawl phase.
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    /// Records parsed from this page, in payload order.
    pub jobs: Vec<JobRecord>,
    /// Whether more pages likely exist. True on an explicit pagination flag,
    /// or heuristically when the page was full (see Tier 1 extractor).
    pub has_more: bool,
    /// Total page count when the payload reports one.
    pub total_pages: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_record_serializes_absent_fields_as_null() {
        let record = JobRecord {
            title: Some("Ausbildung zum Mechatroniker".to_string()),
            url: "https://www.ausbildung.de/stellen/abc/".to_string(),
            ..JobRecord::default()
        };

        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains(r#""title":"Ausbildung zum Mechatroniker""#));
        assert!(json.contains(r#""company":null"#));
        assert!(json.contains(r#""bundesland":null"#));
        assert!(json.contains(r#""url":"https://www.ausbildung.de/stellen/abc/""#));
    }

    #[test]
    fn test_basic_info_into_record() {
        let basic = BasicInfo {
            url: "https://www.ausbildung.de/stellen/xyz/".to_string(),
            title: Some("Titel".to_string()),
            company: Some("Firma GmbH".to_string()),
            location: None,
        };

        let record = basic.into_record();
        assert_eq!(record.url, "https://www.ausbildung.de/stellen/xyz/");
        assert_eq!(record.title.as_deref(), Some("Titel"));
        assert_eq!(record.company.as_deref(), Some("Firma GmbH"));
        assert!(record.location.is_none());
        assert!(record.description_html.is_none());
    }

    #[test]
    fn test_extraction_outcome_default_is_empty() {
        let outcome = ExtractionOutcome::default();
        assert!(outcome.jobs.is_empty());
        assert!(!outcome.has_more);
        assert!(outcome.total_pages.is_none());
    }
}
