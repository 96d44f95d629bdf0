//! Tier 2: embedded JSON-LD schema extractor.
//!
//! Detail pages often carry a structured-data block
//! (`<script type="application/ld+json">`) describing the posting as a
//! schema.org `JobPosting`. When present it is site-maintained and
//! machine-readable, which is why the reconciler ranks it above heuristic
//! markup scraping.
//!
//! Absence is expected on many pages and is not an error; malformed JSON in
//! any one block is swallowed and the scan continues to the next block.

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;

static LD_JSON_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"script[type="application/ld+json"]"#).unwrap());

/// The canonical subset of fields a `JobPosting` block can contribute.
#[derive(Debug, Clone, Default)]
pub struct JsonLdPosting {
    pub title: Option<String>,
    pub company: Option<String>,
    pub date_posted: Option<String>,
    pub description_html: Option<String>,
    pub location: Option<String>,
    pub salary: Option<String>,
    pub job_type: Option<String>,
    pub start_date: Option<String>,
}

/// Scan all structured-data blocks and return the first `JobPosting`.
///
/// Each block parses as either a single object or an array of objects; the
/// declared type is checked both as a scalar `@type` and as an array of
/// types. Returns `None` when no block matches.
pub fn extract_job_posting(doc: &Html) -> Option<JsonLdPosting> {
    for script in doc.select(&LD_JSON_SEL) {
        let raw = script.text().collect::<String>();
        let Ok(parsed) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        let entries = match parsed {
            Value::Array(entries) => entries,
            other => vec![other],
        };
        for entry in &entries {
            if is_job_posting(entry) {
                return Some(map_posting(entry));
            }
        }
    }
    None
}

fn is_job_posting(entry: &Value) -> bool {
    let declared = entry.get("@type").or_else(|| entry.get("type"));
    match declared {
        Some(Value::String(t)) => t == "JobPosting",
        Some(Value::Array(types)) => types
            .iter()
            .any(|t| t.as_str() == Some("JobPosting")),
        _ => false,
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn string_at(entry: &Value, path: &[&str]) -> Option<String> {
    let mut current = entry;
    for segment in path {
        current = current.get(segment)?;
    }
    scalar_string(current)
}

fn map_posting(entry: &Value) -> JsonLdPosting {
    JsonLdPosting {
        title: entry
            .get("title")
            .and_then(scalar_string)
            .or_else(|| entry.get("name").and_then(scalar_string)),
        company: string_at(entry, &["hiringOrganization", "name"]),
        date_posted: entry.get("datePosted").and_then(scalar_string),
        description_html: entry.get("description").and_then(scalar_string),
        location: string_at(entry, &["jobLocation", "address", "addressLocality"])
            .or_else(|| string_at(entry, &["jobLocation", "address", "addressRegion"])),
        salary: string_at(entry, &["baseSalary", "value", "value"])
            .or_else(|| string_at(entry, &["baseSalary", "value"])),
        job_type: entry.get("employmentType").and_then(scalar_string),
        start_date: entry.get("validThrough").and_then(scalar_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(blocks: &[&str]) -> Html {
        let scripts = blocks
            .iter()
            .map(|b| format!(r#"<script type="application/ld+json">{b}</script>"#))
            .collect::<String>();
        Html::parse_document(&format!("<html><head>{scripts}</head><body></body></html>"))
    }

    #[test]
    fn test_extracts_job_posting_fields() {
        let doc = page(&[r#"{
            "@context": "https://schema.org/",
            "@type": "JobPosting",
            "title": "Ausbildung zur Pflegefachkraft",
            "hiringOrganization": {"@type": "Organization", "name": "Klinikum Dortmund"},
            "datePosted": "2026-02-01",
            "description": "<p>Pflege mit Herz</p>",
            "jobLocation": {"address": {"addressLocality": "Dortmund", "addressRegion": "NRW"}},
            "baseSalary": {"value": {"value": 1250}},
            "employmentType": "FULL_TIME",
            "validThrough": "2026-09-01"
        }"#]);

        let posting = extract_job_posting(&doc).unwrap();
        assert_eq!(posting.title.as_deref(), Some("Ausbildung zur Pflegefachkraft"));
        assert_eq!(posting.company.as_deref(), Some("Klinikum Dortmund"));
        assert_eq!(posting.date_posted.as_deref(), Some("2026-02-01"));
        assert_eq!(posting.description_html.as_deref(), Some("<p>Pflege mit Herz</p>"));
        assert_eq!(posting.location.as_deref(), Some("Dortmund"));
        assert_eq!(posting.salary.as_deref(), Some("1250"));
        assert_eq!(posting.job_type.as_deref(), Some("FULL_TIME"));
        assert_eq!(posting.start_date.as_deref(), Some("2026-09-01"));
    }

    #[test]
    fn test_type_as_array() {
        let doc = page(&[r#"{"@type": ["Thing", "JobPosting"], "title": "Array-Typ"}"#]);
        let posting = extract_job_posting(&doc).unwrap();
        assert_eq!(posting.title.as_deref(), Some("Array-Typ"));
    }

    #[test]
    fn test_block_as_array_of_entries() {
        let doc = page(&[r#"[
            {"@type": "BreadcrumbList"},
            {"@type": "JobPosting", "name": "Aus dem Array"}
        ]"#]);
        let posting = extract_job_posting(&doc).unwrap();
        assert_eq!(posting.title.as_deref(), Some("Aus dem Array"));
    }

    #[test]
    fn test_malformed_block_is_skipped() {
        let doc = page(&[
            r#"{"@type": "JobPosting", "title": "kaputt"#,
            r#"{"@type": "JobPosting", "title": "Intakt"}"#,
        ]);
        let posting = extract_job_posting(&doc).unwrap();
        assert_eq!(posting.title.as_deref(), Some("Intakt"));
    }

    #[test]
    fn test_non_job_posting_types_are_ignored() {
        let doc = page(&[r#"{"@type": "Organization", "name": "Nur eine Firma"}"#]);
        assert!(extract_job_posting(&doc).is_none());
    }

    #[test]
    fn test_no_blocks_at_all() {
        let doc = Html::parse_document("<html><body><h1>Stelle</h1></body></html>");
        assert!(extract_job_posting(&doc).is_none());
    }

    #[test]
    fn test_region_falls_back_when_locality_missing() {
        let doc = page(&[r#"{
            "@type": "JobPosting",
            "jobLocation": {"address": {"addressRegion": "Bayern"}}
        }"#]);
        let posting = extract_job_posting(&doc).unwrap();
        assert_eq!(posting.location.as_deref(), Some("Bayern"));
    }
}
