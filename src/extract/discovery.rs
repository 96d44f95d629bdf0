//! Channel-discovery probe: recover the Next.js build token.
//!
//! The structured-data endpoint (`/_next/data/<buildId>/suche.json`) can only
//! be addressed with an opaque build token that changes across site
//! deployments. This module fetches the search landing page once and tries a
//! ranked list of textual patterns against the body, falling back to parsing
//! the embedded `__NEXT_DATA__` bootstrap block.
//!
//! Token absence is a normal outcome, not an error: it simply disables
//! Tier 1 and the orchestrator proceeds with the HTML crawl. A fetch failure
//! degrades to "not found" for the same reason — no retry is performed.

use crate::fetch::Fetcher;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info, instrument, warn};

/// The search landing page the token is scraped from.
pub const SEARCH_URL: &str = "https://www.ausbildung.de/suche/";

/// Token patterns in rank order; the first capture wins.
static TOKEN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r#"buildId["':\s]+["']?([a-zA-Z0-9_-]+)"#).unwrap(),
        Regex::new(r#""buildId":"([^"]+)""#).unwrap(),
        Regex::new(r#"buildId['"]\s*:\s*['"]([\w-]+)['"]"#).unwrap(),
        Regex::new(r#"_buildId["']?\s*:\s*["']([^"']+)["']"#).unwrap(),
    ]
});

/// Bootstrap-data block fallback.
static NEXT_DATA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"<script id="__NEXT_DATA__"[^>]*>([^<]+)</script>"#).unwrap());

/// Fetch the landing page and try to recover a build token.
///
/// Returns `None` when neither the patterns nor the bootstrap block yield a
/// token, or when the single fetch fails.
#[instrument(level = "info", skip_all)]
pub async fn discover_build_token(fetcher: &Fetcher) -> Option<String> {
    info!(url = SEARCH_URL, "Extracting build token");
    match fetcher.get_text(SEARCH_URL).await {
        Ok(body) => {
            let token = token_from_body(&body);
            match &token {
                Some(t) => info!(token = %t, "Extracted build token"),
                None => {
                    warn!("Could not extract build token from HTML");
                    debug!(
                        body_preview = %truncate_for_log(&body, 300),
                        "Landing page body matched no token pattern"
                    );
                }
            }
            token
        }
        Err(e) => {
            warn!(error = %e, "Build token extraction failed");
            None
        }
    }
}

/// Scan a landing-page body for the build token.
///
/// Tries each pattern in rank order (first occurrence, not all), then the
/// `__NEXT_DATA__` bootstrap JSON's `buildId` field.
pub fn token_from_body(body: &str) -> Option<String> {
    for pattern in TOKEN_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(body) {
            if let Some(m) = caps.get(1) {
                if !m.as_str().is_empty() {
                    return Some(m.as_str().to_string());
                }
            }
        }
    }

    let caps = NEXT_DATA_RE.captures(body)?;
    let parsed: serde_json::Value = serde_json::from_str(caps.get(1)?.as_str()).ok()?;
    parsed
        .get("buildId")
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_from_quoted_json() {
        let body = r#"<script>{"props":{},"buildId":"xK9_abc-123","page":"/suche"}</script>"#;
        assert_eq!(token_from_body(body).as_deref(), Some("xK9_abc-123"));
    }

    #[test]
    fn test_token_from_single_quoted_assignment() {
        let body = "var cfg = { buildId: 'dev-build-42' };";
        assert_eq!(token_from_body(body).as_deref(), Some("dev-build-42"));
    }

    #[test]
    fn test_first_pattern_occurrence_wins() {
        let body = r#""buildId":"first" ... "buildId":"second""#;
        assert_eq!(token_from_body(body).as_deref(), Some("first"));
    }

    #[test]
    fn test_next_data_fallback() {
        // No inline buildId assignment; only the bootstrap block carries it.
        let body = r#"<html><script id="__NEXT_DATA__" type="application/json">{"page":"/suche","props":{}}</script></html>"#;
        assert_eq!(token_from_body(body), None);

        let body = r#"<html><script id="__NEXT_DATA__" type="application/json">{"page":"/suche","buildPk":"zzz","buildId":"boot-789"}</script></html>"#;
        // The loose first pattern already matches `"buildId":"boot-789"`, which
        // is exactly the behavior we want: patterns rank above the bootstrap parse.
        assert_eq!(token_from_body(body).as_deref(), Some("boot-789"));
    }

    #[test]
    fn test_no_token_anywhere() {
        let body = "<html><body>Keine Treffer</body></html>";
        assert_eq!(token_from_body(body), None);
    }
}
