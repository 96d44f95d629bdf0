//! Utility functions for URL resolution, text cleanup, and file system checks.
//!
//! This module provides helper functions used throughout the scraper:
//! - URL resolution against the site base for record identity
//! - Markup stripping and whitespace normalization for description text
//! - String truncation for logging
//! - File system validation for the output directory

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html};
use std::error::Error;
use std::fs as stdfs;
use tokio::fs;
use tracing::{info, instrument};
use url::Url;

/// The site base every relative href is resolved against.
pub const BASE_URL: &str = "https://www.ausbildung.de";

static BASE: Lazy<Url> = Lazy::new(|| Url::parse(BASE_URL).unwrap());

/// Resolve an href to its canonical absolute form.
///
/// Relative hrefs (`/stellen/abc/`) resolve against `base` (or the site base
/// when `base` itself fails to parse). Unresolvable hrefs — empty strings,
/// invalid syntax, or non-HTTP schemes like `javascript:` and `mailto:` —
/// yield `None`, and the record owning them is dropped before emission.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(to_abs("/stellen/abc/", BASE_URL).as_deref(),
///            Some("https://www.ausbildung.de/stellen/abc/"));
/// assert_eq!(to_abs("", BASE_URL), None);
/// ```
pub fn to_abs(href: &str, base: &str) -> Option<String> {
    if href.trim().is_empty() {
        return None;
    }
    let base = Url::parse(base).unwrap_or_else(|_| BASE.clone());
    let resolved = base.join(href).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Strip markup from an HTML fragment and normalize whitespace.
///
/// Script, style, noscript, and iframe subtrees contribute no text; all
/// remaining text nodes are concatenated and runs of whitespace collapse to
/// single spaces. Used to derive `description_text` from `description_html`.
pub fn clean_text(html: &str) -> String {
    if html.is_empty() {
        return String::new();
    }
    let fragment = Html::parse_fragment(html);
    let mut out = String::new();
    push_visible_text(fragment.root_element(), &mut out);
    normalize_ws(&out)
}

const NOISE_TAGS: &[&str] = &["script", "style", "noscript", "iframe"];

fn push_visible_text(el: ElementRef, out: &mut String) {
    if NOISE_TAGS.contains(&el.value().name()) {
        return;
    }
    for child in el.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_el) = ElementRef::wrap(child) {
            push_visible_text(child_el, out);
        }
    }
}

/// Collapse all whitespace runs to single spaces and trim the ends.
pub fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate a string for logging purposes.
///
/// Long strings are truncated to `max` bytes with an ellipsis and byte count
/// indicator appended.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut cut = max;
        while cut > 0 && !s.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
    }
}

/// Ensure a directory exists and is writable.
///
/// Creates the directory if it doesn't exist, then performs a write test by
/// creating and immediately deleting a probe file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or is not writable
/// (permission denied, read-only filesystem, etc.).
#[instrument(level = "info", skip_all, fields(path = %path))]
pub async fn ensure_writable_dir(path: &str) -> Result<(), Box<dyn Error>> {
    if let Err(e) = fs::create_dir_all(path).await {
        return Err(Box::new(e));
    }
    // Try a small sync write using std fs (simpler error surface)
    let probe_path = format!("{}/..__probe_write__", path.trim_end_matches('/'));
    match stdfs::File::create(&probe_path) {
        Ok(_) => {
            let _ = stdfs::remove_file(&probe_path);
            info!("Output directory is writable");
            Ok(())
        }
        Err(e) => Err(Box::new(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_abs_relative_href() {
        assert_eq!(
            to_abs("/stellen/abc/", BASE_URL).as_deref(),
            Some("https://www.ausbildung.de/stellen/abc/")
        );
    }

    #[test]
    fn test_to_abs_already_absolute() {
        assert_eq!(
            to_abs("https://www.ausbildung.de/stellen/xyz/", BASE_URL).as_deref(),
            Some("https://www.ausbildung.de/stellen/xyz/")
        );
    }

    #[test]
    fn test_to_abs_resolves_against_other_base() {
        assert_eq!(
            to_abs("seite-2", "https://www.ausbildung.de/suche/").as_deref(),
            Some("https://www.ausbildung.de/suche/seite-2")
        );
    }

    #[test]
    fn test_to_abs_empty_href_is_unresolvable() {
        assert_eq!(to_abs("", BASE_URL), None);
        assert_eq!(to_abs("   ", BASE_URL), None);
    }

    #[test]
    fn test_to_abs_rejects_non_http_schemes() {
        assert_eq!(to_abs("javascript:void(0)", BASE_URL), None);
        assert_eq!(to_abs("mailto:jobs@example.de", BASE_URL), None);
    }

    #[test]
    fn test_clean_text_strips_markup() {
        let html = "<div><p>Deine  Ausbildung</p> <b>bei uns</b></div>";
        assert_eq!(clean_text(html), "Deine Ausbildung bei uns");
    }

    #[test]
    fn test_clean_text_drops_script_and_style() {
        let html = "<div>Sichtbar<script>var x = 1;</script><style>.a{}</style></div>";
        assert_eq!(clean_text(html), "Sichtbar");
    }

    #[test]
    fn test_clean_text_empty_input() {
        assert_eq!(clean_text(""), "");
    }

    #[test]
    fn test_normalize_ws() {
        assert_eq!(normalize_ws("  a \n\t b  "), "a b");
    }

    #[test]
    fn test_truncate_for_log_short_string() {
        assert_eq!(truncate_for_log("Hello, world!", 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }
}
