//! Tier 3: heuristic markup extractor.
//!
//! The last-resort channel: cascading CSS selectors against raw page markup.
//! Three independent contracts live here:
//!
//! - **List extraction** ([`extract_list`]): job cards from a search-results
//!   page, with broader fallback selectors when the site's card class is
//!   absent.
//! - **Detail extraction** ([`extract_detail`]): per-field strategy tables
//!   run structural → labeled-pair → free-text, independently per field;
//!   different fields may resolve at different depths on the same page.
//! - **Pagination-link discovery** ([`find_next_page`]): `rel="next"`, the
//!   site's pagination class, then an internationalized text match that
//!   excludes "previous" tokens to avoid reversing direction.
//!
//! Each strategy is a pure function from document to optional value; the
//! engine runs the ordered list and takes the first success, so new site
//! layouts are handled by adding a strategy, not by new branching.

use crate::models::BasicInfo;
use crate::utils::{clean_text, normalize_ws, to_abs};
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

// ---- Selectors ----

static CARD_PRIMARY_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(".c-jobCard").unwrap());
static STELLEN_ANCHOR_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/stellen/"]"#).unwrap());
static H2_STELLEN_ANCHOR_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"h2 a[href*="/stellen/"]"#).unwrap());
static AUSBILDUNG_ANCHOR_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"a[href*="/ausbildung/"]"#).unwrap());

static CARD_H2_A_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h2 a").unwrap());
static CARD_H3_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").unwrap());
static CARD_H2_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h2").unwrap());
static CARD_TITLE_CLASS_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[class*="title"]"#).unwrap());
static CARD_COMPANY_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#".c-jobCard__company, [class*="company"]"#).unwrap());
static CARD_LOCATION_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#".c-jobCard__location, [class*="location"]"#).unwrap());

static DESC_PRIMARY_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".c-jobDetail__description").unwrap());
static DESC_FALLBACK_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[class*="job-description"], [class*="beschreibung"], .description"#).unwrap()
});
static SIDEBAR_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".c-jobDetail__sidebar, .c-jobDetail__facts").unwrap());

static LABEL_BEARER_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("dt, .label, strong").unwrap());
static INFO_ITEM_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[class*="info"], [class*="fact"], [class*="detail"]"#).unwrap()
});

static BUNDESLAND_CLASS_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[class*="bundesland"], [class*="state"], [class*="region"]"#).unwrap()
});
static BREADCRUMB_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#".breadcrumb, [class*="breadcrumb"], nav"#).unwrap());
static BERUF_CLASS_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(
        r#"[class*="beruf"], [class*="profession"], [class*="category"], [class*="berufsfeld"]"#,
    )
    .unwrap()
});
static META_KEYWORDS_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="keywords"]"#).unwrap());
static AUSBILDUNGSART_CLASS_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[class*="ausbildungsart"], [class*="training-type"], [class*="stellenart"]"#)
        .unwrap()
});
static H1_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static JOB_TITLE_CLASS_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[class*="job-title"]"#).unwrap());
static DETAIL_COMPANY_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[class*="company"], [class*="employer"], [class*="firma"]"#).unwrap()
});
static DETAIL_LOCATION_SEL: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"[class*="location"], [class*="ort"], [class*="standort"]"#).unwrap()
});
static START_CLASS_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"[class*="beginn"], [class*="start"]"#).unwrap());

static REL_NEXT_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse(r#"a[rel="next"]"#).unwrap());
static PAGINATION_NEXT_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".c-pagination__next").unwrap());
static ANCHOR_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

// ---- Patterns ----

fn label_re(src: &str) -> Regex {
    Regex::new(&format!("(?i){src}")).unwrap()
}

fn inline_re(src: &str) -> Regex {
    Regex::new(&format!(r"(?i)(?:{src})[:\s]+([^\n]+)")).unwrap()
}

const BUNDESLAND_LABEL: &str = r"bundesland|federal\s*state|region";
const BERUF_LABEL: &str = r"beruf|profession|kategorie|berufsfeld|fachrichtung";
const AUSBILDUNGSART_LABEL: &str = r"ausbildungsart|art\s*der\s*ausbildung|stellenart|training|typ";
const START_LABEL: &str = r"beginn|start|ab wann|ausbildungsbeginn";

static BUNDESLAND_LABEL_RE: Lazy<Regex> = Lazy::new(|| label_re(BUNDESLAND_LABEL));
static BUNDESLAND_INLINE_RE: Lazy<Regex> = Lazy::new(|| inline_re(BUNDESLAND_LABEL));
static BERUF_LABEL_RE: Lazy<Regex> = Lazy::new(|| label_re(BERUF_LABEL));
static BERUF_INLINE_RE: Lazy<Regex> = Lazy::new(|| inline_re(BERUF_LABEL));
static AUSBILDUNGSART_LABEL_RE: Lazy<Regex> = Lazy::new(|| label_re(AUSBILDUNGSART_LABEL));
static AUSBILDUNGSART_INLINE_RE: Lazy<Regex> = Lazy::new(|| inline_re(AUSBILDUNGSART_LABEL));
static START_LABEL_RE: Lazy<Regex> = Lazy::new(|| label_re(START_LABEL));
static START_INLINE_RE: Lazy<Regex> = Lazy::new(|| inline_re(START_LABEL));

/// The sixteen German federal states.
static STATES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(Baden-Württemberg|Bayern|Berlin|Brandenburg|Bremen|Hamburg|Hessen|Mecklenburg-Vorpommern|Niedersachsen|Nordrhein-Westfalen|Rheinland-Pfalz|Saarland|Sachsen|Sachsen-Anhalt|Schleswig-Holstein|Thüringen)",
    )
    .unwrap()
});

/// Training-type phrases scanned in page text, most specific first.
const TRAINING_TYPES: &[&str] = &[
    "Duale Ausbildung",
    "Schulische Ausbildung",
    "Duales Studium",
    "Praktikum",
    "Trainee",
];

static NEXT_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(weiter|next|›|»|>)").unwrap());
static PREV_TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(zurück|prev|back)").unwrap());

// ---- Small helpers ----

fn element_text(el: ElementRef) -> String {
    normalize_ws(&el.text().collect::<Vec<_>>().join(" "))
}

fn first_text_doc(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .map(element_text)
        .find(|t| !t.is_empty())
}

fn first_text_el(el: ElementRef, sel: &Selector) -> Option<String> {
    el.select(sel).map(element_text).find(|t| !t.is_empty())
}

fn first_attr_el(el: ElementRef, sel: &Selector, attr: &str) -> Option<String> {
    el.select(sel)
        .find_map(|m| m.value().attr(attr))
        .map(|s| s.to_string())
}

/// All matches' text concatenated, jQuery-`.text()` style.
fn joined_text(doc: &Html, sel: &Selector) -> String {
    doc.select(sel)
        .flat_map(|el| el.text())
        .collect::<Vec<_>>()
        .join(" ")
}

fn full_text(doc: &Html) -> String {
    doc.root_element().text().collect::<Vec<_>>().join(" ")
}

// ---- List extraction ----

/// Locate job cards, falling through broader selectors until any match.
fn collect_cards(doc: &Html) -> Vec<ElementRef<'_>> {
    let primary: Vec<_> = doc.select(&CARD_PRIMARY_SEL).collect();
    if !primary.is_empty() {
        return primary;
    }

    let anchored: Vec<_> = doc
        .select(&STELLEN_ANCHOR_SEL)
        .filter_map(|a| hoist_to_card(a, true))
        .collect();
    if !anchored.is_empty() {
        return anchored;
    }

    doc.select(&H2_STELLEN_ANCHOR_SEL)
        .filter_map(|a| hoist_to_card(a, false))
        .collect()
}

/// Walk up from an anchor to its enclosing card-like container.
fn hoist_to_card(anchor: ElementRef<'_>, require_card_class: bool) -> Option<ElementRef<'_>> {
    anchor.ancestors().filter_map(ElementRef::wrap).find(|el| {
        match el.value().name() {
            "article" | "li" => true,
            "div" => {
                !require_card_class
                    || el
                        .value()
                        .attr("class")
                        .is_some_and(|c| c.contains("card"))
            }
            _ => false,
        }
    })
}

/// Resolve a card's detail link via an ordered sequence of strategies.
fn card_link(card: ElementRef) -> Option<String> {
    first_attr_el(card, &CARD_H2_A_SEL, "href")
        .or_else(|| first_attr_el(card, &STELLEN_ANCHOR_SEL, "href"))
        .or_else(|| first_attr_el(card, &AUSBILDUNG_ANCHOR_SEL, "href"))
        .or_else(|| card.value().attr("href").map(str::to_string))
}

/// Extract list-level job summaries from a search-results page.
///
/// Cards yielding neither title nor company are discarded — too little
/// signal to be useful. Cards whose link does not resolve to an absolute
/// URL are discarded as well.
pub fn extract_list(doc: &Html, base_url: &str) -> Vec<BasicInfo> {
    let mut jobs = Vec::new();
    for card in collect_cards(doc) {
        let Some(href) = card_link(card) else {
            continue;
        };
        let Some(url) = to_abs(&href, base_url) else {
            continue;
        };

        let title = first_text_el(card, &CARD_H2_A_SEL)
            .or_else(|| first_text_el(card, &CARD_H3_SEL))
            .or_else(|| first_text_el(card, &CARD_H2_SEL))
            .or_else(|| first_text_el(card, &CARD_TITLE_CLASS_SEL));
        let company = first_text_el(card, &CARD_COMPANY_SEL);
        let location = first_text_el(card, &CARD_LOCATION_SEL);

        if title.is_some() || company.is_some() {
            jobs.push(BasicInfo {
                url,
                title,
                company,
                location,
            });
        }
    }
    // The hoisting fallbacks can surface the same container once per anchor.
    jobs.into_iter().unique_by(|j| j.url.clone()).collect()
}

// ---- Detail extraction ----

/// Fields recovered from a detail page by markup heuristics.
#[derive(Debug, Clone, Default)]
pub struct DetailFields {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub bundesland: Option<String>,
    pub beruf: Option<String>,
    pub ausbildungsart: Option<String>,
    pub start_date: Option<String>,
    pub description_html: Option<String>,
    pub description_text: Option<String>,
    pub sidebar_info: Option<String>,
}

type Strategy = fn(&Html) -> Option<String>;

/// Run an ordered strategy list, taking the first success.
fn first_hit(doc: &Html, strategies: &[Strategy]) -> Option<String> {
    strategies.iter().find_map(|strategy| strategy(doc))
}

/// Labeled-value scan: definition-list terms, elements classed "label", and
/// bold text, reading the adjacent value node when the label matches; then
/// inline `label: value` pairs inside info/fact/detail containers.
fn labeled_value(doc: &Html, label: &Regex, inline: &Regex) -> Option<String> {
    for el in doc.select(&LABEL_BEARER_SEL) {
        if !label.is_match(&element_text(el)) {
            continue;
        }
        let Some(sibling) = el.next_siblings().filter_map(ElementRef::wrap).next() else {
            continue;
        };
        let accepts = matches!(sibling.value().name(), "dd" | "span")
            || sibling
                .value()
                .attr("class")
                .is_some_and(|c| c.contains("value"));
        if accepts {
            let value = element_text(sibling);
            if !value.is_empty() {
                return Some(value);
            }
        }
    }

    for el in doc.select(&INFO_ITEM_SEL) {
        let text = el.text().collect::<Vec<_>>().join("\n");
        if let Some(caps) = inline.captures(&text) {
            let value = caps.get(1).map(|m| normalize_ws(m.as_str()));
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                return Some(v);
            }
        }
    }

    None
}

fn bundesland_structural(doc: &Html) -> Option<String> {
    first_text_doc(doc, &BUNDESLAND_CLASS_SEL)
}

fn bundesland_breadcrumb(doc: &Html) -> Option<String> {
    let crumbs = joined_text(doc, &BREADCRUMB_SEL);
    let full = full_text(doc);
    STATES_RE
        .captures(&crumbs)
        .or_else(|| STATES_RE.captures(&full))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

fn bundesland_labeled(doc: &Html) -> Option<String> {
    labeled_value(doc, &BUNDESLAND_LABEL_RE, &BUNDESLAND_INLINE_RE)
}

const BUNDESLAND_STRATEGIES: &[Strategy] = &[
    bundesland_structural,
    bundesland_breadcrumb,
    bundesland_labeled,
];

fn beruf_structural(doc: &Html) -> Option<String> {
    first_text_doc(doc, &BERUF_CLASS_SEL)
}

fn beruf_labeled(doc: &Html) -> Option<String> {
    labeled_value(doc, &BERUF_LABEL_RE, &BERUF_INLINE_RE)
}

fn beruf_meta_keywords(doc: &Html) -> Option<String> {
    let content = doc
        .select(&META_KEYWORDS_SEL)
        .find_map(|m| m.value().attr("content"))?;
    if !content.contains("Ausbildung") {
        return None;
    }
    content
        .split(',')
        .map(str::trim)
        .find(|p| {
            let len = p.chars().count();
            !p.contains("Ausbildung.de") && len > 5 && len < 50
        })
        .map(|p| p.to_string())
}

const BERUF_STRATEGIES: &[Strategy] = &[beruf_structural, beruf_labeled, beruf_meta_keywords];

fn ausbildungsart_structural(doc: &Html) -> Option<String> {
    first_text_doc(doc, &AUSBILDUNGSART_CLASS_SEL)
}

fn ausbildungsart_labeled(doc: &Html) -> Option<String> {
    labeled_value(doc, &AUSBILDUNGSART_LABEL_RE, &AUSBILDUNGSART_INLINE_RE)
}

fn ausbildungsart_phrase(doc: &Html) -> Option<String> {
    let text = full_text(doc);
    TRAINING_TYPES
        .iter()
        .find(|t| text.contains(**t))
        .map(|t| t.to_string())
}

fn ausbildungsart_from_title(doc: &Html) -> Option<String> {
    let title = first_text_doc(doc, &H1_SEL)?.to_lowercase();
    if title.contains("duales studium") {
        Some("Duales Studium".to_string())
    } else if title.contains("ausbildung") {
        Some("Ausbildung".to_string())
    } else {
        None
    }
}

const AUSBILDUNGSART_STRATEGIES: &[Strategy] = &[
    ausbildungsart_structural,
    ausbildungsart_labeled,
    ausbildungsart_phrase,
    ausbildungsart_from_title,
];

fn start_date_structural(doc: &Html) -> Option<String> {
    first_text_doc(doc, &START_CLASS_SEL)
}

fn start_date_labeled(doc: &Html) -> Option<String> {
    labeled_value(doc, &START_LABEL_RE, &START_INLINE_RE)
}

const START_DATE_STRATEGIES: &[Strategy] = &[start_date_structural, start_date_labeled];

fn description_html(doc: &Html) -> Option<String> {
    doc.select(&DESC_PRIMARY_SEL)
        .map(|el| el.inner_html())
        .find(|h| !h.trim().is_empty())
        .or_else(|| {
            doc.select(&DESC_FALLBACK_SEL)
                .map(|el| el.inner_html())
                .find(|h| !h.trim().is_empty())
        })
}

/// Extract detail-page fields via the per-field strategy tables.
pub fn extract_detail(doc: &Html) -> DetailFields {
    let description_html = description_html(doc);
    let description_text = description_html
        .as_deref()
        .map(clean_text)
        .filter(|t| !t.is_empty());

    let sidebar_info = Some(normalize_ws(&joined_text(doc, &SIDEBAR_SEL))).filter(|t| !t.is_empty());

    DetailFields {
        title: first_text_doc(doc, &H1_SEL)
            .or_else(|| first_text_doc(doc, &JOB_TITLE_CLASS_SEL)),
        company: first_text_doc(doc, &DETAIL_COMPANY_SEL),
        location: first_text_doc(doc, &DETAIL_LOCATION_SEL),
        bundesland: first_hit(doc, BUNDESLAND_STRATEGIES),
        beruf: first_hit(doc, BERUF_STRATEGIES),
        ausbildungsart: first_hit(doc, AUSBILDUNGSART_STRATEGIES),
        start_date: first_hit(doc, START_DATE_STRATEGIES),
        description_html,
        description_text,
        sidebar_info,
    }
}

// ---- Pagination ----

/// Find the "next page" link.
///
/// Tries `rel="next"`, then the site's pagination class, then a text match
/// against next-tokens (German and symbolic) that explicitly excludes tokens
/// meaning previous/back. Returns the first absolute URL found.
pub fn find_next_page(doc: &Html, base_url: &str) -> Option<String> {
    if let Some(href) = doc
        .select(&REL_NEXT_SEL)
        .find_map(|a| a.value().attr("href"))
    {
        return to_abs(href, base_url);
    }

    if let Some(href) = doc
        .select(&PAGINATION_NEXT_SEL)
        .find_map(|a| a.value().attr("href"))
    {
        return to_abs(href, base_url);
    }

    let candidate = doc.select(&ANCHOR_SEL).find(|a| {
        let text = element_text(*a);
        NEXT_TOKEN_RE.is_match(&text) && !PREV_TOKEN_RE.is_match(&text)
    })?;
    let href = candidate.value().attr("href")?;
    to_abs(href, base_url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::BASE_URL;

    const LIST_URL: &str = "https://www.ausbildung.de/suche/";

    #[test]
    fn test_extract_list_primary_cards() {
        let doc = Html::parse_document(
            r#"<html><body>
            <div class="c-jobCard">
                <h2><a href="/stellen/baecker-1/">Ausbildung zum Bäcker</a></h2>
                <span class="c-jobCard__company">Backhaus Kruse</span>
                <span class="c-jobCard__location">Bremen</span>
            </div>
            <div class="c-jobCard">
                <h2><a href="/stellen/koch-2/">Ausbildung zum Koch</a></h2>
                <span class="c-jobCard__company">Hotel Adler</span>
            </div>
            </body></html>"#,
        );
        let jobs = extract_list(&doc, LIST_URL);
        assert_eq!(jobs.len(), 2);
        assert_eq!(jobs[0].url, "https://www.ausbildung.de/stellen/baecker-1/");
        assert_eq!(jobs[0].title.as_deref(), Some("Ausbildung zum Bäcker"));
        assert_eq!(jobs[0].company.as_deref(), Some("Backhaus Kruse"));
        assert_eq!(jobs[0].location.as_deref(), Some("Bremen"));
    }

    #[test]
    fn test_extract_list_anchor_fallback() {
        // No .c-jobCard anywhere; cards are recovered from /stellen/ anchors
        // hoisted to their card-classed containers.
        let doc = Html::parse_document(
            r#"<html><body>
            <div class="result-card">
                <a href="/stellen/mechatroniker-3/">Mechatroniker (m/w/d)</a>
                <div class="company-name">Autohaus Weber</div>
            </div>
            </body></html>"#,
        );
        let jobs = extract_list(&doc, LIST_URL);
        assert_eq!(jobs.len(), 1);
        assert_eq!(
            jobs[0].url,
            "https://www.ausbildung.de/stellen/mechatroniker-3/"
        );
        assert_eq!(jobs[0].company.as_deref(), Some("Autohaus Weber"));
    }

    #[test]
    fn test_extract_list_discards_cards_without_signal() {
        let doc = Html::parse_document(
            r#"<html><body>
            <div class="c-jobCard"><a href="/stellen/leer-4/"><img src="x.png"></a></div>
            </body></html>"#,
        );
        assert!(extract_list(&doc, LIST_URL).is_empty());
    }

    #[test]
    fn test_extract_list_discards_unresolvable_links() {
        let doc = Html::parse_document(
            r#"<html><body>
            <div class="c-jobCard">
                <h2><a href="javascript:void(0)">Kein Ziel</a></h2>
                <span class="c-jobCard__company">Firma</span>
            </div>
            </body></html>"#,
        );
        assert!(extract_list(&doc, LIST_URL).is_empty());
    }

    #[test]
    fn test_extract_list_dedupes_hoisted_containers() {
        // Two anchors in the same list item must not produce two cards.
        let doc = Html::parse_document(
            r#"<html><body><ul>
            <li>
                <a href="/stellen/doppelt-5/"><h3>Titel</h3></a>
                <a href="/stellen/doppelt-5/">Mehr erfahren</a>
            </li>
            </ul></body></html>"#,
        );
        let jobs = extract_list(&doc, LIST_URL);
        assert_eq!(jobs.len(), 1);
    }

    #[test]
    fn test_detail_labeled_value_from_definition_list() {
        let doc = Html::parse_document(
            r#"<html><body>
            <dl>
                <dt>Ausbildungsbeginn</dt><dd>01.08.2026</dd>
                <dt>Bundesland</dt><dd>Hessen</dd>
            </dl>
            </body></html>"#,
        );
        let fields = extract_detail(&doc);
        assert_eq!(fields.start_date.as_deref(), Some("01.08.2026"));
        assert_eq!(fields.bundesland.as_deref(), Some("Hessen"));
    }

    #[test]
    fn test_detail_bundesland_from_breadcrumb() {
        let doc = Html::parse_document(
            r#"<html><body>
            <nav class="breadcrumb">Start › Nordrhein-Westfalen › Dortmund</nav>
            <h1>Ausbildung zur Fachkraft für Lagerlogistik</h1>
            </body></html>"#,
        );
        let fields = extract_detail(&doc);
        assert_eq!(fields.bundesland.as_deref(), Some("Nordrhein-Westfalen"));
    }

    #[test]
    fn test_detail_ausbildungsart_phrase_scan() {
        let doc = Html::parse_document(
            r#"<html><body>
            <h1>Fachinformatiker (m/w/d)</h1>
            <p>Wir bieten eine Duale Ausbildung mit Übernahmegarantie.</p>
            </body></html>"#,
        );
        let fields = extract_detail(&doc);
        assert_eq!(fields.ausbildungsart.as_deref(), Some("Duale Ausbildung"));
    }

    #[test]
    fn test_detail_ausbildungsart_from_title_heuristic() {
        let doc = Html::parse_document(
            r#"<html><body><h1>Duales Studium Informatik 2026</h1></body></html>"#,
        );
        let fields = extract_detail(&doc);
        assert_eq!(fields.ausbildungsart.as_deref(), Some("Duales Studium"));
    }

    #[test]
    fn test_detail_beruf_from_meta_keywords() {
        let doc = Html::parse_document(
            r#"<html><head>
            <meta name="keywords" content="Ausbildung.de, Jobs, Kfz-Mechatroniker, Ausbildung">
            </head><body><h1>Stelle</h1></body></html>"#,
        );
        let fields = extract_detail(&doc);
        assert_eq!(fields.beruf.as_deref(), Some("Kfz-Mechatroniker"));
    }

    #[test]
    fn test_detail_description_and_derived_text() {
        let doc = Html::parse_document(
            r#"<html><body>
            <div class="c-jobDetail__description"><p>Deine <b>Aufgaben</b>: Backen und Verkaufen</p></div>
            <aside class="c-jobDetail__facts">Vergütung: 900 €</aside>
            </body></html>"#,
        );
        let fields = extract_detail(&doc);
        assert!(fields.description_html.as_deref().unwrap().contains("<b>Aufgaben</b>"));
        assert_eq!(
            fields.description_text.as_deref(),
            Some("Deine Aufgaben: Backen und Verkaufen")
        );
        assert_eq!(fields.sidebar_info.as_deref(), Some("Vergütung: 900 €"));
    }

    #[test]
    fn test_detail_description_fallback_class() {
        let doc = Html::parse_document(
            r#"<html><body>
            <div class="stellen-beschreibung"><p>Fallback-Inhalt</p></div>
            </body></html>"#,
        );
        let fields = extract_detail(&doc);
        assert!(fields.description_html.as_deref().unwrap().contains("Fallback-Inhalt"));
    }

    #[test]
    fn test_fields_resolve_at_independent_depths() {
        // Bundesland resolves from free text while Ausbildungsart needs the
        // title heuristic; neither blocks the other.
        let doc = Html::parse_document(
            r#"<html><body>
            <h1>Ausbildung zum Gärtner</h1>
            <p>Der Betrieb liegt in Brandenburg an der Havel.</p>
            </body></html>"#,
        );
        let fields = extract_detail(&doc);
        assert_eq!(fields.bundesland.as_deref(), Some("Brandenburg"));
        assert_eq!(fields.ausbildungsart.as_deref(), Some("Ausbildung"));
    }

    #[test]
    fn test_next_page_rel_next() {
        let doc = Html::parse_document(
            r#"<html><body><a rel="next" href="/suche/?page=2">2</a></body></html>"#,
        );
        assert_eq!(
            find_next_page(&doc, LIST_URL).as_deref(),
            Some("https://www.ausbildung.de/suche/?page=2")
        );
    }

    #[test]
    fn test_next_page_pagination_class() {
        let doc = Html::parse_document(
            r#"<html><body><a class="c-pagination__next" href="/suche/?page=3">Weiter</a></body></html>"#,
        );
        assert_eq!(
            find_next_page(&doc, LIST_URL).as_deref(),
            Some("https://www.ausbildung.de/suche/?page=3")
        );
    }

    #[test]
    fn test_next_page_text_match_skips_previous() {
        let doc = Html::parse_document(
            r#"<html><body>
            <a href="/suche/?page=1">Zurück</a>
            <a href="/suche/?page=3">Weiter »</a>
            </body></html>"#,
        );
        assert_eq!(
            find_next_page(&doc, LIST_URL).as_deref(),
            Some("https://www.ausbildung.de/suche/?page=3")
        );
    }

    #[test]
    fn test_next_page_none_when_only_previous_exists() {
        let doc = Html::parse_document(
            r#"<html><body><a href="/suche/?page=1">Zurück</a></body></html>"#,
        );
        assert_eq!(find_next_page(&doc, BASE_URL), None);
    }
}
