//! HTML sanitizing and anchor extraction
//!
//! Pages are stored without their `<script>` and `<style>` elements and with a
//! provenance marker recording where and when they were fetched.

use chrono::{DateTime, SecondsFormat, Utc};
use scraper::{Html, Selector};

/// Elements removed from every stored page
const STRIPPED_ELEMENTS: &str = "script, style";

/// A fetched page after sanitizing
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Serialized document, ready for the content store
    pub html: String,

    /// Raw `href` values of every anchor, in document order
    pub hrefs: Vec<String>,
}

/// Sanitizes a response body and collects its anchor targets
///
/// Parsing never fails: html5ever recovers from any malformed input, in the
/// worst case producing a document with no anchors.
///
/// # Example
///
/// ```
/// use cachecrawl::crawler::parse_page;
/// use chrono::Utc;
///
/// let body = r#"<html><body><script>x()</script><a href="/a">A</a></body></html>"#;
/// let page = parse_page(body, "https://example.test/", Utc::now());
/// assert!(!page.html.contains("<script>"));
/// assert_eq!(page.hrefs, vec!["/a".to_string()]);
/// ```
pub fn parse_page(body: &str, original_url: &str, fetched_at: DateTime<Utc>) -> ParsedPage {
    let mut document = Html::parse_document(body);
    strip_elements(&mut document);

    let hrefs = collect_hrefs(&document);
    let serialized = document.html();
    let html = inject_provenance(&serialized, original_url, fetched_at).unwrap_or(serialized);

    ParsedPage { html, hrefs }
}

/// Collects anchor targets from an already-stored page
pub fn extract_hrefs(html: &str) -> Vec<String> {
    collect_hrefs(&Html::parse_document(html))
}

fn strip_elements(document: &mut Html) {
    let Ok(selector) = Selector::parse(STRIPPED_ELEMENTS) else {
        return;
    };

    let ids: Vec<_> = document.select(&selector).map(|element| element.id()).collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn collect_hrefs(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect()
}

/// Inserts `<original_url>` just before `</body>`
///
/// Returns `None` when the document has no closing body tag.
fn inject_provenance(html: &str, original_url: &str, fetched_at: DateTime<Utc>) -> Option<String> {
    let at = html.rfind("</body>")?;
    let marker = format!(
        r#"<original_url value="{}" fetched-at="{}"></original_url>"#,
        escape_attribute(original_url),
        fetched_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    );

    let mut out = String::with_capacity(html.len() + marker.len());
    out.push_str(&html[..at]);
    out.push_str(&marker);
    out.push_str(&html[at..]);
    Some(out)
}

fn escape_attribute(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '"' => escaped.push_str("&quot;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
