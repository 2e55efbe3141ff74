//! Helpers for reading text out of rendered markup snapshots.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Node, Selector};

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));

/// Elements whose text is never rendered.
const INVISIBLE: [&str; 5] = ["script", "style", "noscript", "template", "head"];

/// Rendered text of an element: text nodes outside invisible elements,
/// whitespace collapsed to single spaces and trimmed.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut words: Vec<&str> = Vec::new();
    for node in element.descendants() {
        if let Node::Text(text) = node.value() {
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .map(|el| INVISIBLE.contains(&el.name()))
                    .unwrap_or(false)
            });
            if !hidden {
                words.extend(text.split_whitespace());
            }
        }
    }
    words.join(" ")
}

/// Text of the first element matching `selector`, if any.
pub fn first_text(scope: ElementRef<'_>, selector: &Selector) -> Option<String> {
    scope.select(selector).next().map(element_text)
}

/// The element standing in for "the whole page": `body`, or the document
/// root when the markup has no body.
pub fn page_element(document: &Html) -> ElementRef<'_> {
    document
        .root_element()
        .children()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "body")
        .unwrap_or_else(|| document.root_element())
}

/// Truncate to at most `max` characters on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

/// Compact text rendition of a page for markup-based extractors: the
/// visible text followed by one line per link, truncated to `max_chars`.
pub fn page_digest(markup: &str, max_chars: usize) -> String {
    let document = Html::parse_document(markup);
    let page = page_element(&document);

    let mut digest = String::from("PAGE TEXT:\n");
    digest.push_str(&element_text(page));
    digest.push_str("\n\nLINKS:\n");
    for anchor in page.select(&ANCHOR) {
        let href = anchor.value().attr("href").unwrap_or_default().trim();
        if href.is_empty() || href.starts_with('#') {
            continue;
        }
        let text = element_text(anchor);
        digest.push_str("- ");
        digest.push_str(if text.is_empty() { "(no text)" } else { &text });
        digest.push_str(" -> ");
        digest.push_str(href);
        digest.push('\n');
    }
    truncate_chars(&digest, max_chars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_element_text_skips_scripts_and_collapses_whitespace() {
        let html = Html::parse_fragment(
            r#"<div>
                <h3>Senior   Engineer</h3>
                <script>var tracking = 1;</script>
                <span>Remote</span>
            </div>"#,
        );
        let div = html.select(&Selector::parse("div").unwrap()).next().unwrap();

        assert_eq!(element_text(div), "Senior Engineer Remote");
    }

    #[test]
    fn test_page_element_prefers_body() {
        let html = Html::parse_document(
            "<html><head><title>Careers</title></head><body><p>Jobs here</p></body></html>",
        );
        let page = page_element(&html);

        assert_eq!(page.value().name(), "body");
        assert_eq!(element_text(page), "Jobs here");
    }

    #[test]
    fn test_first_text() {
        let html = Html::parse_fragment(r#"<ul><li class="loc">Berlin</li><li class="loc">Oslo</li></ul>"#);
        let root = html.root_element();
        let selector = Selector::parse(".loc").unwrap();

        assert_eq!(first_text(root, &selector).as_deref(), Some("Berlin"));
        assert_eq!(first_text(root, &Selector::parse(".none").unwrap()), None);
    }

    #[test]
    fn test_page_digest_lists_links() {
        let digest = page_digest(
            r##"<html><body><h1>Careers</h1><a href="/jobs/1">Engineer</a><a href="#top">Top</a></body></html>"##,
            10_000,
        );

        assert!(digest.starts_with("PAGE TEXT:\nCareers Engineer Top"));
        assert!(digest.contains("- Engineer -> /jobs/1\n"));
        assert!(!digest.contains("#top"));
        assert_eq!(page_digest("<p>abcdef</p>", 12).chars().count(), 12);
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo wörld", 4), "héll");
        assert_eq!(truncate_chars("short", 2000), "short");
        assert_eq!(truncate_chars("", 3), "");
    }
}
