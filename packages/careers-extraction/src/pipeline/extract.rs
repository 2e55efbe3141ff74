//! Listing extraction from a rendered page snapshot.
//!
//! Containers are located with the site's list/item selectors, falling back
//! to the whole page. Each container is turned into a [`Candidate`] when it
//! has a title and a link that survives normalization and the site's
//! accept-rules. Links are resolved by an ordered table of strategies
//! ([`LINK_STRATEGIES`]); the first one producing a value wins.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use crate::error::{ExtractionError, Result};
use crate::pipeline::links::{self, LinkFilter, Rejection};
use crate::pipeline::markup::{element_text, first_text, page_element, truncate_chars};
use crate::types::site::SiteConfig;

/// Attributes checked, in order, for an absolute URL on the container.
pub const DATA_LINK_ATTRIBUTES: [&str; 4] = ["data-url", "data-href", "data-link", "href"];

/// Detail pages are read from this selector unless the site names one.
pub const DEFAULT_DETAIL_SELECTOR: &str = "body";

static ANCHOR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector"));

static EMBEDDED_URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s'"]+"#).expect("static regex"));

/// Which link strategy produced a candidate's URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkMethod {
    /// First match of the site's link selector
    LinkSelector,
    /// The container's own `href`
    ContainerHref,
    /// First descendant anchor with a usable `href`
    DescendantAnchor,
    /// Absolute URL embedded in an `onclick` handler
    OnClick,
    /// Absolute URL in a data attribute
    DataAttribute,
}

/// What a link strategy sees: one container and the compiled link selector.
pub struct LinkContext<'a> {
    pub container: ElementRef<'a>,
    pub link_selector: Option<&'a Selector>,
}

/// A single link-resolution heuristic.
pub type LinkStrategy = fn(&LinkContext<'_>) -> Option<String>;

/// Link strategies in the order they are attempted.
pub const LINK_STRATEGIES: [(LinkMethod, LinkStrategy); 5] = [
    (LinkMethod::LinkSelector, link_from_selector),
    (LinkMethod::ContainerHref, link_from_container),
    (LinkMethod::DescendantAnchor, link_from_descendant_anchor),
    (LinkMethod::OnClick, link_from_onclick),
    (LinkMethod::DataAttribute, link_from_data_attributes),
];

fn link_from_selector(ctx: &LinkContext<'_>) -> Option<String> {
    let selector = ctx.link_selector?;
    let first = ctx.container.select(selector).next()?;
    first
        .value()
        .attr("href")
        .filter(|href| links::is_navigable(href))
        .map(|href| href.trim().to_string())
}

fn link_from_container(ctx: &LinkContext<'_>) -> Option<String> {
    ctx.container
        .value()
        .attr("href")
        .filter(|href| links::is_navigable(href))
        .map(|href| href.trim().to_string())
}

fn link_from_descendant_anchor(ctx: &LinkContext<'_>) -> Option<String> {
    ctx.container
        .select(&ANCHOR)
        .filter_map(|anchor| anchor.value().attr("href"))
        .find(|href| links::is_navigable(href))
        .map(|href| href.trim().to_string())
}

fn link_from_onclick(ctx: &LinkContext<'_>) -> Option<String> {
    let onclick = ctx.container.value().attr("onclick")?;
    if !onclick.contains("http") {
        return None;
    }
    EMBEDDED_URL
        .find(onclick)
        .map(|found| found.as_str().to_string())
}

fn link_from_data_attributes(ctx: &LinkContext<'_>) -> Option<String> {
    DATA_LINK_ATTRIBUTES.iter().find_map(|attr| {
        ctx.container
            .value()
            .attr(attr)
            .map(str::trim)
            .filter(|value| value.starts_with("http"))
            .map(str::to_string)
    })
}

/// Run the link strategies in order and return the first hit.
pub fn resolve_link(ctx: &LinkContext<'_>) -> Option<(LinkMethod, String)> {
    LINK_STRATEGIES
        .iter()
        .find_map(|(method, strategy)| strategy(ctx).map(|link| (*method, link)))
}

/// A container that produced a title and an accepted link.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub title: String,
    pub location: String,
    pub description: String,
    pub link: Url,
    pub method: LinkMethod,
}

/// Result of extracting one snapshot.
#[derive(Debug, Clone, Default)]
pub struct PageExtraction {
    /// Containers considered (1 when the page itself was used)
    pub containers: usize,

    /// Whether no selector matched and the page was the only container
    pub page_fallback: bool,

    /// Candidates with a title and an accepted link, in document order
    pub candidates: Vec<Candidate>,

    /// Containers dropped for having no title
    pub untitled: usize,

    /// Titled containers dropped for having no resolvable link
    pub unlinked: usize,

    /// Links rejected by the domain filter
    pub rejected_domain: usize,

    /// Links rejected by the path filter
    pub rejected_path: usize,
}

impl PageExtraction {
    /// Total links rejected by accept-rules.
    pub fn rejected(&self) -> usize {
        self.rejected_domain + self.rejected_path
    }
}

/// Compiled selectors of a site.
struct FieldSelectors {
    list: Option<Selector>,
    item: Option<Selector>,
    title: Option<Selector>,
    location: Option<Selector>,
    description: Option<Selector>,
    link: Option<Selector>,
}

impl FieldSelectors {
    fn compile(site: &SiteConfig) -> Result<Self> {
        Ok(Self {
            list: compile("list", site.list_selector.as_deref())?,
            item: compile("item", site.item_selector.as_deref())?,
            title: compile("title", site.title_selector.as_deref())?,
            location: compile("location", site.location_selector.as_deref())?,
            description: compile("description", site.description_selector.as_deref())?,
            link: compile("link", site.link_selector.as_deref())?,
        })
    }
}

fn compile(field: &'static str, selector: Option<&str>) -> Result<Option<Selector>> {
    selector
        .map(|raw| {
            Selector::parse(raw).map_err(|e| ExtractionError::InvalidSelector {
                field,
                selector: raw.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()
}

/// Extract candidate listings from a rendered snapshot.
///
/// Fails only when one of the site's selectors cannot be parsed.
pub fn extract_listings(markup: &str, site: &SiteConfig, page_url: &Url) -> Result<PageExtraction> {
    let selectors = FieldSelectors::compile(site)?;
    let filter = LinkFilter::for_site(site);
    let document = Html::parse_document(markup);

    let mut containers: Vec<ElementRef<'_>> = Vec::new();
    if let Some(list) = &selectors.list {
        containers = document.select(list).collect();
    }
    if containers.is_empty() {
        if let Some(item) = &selectors.item {
            containers = document.select(item).collect();
        }
    }

    let mut extraction = PageExtraction::default();
    if containers.is_empty() {
        containers.push(page_element(&document));
        extraction.page_fallback = true;
    }
    extraction.containers = containers.len();

    for (idx, container) in containers.into_iter().enumerate() {
        let title = match &selectors.title {
            Some(selector) => first_text(container, selector).unwrap_or_default(),
            None => element_text(container),
        };
        if title.is_empty() {
            debug!(site = %site.source, item = idx + 1, "Skipping container without title");
            extraction.untitled += 1;
            continue;
        }

        let ctx = LinkContext {
            container,
            link_selector: selectors.link.as_ref(),
        };
        let Some((method, raw)) = resolve_link(&ctx) else {
            debug!(site = %site.source, item = idx + 1, title = %preview(&title), "Skipping listing without link");
            extraction.unlinked += 1;
            continue;
        };
        let Some(link) = links::normalize(&raw, &site.absolute_base, page_url) else {
            debug!(site = %site.source, item = idx + 1, raw = %raw, "Skipping unresolvable link");
            extraction.unlinked += 1;
            continue;
        };
        if let Err(rejection) = filter.check(&link) {
            debug!(site = %site.source, link = %link, reason = %rejection, "Skipping link");
            match rejection {
                Rejection::Domain => extraction.rejected_domain += 1,
                Rejection::Path => extraction.rejected_path += 1,
            }
            continue;
        }

        let location = selectors
            .location
            .as_ref()
            .and_then(|selector| first_text(container, selector))
            .unwrap_or_default();
        let description = selectors
            .description
            .as_ref()
            .and_then(|selector| first_text(container, selector))
            .unwrap_or_default();

        debug!(site = %site.source, item = idx + 1, ?method, link = %link, "Extracted listing");
        extraction.candidates.push(Candidate {
            title,
            location,
            description,
            link,
            method,
        });
    }

    Ok(extraction)
}

/// Description text from a detail page snapshot.
///
/// Reads the first match of `selector` (default `body`) and truncates it to
/// `max_chars` characters.
pub fn detail_description(markup: &str, selector: Option<&str>, max_chars: usize) -> Result<String> {
    let raw = selector.unwrap_or(DEFAULT_DETAIL_SELECTOR);
    let selector = Selector::parse(raw).map_err(|e| ExtractionError::InvalidSelector {
        field: "detail description",
        selector: raw.to_string(),
        reason: e.to_string(),
    })?;
    let document = Html::parse_document(markup);
    let text = document
        .select(&selector)
        .next()
        .map(element_text)
        .unwrap_or_default();
    Ok(truncate_chars(&text, max_chars))
}

fn preview(text: &str) -> String {
    truncate_chars(text, 50)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page() -> Url {
        Url::parse("https://x.io/careers").unwrap()
    }

    fn link_of(html: &str, link_selector: Option<&str>) -> Option<(LinkMethod, String)> {
        let document = Html::parse_fragment(html);
        let container = document
            .select(&Selector::parse(".job").unwrap())
            .next()
            .unwrap();
        let selector = link_selector.map(|s| Selector::parse(s).unwrap());
        let ctx = LinkContext {
            container,
            link_selector: selector.as_ref(),
        };
        resolve_link(&ctx)
    }

    #[test]
    fn test_link_selector_beats_descendant_anchor() {
        let html = r#"<div class="job">
            <a href="/about">About us</a>
            <a class="apply" href="/jobs/1">Apply</a>
        </div>"#;

        assert_eq!(
            link_of(html, Some("a.apply")),
            Some((LinkMethod::LinkSelector, "/jobs/1".to_string()))
        );
        assert_eq!(
            link_of(html, None),
            Some((LinkMethod::DescendantAnchor, "/about".to_string()))
        );
    }

    #[test]
    fn test_container_href() {
        let html = r#"<a class="job" href="/jobs/9"><span>Engineer</span></a>"#;
        assert_eq!(
            link_of(html, Some(".missing")),
            Some((LinkMethod::ContainerHref, "/jobs/9".to_string()))
        );
    }

    #[test]
    fn test_descendant_anchor_skips_empty_and_script_links() {
        let html = r#"<div class="job">
            <a href="">Empty</a>
            <a href="javascript:void(0)">Toggle</a>
            <a href="https://x.io/jobs/3">Role</a>
        </div>"#;
        assert_eq!(
            link_of(html, None),
            Some((LinkMethod::DescendantAnchor, "https://x.io/jobs/3".to_string()))
        );
    }

    #[test]
    fn test_onclick_url() {
        let html = r#"<div class="job" onclick="window.location='https://x.io/jobs/5?ref=list'">Role</div>"#;
        assert_eq!(
            link_of(html, None),
            Some((LinkMethod::OnClick, "https://x.io/jobs/5?ref=list".to_string()))
        );
    }

    #[test]
    fn test_data_attributes_in_order() {
        let html = r#"<div class="job" data-link="https://x.io/jobs/link" data-href="https://x.io/jobs/href" data-url="/relative">Role</div>"#;
        assert_eq!(
            link_of(html, None),
            Some((LinkMethod::DataAttribute, "https://x.io/jobs/href".to_string()))
        );
    }

    #[test]
    fn test_no_link_anywhere() {
        let html = r#"<div class="job" onclick="toggle()">Role</div>"#;
        assert_eq!(link_of(html, Some("a")), None);
    }

    #[test]
    fn test_page_is_single_container_without_selectors() {
        let site = SiteConfig::parse("https://x.io/careers").unwrap();
        let markup = r#"<html><body>
            <h1>Careers</h1>
            <a href="/jobs/1">Engineer</a>
            <a href="/jobs/2">Designer</a>
        </body></html>"#;

        let extraction = extract_listings(markup, &site, &page()).unwrap();

        assert!(extraction.page_fallback);
        assert_eq!(extraction.containers, 1);
        assert_eq!(extraction.candidates.len(), 1);
        assert_eq!(extraction.candidates[0].title, "Careers Engineer Designer");
        assert_eq!(extraction.candidates[0].link.as_str(), "https://x.io/jobs/1");
    }

    #[test]
    fn test_list_selector_with_missing_link_row() {
        let site = SiteConfig::parse("https://x.io/careers")
            .unwrap()
            .with_list_selector(".job-row")
            .with_title_selector(".title")
            .with_link_selector("a.apply");
        let markup = r#"<html><body>
            <div class="job-row"><span class="title">Backend Engineer</span><a class="apply" href="/jobs/1">Apply</a></div>
            <div class="job-row"><span class="title">Office Manager</span></div>
        </body></html>"#;

        let extraction = extract_listings(markup, &site, &page()).unwrap();

        assert_eq!(extraction.containers, 2);
        assert_eq!(extraction.unlinked, 1);
        assert_eq!(extraction.candidates.len(), 1);
        assert_eq!(extraction.candidates[0].title, "Backend Engineer");
        assert_eq!(extraction.candidates[0].link.as_str(), "https://x.io/jobs/1");
    }

    #[test]
    fn test_untitled_container_is_skipped_even_with_link() {
        let site = SiteConfig::parse("https://x.io/careers")
            .unwrap()
            .with_list_selector(".job-row")
            .with_title_selector(".title");
        let markup = r#"<div class="job-row"><a href="/jobs/1">Apply</a></div>"#;

        let extraction = extract_listings(markup, &site, &page()).unwrap();

        assert_eq!(extraction.untitled, 1);
        assert!(extraction.candidates.is_empty());
    }

    #[test]
    fn test_item_selector_used_when_list_selector_matches_nothing() {
        let site = SiteConfig::parse("https://x.io/careers")
            .unwrap()
            .with_list_selector(".nothing-here")
            .with_item_selector("li.opening")
            .with_location_selector(".loc")
            .with_description_selector(".summary");
        let markup = r#"<ul>
            <li class="opening"><a href="/jobs/1">Data Analyst</a><span class="loc">Oslo</span><p class="summary">Numbers.</p></li>
        </ul>"#;

        let extraction = extract_listings(markup, &site, &page()).unwrap();

        assert!(!extraction.page_fallback);
        let candidate = &extraction.candidates[0];
        assert_eq!(candidate.location, "Oslo");
        assert_eq!(candidate.description, "Numbers.");
        assert!(candidate.title.starts_with("Data Analyst"));
    }

    #[test]
    fn test_accept_rules_are_counted() {
        let site = SiteConfig::parse("https://x.io/careers")
            .unwrap()
            .with_list_selector(".job-row")
            .with_domain_filter("x.io")
            .with_required_path("/jobs/");
        let markup = r#"
            <div class="job-row"><a href="https://other.com/jobs/1">Elsewhere</a></div>
            <div class="job-row"><a href="/blog/1">Blog post</a></div>
            <div class="job-row"><a href="/jobs/2">Keeper</a></div>"#;

        let extraction = extract_listings(markup, &site, &page()).unwrap();

        assert_eq!(extraction.rejected_domain, 1);
        assert_eq!(extraction.rejected_path, 1);
        assert_eq!(extraction.rejected(), 2);
        assert_eq!(extraction.candidates.len(), 1);
        assert_eq!(extraction.candidates[0].title, "Keeper");
    }

    #[test]
    fn test_invalid_selector_is_an_error() {
        let site = SiteConfig::parse("https://x.io/careers")
            .unwrap()
            .with_title_selector("div[[");

        let err = extract_listings("<p>hi</p>", &site, &page()).unwrap_err();
        assert!(matches!(err, ExtractionError::InvalidSelector { field: "title", .. }));
    }

    #[test]
    fn test_detail_description() {
        let markup = r#"<html><body><nav>Menu</nav><article class="jd">Build things.   Ship them.</article></body></html>"#;

        assert_eq!(
            detail_description(markup, Some(".jd"), 2000).unwrap(),
            "Build things. Ship them."
        );
        assert_eq!(
            detail_description(markup, None, 2000).unwrap(),
            "Menu Build things. Ship them."
        );
        assert_eq!(detail_description(markup, Some(".jd"), 5).unwrap(), "Build");
        assert_eq!(detail_description(markup, Some(".none"), 10).unwrap(), "");
    }
}
