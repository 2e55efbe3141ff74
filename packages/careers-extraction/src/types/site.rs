//! Site types - raw site input and the resolved per-site extraction plan.

use serde::{Deserialize, Serialize};
use url::Url;

/// Listing-link selector used when a site is given as a bare URL or slug.
pub const DEFAULT_LIST_SELECTOR: &str = "a[href*='job'], a[href*='/jobs/'], a[href*='/careers/']";

/// Link selector used when a site is given as a bare URL or slug.
pub const DEFAULT_LINK_SELECTOR: &str = "a";

/// Phrases that usually label a control revealing the full job list.
pub const DEFAULT_OPEN_ROLES_TEXT: [&str; 6] = [
    "open roles",
    "view all jobs",
    "see all openings",
    "current openings",
    "job openings",
    "find open roles",
];

/// Phrases that usually label a control opening a job search.
pub const DEFAULT_SEARCH_PATTERNS: [&str; 7] = [
    "search for open roles",
    "search roles",
    "search jobs",
    "find jobs",
    "job search",
    "search openings",
    "start job search",
];

/// One entry of the site list as supplied by the caller.
///
/// Either a bare string (a careers URL or a company slug) or a structured
/// configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SiteInput {
    /// Careers URL or company slug
    Bare(String),

    /// Structured site configuration
    Config(SiteSpec),
}

impl From<&str> for SiteInput {
    fn from(s: &str) -> Self {
        Self::Bare(s.to_string())
    }
}

impl From<SiteSpec> for SiteInput {
    fn from(spec: SiteSpec) -> Self {
        Self::Config(spec)
    }
}

/// Structured site configuration as written in a sites file.
///
/// Every field except `url` is optional. Empty strings are treated the same
/// as missing fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSpec {
    pub url: String,
    pub company: Option<String>,
    pub source: Option<String>,
    pub list_selector: Option<String>,
    pub item_selector: Option<String>,
    pub title_selector: Option<String>,
    pub location_selector: Option<String>,
    pub description_selector: Option<String>,
    pub link_selector: Option<String>,
    pub domain_filter: Option<String>,
    pub require_path_contains: Option<String>,
    pub absolute_base: Option<String>,
    pub careers_url: Option<String>,
    pub wait_selector: Option<String>,
    pub sleep_seconds: Option<f64>,
    pub open_roles_text: Vec<String>,
    pub search_patterns: Vec<String>,
    pub fetch_description_from_link: bool,
    pub detail_description_selector: Option<String>,
}

impl SiteSpec {
    /// Create a spec for a URL with every other field unset.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// The resolved extraction plan for one career page.
///
/// `url` is always an absolute http(s) URL. Selector fields are `None` when
/// the structural fallback should be used; they are validated lazily when the
/// site is extracted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Career page to load
    pub url: Url,

    /// Display label copied onto every listing
    pub company: String,

    /// Provenance tag copied onto every listing
    pub source: String,

    pub list_selector: Option<String>,
    pub item_selector: Option<String>,
    pub title_selector: Option<String>,
    pub location_selector: Option<String>,
    pub description_selector: Option<String>,
    pub link_selector: Option<String>,

    /// Accept only links whose host contains this substring
    pub domain_filter: Option<String>,

    /// Accept only links whose path contains this substring
    pub require_path_contains: Option<String>,

    /// Base for links starting with `/`
    pub absolute_base: Url,

    /// Originating page recorded on each listing
    pub careers_url: String,

    /// Readiness gate awaited after navigation
    pub wait_selector: Option<String>,

    /// Fixed settle delay in seconds
    pub sleep_seconds: f64,

    /// Phrases labelling a "show all roles" control
    pub open_roles_text: Vec<String>,

    /// Phrases labelling a "search jobs" control
    pub search_patterns: Vec<String>,

    /// Visit each listing's detail page when no description was found
    pub fetch_description_from_link: bool,

    /// Description selector on detail pages (defaults to `body`)
    pub detail_description_selector: Option<String>,
}

impl SiteConfig {
    /// Create a plan for a URL using structural fallbacks everywhere.
    pub fn new(url: Url) -> Self {
        let absolute_base = origin_of(&url);
        Self {
            source: source_tag(&url),
            careers_url: url.to_string(),
            url,
            company: String::new(),
            list_selector: None,
            item_selector: None,
            title_selector: None,
            location_selector: None,
            description_selector: None,
            link_selector: None,
            domain_filter: None,
            require_path_contains: None,
            absolute_base,
            wait_selector: None,
            sleep_seconds: 0.0,
            open_roles_text: Vec::new(),
            search_patterns: Vec::new(),
            fetch_description_from_link: false,
            detail_description_selector: None,
        }
    }

    /// Parse `url` and create a plan for it.
    pub fn parse(url: &str) -> std::result::Result<Self, url::ParseError> {
        Url::parse(url).map(Self::new)
    }

    /// Plan used for bare URLs: generic job-link containers and the default
    /// reveal phrases.
    pub fn with_defaults(url: Url) -> Self {
        Self::new(url)
            .with_list_selector(DEFAULT_LIST_SELECTOR)
            .with_link_selector(DEFAULT_LINK_SELECTOR)
            .with_open_roles_text(DEFAULT_OPEN_ROLES_TEXT)
            .with_search_patterns(DEFAULT_SEARCH_PATTERNS)
    }

    /// Set the company label.
    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = company.into();
        self
    }

    /// Set the provenance tag.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Set the container selector.
    pub fn with_list_selector(mut self, selector: impl Into<String>) -> Self {
        self.list_selector = non_empty(selector.into());
        self
    }

    /// Set the item selector (used when the list selector finds nothing).
    pub fn with_item_selector(mut self, selector: impl Into<String>) -> Self {
        self.item_selector = non_empty(selector.into());
        self
    }

    /// Set the title selector.
    pub fn with_title_selector(mut self, selector: impl Into<String>) -> Self {
        self.title_selector = non_empty(selector.into());
        self
    }

    /// Set the location selector.
    pub fn with_location_selector(mut self, selector: impl Into<String>) -> Self {
        self.location_selector = non_empty(selector.into());
        self
    }

    /// Set the description selector.
    pub fn with_description_selector(mut self, selector: impl Into<String>) -> Self {
        self.description_selector = non_empty(selector.into());
        self
    }

    /// Set the link selector.
    pub fn with_link_selector(mut self, selector: impl Into<String>) -> Self {
        self.link_selector = non_empty(selector.into());
        self
    }

    /// Only accept links on hosts containing `filter`.
    pub fn with_domain_filter(mut self, filter: impl Into<String>) -> Self {
        self.domain_filter = non_empty(filter.into());
        self
    }

    /// Only accept links whose path contains `fragment`.
    pub fn with_required_path(mut self, fragment: impl Into<String>) -> Self {
        self.require_path_contains = non_empty(fragment.into());
        self
    }

    /// Set the base used for root-relative links.
    pub fn with_absolute_base(mut self, base: Url) -> Self {
        self.absolute_base = base;
        self
    }

    /// Set the readiness selector.
    pub fn with_wait_selector(mut self, selector: impl Into<String>) -> Self {
        self.wait_selector = non_empty(selector.into());
        self
    }

    /// Set the settle delay in seconds.
    pub fn with_sleep_seconds(mut self, seconds: f64) -> Self {
        self.sleep_seconds = seconds.max(0.0);
        self
    }

    /// Set the "open roles" reveal phrases.
    pub fn with_open_roles_text(
        mut self,
        phrases: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.open_roles_text = phrases.into_iter().map(|p| p.into()).collect();
        self
    }

    /// Set the "search" reveal phrases.
    pub fn with_search_patterns(
        mut self,
        phrases: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.search_patterns = phrases.into_iter().map(|p| p.into()).collect();
        self
    }

    /// Visit detail pages for missing descriptions.
    pub fn with_detail_descriptions(mut self, selector: Option<&str>) -> Self {
        self.fetch_description_from_link = true;
        self.detail_description_selector = selector.and_then(|s| non_empty(s.to_string()));
        self
    }

    /// All reveal phrases, open-roles phrases first.
    pub fn reveal_phrases(&self) -> impl Iterator<Item = &str> {
        self.open_roles_text
            .iter()
            .chain(self.search_patterns.iter())
            .map(String::as_str)
    }

    /// Host of the career page, for logging.
    pub fn host(&self) -> &str {
        self.url.host_str().unwrap_or("site")
    }
}

/// `scheme://host[:port]` of a URL, as a URL.
pub(crate) fn origin_of(url: &Url) -> Url {
    let mut origin = url.clone();
    origin.set_path("/");
    origin.set_query(None);
    origin.set_fragment(None);
    origin
}

/// Provenance tag derived from a URL's host.
pub(crate) fn source_tag(url: &Url) -> String {
    format!("browser:{}", url.host_str().unwrap_or("site"))
}

/// `None` for blank strings, trimmed otherwise.
pub(crate) fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_derives_source_and_base() {
        let site = SiteConfig::parse("https://acme.com/company/careers?team=eng").unwrap();

        assert_eq!(site.source, "browser:acme.com");
        assert_eq!(site.absolute_base.as_str(), "https://acme.com/");
        assert_eq!(site.careers_url, "https://acme.com/company/careers?team=eng");
        assert!(site.list_selector.is_none());
        assert!(site.reveal_phrases().next().is_none());
    }

    #[test]
    fn test_blank_selectors_are_absent() {
        let site = SiteConfig::parse("https://acme.com")
            .unwrap()
            .with_list_selector("   ")
            .with_title_selector(" .title ");

        assert!(site.list_selector.is_none());
        assert_eq!(site.title_selector.as_deref(), Some(".title"));
    }

    #[test]
    fn test_defaults_carry_reveal_phrases_in_order() {
        let site = SiteConfig::with_defaults(Url::parse("https://acme.com/careers").unwrap());
        let phrases: Vec<_> = site.reveal_phrases().collect();

        assert_eq!(phrases.len(), 13);
        assert_eq!(phrases[0], "open roles");
        assert_eq!(phrases[6], "search for open roles");
        assert_eq!(site.list_selector.as_deref(), Some(DEFAULT_LIST_SELECTOR));
        assert_eq!(site.link_selector.as_deref(), Some("a"));
    }

    #[test]
    fn test_site_input_untagged_deserialization() {
        let inputs: Vec<SiteInput> = serde_json::from_str(
            r#"[
                "https://acme.com/careers",
                "globex",
                {"url": "https://x.io/careers", "list_selector": ".job-row", "sleep_seconds": 1.5}
            ]"#,
        )
        .unwrap();

        assert_eq!(inputs[0], SiteInput::Bare("https://acme.com/careers".to_string()));
        assert_eq!(inputs[1], SiteInput::Bare("globex".to_string()));
        match &inputs[2] {
            SiteInput::Config(spec) => {
                assert_eq!(spec.url, "https://x.io/careers");
                assert_eq!(spec.list_selector.as_deref(), Some(".job-row"));
                assert_eq!(spec.sleep_seconds, Some(1.5));
                assert!(!spec.fetch_description_from_link);
            }
            other => panic!("expected structured config, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_sleep_is_clamped() {
        let site = SiteConfig::parse("https://acme.com")
            .unwrap()
            .with_sleep_seconds(-2.0);
        assert_eq!(site.sleep_seconds, 0.0);
    }
}
