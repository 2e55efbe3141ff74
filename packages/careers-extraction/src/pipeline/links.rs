//! Link normalization and accept-rules.
//!
//! Raw `href` values read from a snapshot are resolved to absolute URLs and
//! checked against a site's domain and path rules.

use std::fmt;

use url::Url;

use crate::types::site::SiteConfig;

/// Why a resolved link was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Host does not contain the site's domain filter
    Domain,
    /// Path does not contain the site's required fragment
    Path,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain => f.write_str("domain filter"),
            Self::Path => f.write_str("path filter"),
        }
    }
}

/// Whether an `href` value can point at a listing at all.
///
/// Fragments and `javascript:`, `mailto:` and `tel:` links never do.
pub fn is_navigable(href: &str) -> bool {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return false;
    }
    let lower = href.to_ascii_lowercase();
    !(lower.starts_with("javascript:") || lower.starts_with("mailto:") || lower.starts_with("tel:"))
}

/// Resolve a raw link to an absolute http(s) URL.
///
/// Links starting with `/` are resolved against `absolute_base`. Absolute
/// links are kept as-is. Any other relative form is resolved against the
/// page the link was found on, which is what a browser reports for an
/// anchor's `href` property.
pub fn normalize(raw: &str, absolute_base: &Url, page_url: &Url) -> Option<Url> {
    let raw = raw.trim();
    if !is_navigable(raw) {
        return None;
    }

    let resolved = if raw.starts_with('/') {
        absolute_base.join(raw).ok()?
    } else {
        match Url::parse(raw) {
            Ok(url) => url,
            Err(url::ParseError::RelativeUrlWithoutBase) => page_url.join(raw).ok()?,
            Err(_) => return None,
        }
    };

    match resolved.scheme() {
        "http" | "https" if resolved.host_str().is_some() => Some(resolved),
        _ => None,
    }
}

/// Accept-rules for resolved links.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkFilter {
    domain: Option<String>,
    path: Option<String>,
}

impl LinkFilter {
    /// A filter accepting every link.
    pub fn new() -> Self {
        Self::default()
    }

    /// The accept-rules of a site.
    pub fn for_site(site: &SiteConfig) -> Self {
        Self {
            domain: site.domain_filter.clone(),
            path: site.require_path_contains.clone(),
        }
    }

    /// Require the host to contain `domain`.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Require the path to contain `fragment`.
    pub fn with_path(mut self, fragment: impl Into<String>) -> Self {
        self.path = Some(fragment.into());
        self
    }

    /// Check a resolved link against the rules.
    pub fn check(&self, url: &Url) -> Result<(), Rejection> {
        if let Some(domain) = &self.domain {
            if !url.host_str().unwrap_or("").contains(domain.as_str()) {
                return Err(Rejection::Domain);
            }
        }
        if let Some(fragment) = &self.path {
            if !url.path().contains(fragment.as_str()) {
                return Err(Rejection::Path);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_root_relative_uses_absolute_base() {
        let base = url("https://acme.com");
        let page = url("https://careers.acme.com/list");

        let resolved = normalize("/jobs/123", &base, &page).unwrap();
        assert_eq!(resolved.as_str(), "https://acme.com/jobs/123");
    }

    #[test]
    fn test_absolute_links_are_kept() {
        let base = url("https://acme.com");
        let resolved = normalize("https://boards.example.com/acme/77", &base, &base).unwrap();
        assert_eq!(resolved.as_str(), "https://boards.example.com/acme/77");
    }

    #[test]
    fn test_path_relative_uses_page_url() {
        let base = url("https://acme.com");
        let page = url("https://acme.com/careers/");

        let resolved = normalize("engineering/42", &base, &page).unwrap();
        assert_eq!(resolved.as_str(), "https://acme.com/careers/engineering/42");
    }

    #[test]
    fn test_non_navigable_links_are_dropped() {
        let base = url("https://acme.com");
        for raw in ["", "  ", "#apply", "javascript:void(0)", "mailto:jobs@acme.com", "tel:+15551234"] {
            assert_eq!(normalize(raw, &base, &base), None, "{:?} should not resolve", raw);
        }
        assert_eq!(normalize("ftp://acme.com/jobs.txt", &base, &base), None);
    }

    #[test]
    fn test_domain_filter_rejects_other_hosts() {
        let filter = LinkFilter::new().with_domain("acme.com");

        assert_eq!(filter.check(&url("https://other.com/jobs/1")), Err(Rejection::Domain));
        assert_eq!(filter.check(&url("https://jobs.acme.com/1")), Ok(()));
    }

    #[test]
    fn test_path_filter_checks_the_path_only() {
        let filter = LinkFilter::new().with_path("/jobs/");

        assert_eq!(filter.check(&url("https://acme.com/jobs/1")), Ok(()));
        assert_eq!(filter.check(&url("https://jobs.acme.com/about?next=/jobs/")), Err(Rejection::Path));
    }

    #[test]
    fn test_filter_for_site() {
        let site = SiteConfig::parse("https://acme.com/careers")
            .unwrap()
            .with_domain_filter("acme.com")
            .with_required_path("positions");
        let filter = LinkFilter::for_site(&site);

        assert_eq!(filter.check(&url("https://acme.com/positions/9")), Ok(()));
        assert_eq!(filter.check(&url("https://acme.com/blog/9")), Err(Rejection::Path));
        assert_eq!(filter.check(&url("https://other.com/positions/9")), Err(Rejection::Domain));
    }

    proptest! {
        #[test]
        fn prop_root_relative_links_stay_on_base_host(segment in "[a-z0-9]{1,12}", id in 0u32..100_000) {
            let base = url("https://acme.com");
            let raw = format!("/{}/{}", segment, id);

            let resolved = normalize(&raw, &base, &url("https://elsewhere.org/page")).unwrap();
            prop_assert_eq!(resolved.host_str(), Some("acme.com"));
            prop_assert_eq!(resolved.path(), raw.as_str());
        }

        #[test]
        fn prop_empty_filter_accepts_everything(host in "[a-z]{1,10}\\.(com|io|org)", path in "(/[a-z0-9]{0,8}){0,3}") {
            let link = url(&format!("https://{}{}", host, path));
            prop_assert!(LinkFilter::new().check(&link).is_ok());
        }
    }
}
