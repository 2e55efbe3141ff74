//! Site resolution - turning caller input into extraction plans.
//!
//! Bare URLs get the generic job-link plan, bare company slugs are probed
//! for a careers page first, and structured configs are validated and
//! filled with defaults. Resolution never fails the run: unusable entries
//! are logged and skipped.

use tracing::{debug, info, warn};
use url::Url;

use crate::error::{ExtractionError, Result};
use crate::traits::probe::CareersProbe;
use crate::types::site::{SiteConfig, SiteInput, SiteSpec};

/// Careers URL patterns probed for a company slug, in order.
pub const CAREERS_URL_PATTERNS: [&str; 6] = [
    "https://www.{slug}.com/careers",
    "https://{slug}.com/careers",
    "https://www.{slug}.com/jobs",
    "https://{slug}.com/jobs",
    "https://careers.{slug}.com/",
    "https://jobs.{slug}.com/",
];

/// What a bare string denotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BareTarget {
    /// A careers page URL
    Url(Url),
    /// A company slug to probe for
    Slug(String),
}

/// Classify a bare string as a URL or a company slug.
///
/// Strings with a scheme must be http(s) URLs. Strings without one are URLs
/// when they contain a dot (`https://` is assumed) and slugs otherwise.
pub fn classify(raw: &str) -> Result<BareTarget> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid(raw, "empty site entry"));
    }

    if trimmed.contains("://") {
        return parse_web_url(trimmed).map(BareTarget::Url);
    }
    if trimmed.contains('.') {
        return parse_web_url(&format!("https://{}", trimmed)).map(BareTarget::Url);
    }
    if trimmed.contains('/') || trimmed.chars().any(char::is_whitespace) {
        return Err(invalid(raw, "not a URL or company slug"));
    }
    Ok(BareTarget::Slug(trimmed.to_string()))
}

/// Candidate careers URLs for a slug, in probe order.
pub fn candidate_urls(slug: &str) -> Vec<String> {
    let slug = slug.trim().to_lowercase();
    CAREERS_URL_PATTERNS
        .iter()
        .map(|pattern| pattern.replace("{slug}", &slug))
        .collect()
}

/// Unverified careers URL used when probing finds nothing.
pub fn best_guess_url(slug: &str) -> String {
    format!("https://{}.com/careers", slug.trim().to_lowercase())
}

/// Probe the conventional careers URLs of a slug.
///
/// Returns the final URL (after redirects) of the first response that looks
/// like a careers page.
pub async fn discover_careers_url<P>(slug: &str, probe: &P) -> Option<String>
where
    P: CareersProbe + ?Sized,
{
    for candidate in candidate_urls(slug) {
        match probe.fetch(&candidate).await {
            Ok(response) if response.looks_like_careers_page() => {
                debug!(slug, candidate = %candidate, final_url = %response.final_url, "Careers page found");
                return Some(response.final_url);
            }
            Ok(response) => {
                debug!(slug, candidate = %candidate, status = response.status, "Not a careers page");
            }
            Err(e) => {
                debug!(slug, candidate = %candidate, error = %e, "Probe failed");
            }
        }
    }
    None
}

/// Resolve one site entry.
pub async fn resolve_site<P>(input: &SiteInput, probe: &P) -> Result<SiteConfig>
where
    P: CareersProbe + ?Sized,
{
    match input {
        SiteInput::Bare(raw) => match classify(raw)? {
            BareTarget::Url(url) => Ok(SiteConfig::with_defaults(url)),
            BareTarget::Slug(slug) => resolve_slug(&slug, probe).await,
        },
        SiteInput::Config(spec) => from_spec(spec),
    }
}

/// Resolve every entry, skipping the ones that cannot be used.
pub async fn resolve_sites<P>(inputs: &[SiteInput], probe: &P) -> Vec<SiteConfig>
where
    P: CareersProbe + ?Sized,
{
    let mut sites = Vec::with_capacity(inputs.len());
    for input in inputs {
        match resolve_site(input, probe).await {
            Ok(site) => sites.push(site),
            Err(e) => warn!(error = %e, "Skipping site entry"),
        }
    }
    info!(requested = inputs.len(), resolved = sites.len(), "Resolved sites");
    sites
}

async fn resolve_slug<P>(slug: &str, probe: &P) -> Result<SiteConfig>
where
    P: CareersProbe + ?Sized,
{
    let discovered = discover_careers_url(slug, probe).await;
    let raw = match discovered {
        Some(url) => url,
        None => {
            let guess = best_guess_url(slug);
            info!(slug, guess = %guess, "No careers page found, using best guess");
            guess
        }
    };

    let url = parse_web_url(&raw)?;
    let host = url.host_str().unwrap_or_default().to_string();
    info!(slug, url = %url, "Resolved company careers page");

    Ok(SiteConfig::with_defaults(url)
        .with_company(slug)
        .with_domain_filter(host))
}

/// Build a plan from a structured config.
///
/// Empty strings count as absent. Reveal phrases default to none.
pub fn from_spec(spec: &SiteSpec) -> Result<SiteConfig> {
    let url = parse_web_url(spec.url.trim())?;
    let mut site = SiteConfig::new(url);

    if let Some(company) = present(&spec.company) {
        site = site.with_company(company);
    }
    if let Some(source) = present(&spec.source) {
        site = site.with_source(source);
    }
    if let Some(careers_url) = present(&spec.careers_url) {
        site.careers_url = careers_url.to_string();
    }
    if let Some(base) = present(&spec.absolute_base) {
        match Url::parse(base) {
            Ok(base) if base.has_host() => site = site.with_absolute_base(base),
            _ => warn!(site = %site.source, absolute_base = base, "Ignoring unusable absolute base"),
        }
    }

    site = apply(site, &spec.list_selector, |s, v| s.with_list_selector(v));
    site = apply(site, &spec.item_selector, |s, v| s.with_item_selector(v));
    site = apply(site, &spec.title_selector, |s, v| s.with_title_selector(v));
    site = apply(site, &spec.location_selector, |s, v| s.with_location_selector(v));
    site = apply(site, &spec.description_selector, |s, v| s.with_description_selector(v));
    site = apply(site, &spec.link_selector, |s, v| s.with_link_selector(v));
    site = apply(site, &spec.domain_filter, |s, v| s.with_domain_filter(v));
    site = apply(site, &spec.require_path_contains, |s, v| s.with_required_path(v));
    site = apply(site, &spec.wait_selector, |s, v| s.with_wait_selector(v));

    if let Some(seconds) = spec.sleep_seconds {
        site = site.with_sleep_seconds(seconds);
    }
    site = site
        .with_open_roles_text(spec.open_roles_text.iter().filter(|p| !p.trim().is_empty()).cloned())
        .with_search_patterns(spec.search_patterns.iter().filter(|p| !p.trim().is_empty()).cloned());

    if spec.fetch_description_from_link {
        site = site.with_detail_descriptions(spec.detail_description_selector.as_deref());
    } else if let Some(selector) = present(&spec.detail_description_selector) {
        site.detail_description_selector = Some(selector.to_string());
    }

    Ok(site)
}

fn apply(
    site: SiteConfig,
    value: &Option<String>,
    set: impl FnOnce(SiteConfig, &str) -> SiteConfig,
) -> SiteConfig {
    match present(value) {
        Some(value) => set(site, value),
        None => site,
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn parse_web_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| invalid(raw, &e.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        scheme => Err(invalid(raw, &format!("unsupported URL scheme {:?}", scheme))),
    }
}

fn invalid(input: &str, reason: &str) -> ExtractionError {
    ExtractionError::InvalidSite {
        input: input.to_string(),
        reason: reason.to_string(),
    }
}
