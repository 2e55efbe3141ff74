//! Fallback adapter - merging markup-based extraction into a run.
//!
//! The fallback only runs for sites whose heuristic yield is low. Its
//! candidates are promoted to full listings and merged without ever
//! duplicating or overwriting a URL already collected.

use tracing::{debug, info, warn};
use url::Url;

use crate::pipeline::aggregate::{Admission, ResultAggregator};
use crate::pipeline::links::normalize;
use crate::traits::fallback::FallbackExtractor;
use crate::types::listing::{JobListing, PartialListing};
use crate::types::site::SiteConfig;

/// What a fallback merge did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackMerge {
    /// Candidates returned by the extractor
    pub returned: usize,

    /// Listings appended to the results
    pub added: usize,

    /// Candidates whose URL was already collected
    pub duplicates: usize,

    /// Candidates lacking a title or a usable URL
    pub incomplete: usize,

    /// Whether the fetch limit was reached while merging
    pub limit_reached: bool,
}

/// Whether the fallback should run for a site that yielded `site_yield`
/// heuristic listings.
pub fn should_invoke<F>(fallback: &F, site_yield: usize, threshold: usize) -> bool
where
    F: FallbackExtractor + ?Sized,
{
    site_yield < threshold && fallback.is_available()
}

/// Promote a fallback candidate to a listing.
///
/// Title and URL are required. Relative URLs resolve like heuristic links
/// but accept-rules do not apply. Missing company, source and careers URL
/// come from the site.
pub fn promote(partial: PartialListing, site: &SiteConfig, page_url: &Url) -> Option<JobListing> {
    let title = partial.title_text()?.to_string();
    let url = normalize(partial.url_text()?, &site.absolute_base, page_url)?;

    Some(JobListing {
        title,
        company: filled(partial.company, &site.company),
        location: partial.location.map(|s| s.trim().to_string()).unwrap_or_default(),
        description: partial.description.map(|s| s.trim().to_string()).unwrap_or_default(),
        url: url.to_string(),
        careers_url: filled(partial.careers_url, &site.careers_url),
        source: filled(partial.source, &site.source),
    })
}

fn filled(value: Option<String>, default: &str) -> String {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Run the fallback over a site's markup and merge its candidates.
///
/// Extractor errors are logged and merge nothing.
pub async fn merge_fallback<F>(
    fallback: &F,
    markup: &str,
    site: &SiteConfig,
    page_url: &Url,
    max_items: usize,
    results: &mut ResultAggregator,
) -> FallbackMerge
where
    F: FallbackExtractor + ?Sized,
{
    let mut merge = FallbackMerge::default();

    let candidates = match fallback
        .extract(markup, site.url.as_str(), &site.company, max_items)
        .await
    {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!(
                site = %site.source,
                extractor = fallback.name(),
                error = %e,
                "Fallback extraction failed"
            );
            return merge;
        }
    };
    merge.returned = candidates.len();

    for partial in candidates.into_iter().take(max_items) {
        let Some(listing) = promote(partial, site, page_url) else {
            merge.incomplete += 1;
            continue;
        };
        match results.push_unseen(listing) {
            Admission::Accepted => merge.added += 1,
            Admission::Filled => {
                merge.added += 1;
                merge.limit_reached = true;
                break;
            }
            Admission::Duplicate => merge.duplicates += 1,
            Admission::Full => {
                merge.limit_reached = true;
                break;
            }
        }
    }

    if merge.incomplete > 0 {
        debug!(site = %site.source, incomplete = merge.incomplete, "Dropped incomplete fallback candidates");
    }
    info!(
        site = %site.source,
        extractor = fallback.name(),
        returned = merge.returned,
        added = merge.added,
        duplicates = merge.duplicates,
        "Merged fallback listings"
    );
    merge
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockFallback;
    use crate::traits::fallback::NoFallback;

    fn site() -> SiteConfig {
        SiteConfig::parse("https://acme.com/careers")
            .unwrap()
            .with_company("Acme")
            .with_domain_filter("acme.com")
    }

    fn heuristic(url: &str) -> JobListing {
        JobListing {
            title: "Existing".to_string(),
            company: "Acme".to_string(),
            location: String::new(),
            description: "keep me".to_string(),
            url: url.to_string(),
            careers_url: "https://acme.com/careers".to_string(),
            source: "browser:acme.com".to_string(),
        }
    }

    #[test]
    fn test_should_invoke_below_threshold_only() {
        let fallback = MockFallback::new();

        assert!(should_invoke(&fallback, 2, 3));
        assert!(!should_invoke(&fallback, 3, 3));
        assert!(!should_invoke(&NoFallback, 0, 3));
    }

    #[test]
    fn test_promote_fills_from_site_without_accept_rules() {
        let site = site();
        let page = site.url.clone();

        let listing = promote(
            PartialListing::new(" Data Analyst ", "https://boards.example.com/acme/5"),
            &site,
            &page,
        )
        .unwrap();

        assert_eq!(listing.title, "Data Analyst");
        assert_eq!(listing.url, "https://boards.example.com/acme/5");
        assert_eq!(listing.company, "Acme");
        assert_eq!(listing.source, "browser:acme.com");
        assert_eq!(listing.careers_url, "https://acme.com/careers");
    }

    #[test]
    fn test_promote_requires_title_and_url() {
        let site = site();
        let page = site.url.clone();

        assert!(promote(PartialListing::new("", "/jobs/1"), &site, &page).is_none());
        assert!(promote(PartialListing::new("Role", "  "), &site, &page).is_none());
        assert!(promote(PartialListing::new("Role", "javascript:void(0)"), &site, &page).is_none());

        let relative = promote(PartialListing::new("Role", "/jobs/1"), &site, &page).unwrap();
        assert_eq!(relative.url, "https://acme.com/jobs/1");
    }

    #[tokio::test]
    async fn test_merge_skips_seen_urls_and_second_run_adds_nothing() {
        let site = site();
        let page = site.url.clone();
        let fallback = MockFallback::new().with_listings([
            PartialListing::new("Existing again", "https://acme.com/jobs/1"),
            PartialListing::new("New role", "/jobs/2"),
            PartialListing::new("Another", "https://acme.com/jobs/3"),
        ]);

        let mut results = ResultAggregator::new(50);
        results.push(heuristic("https://acme.com/jobs/1"));

        let first = merge_fallback(&fallback, "<html></html>", &site, &page, 20, &mut results).await;
        assert_eq!(first.added, 2);
        assert_eq!(first.duplicates, 1);
        assert_eq!(results.len(), 3);
        assert_eq!(results.listings()[0].description, "keep me");

        let second = merge_fallback(&fallback, "<html></html>", &site, &page, 20, &mut results).await;
        assert_eq!(second.added, 0);
        assert_eq!(second.duplicates, 3);
        assert_eq!(results.len(), 3);
    }

    #[tokio::test]
    async fn test_merge_respects_fetch_limit() {
        let site = site();
        let page = site.url.clone();
        let fallback = MockFallback::new().with_listings(
            (0..5).map(|i| PartialListing::new(format!("Role {}", i), format!("/jobs/{}", i))),
        );

        let mut results = ResultAggregator::new(2);
        let merge = merge_fallback(&fallback, "<html></html>", &site, &page, 20, &mut results).await;

        assert!(merge.limit_reached);
        assert_eq!(merge.added, 2);
        assert_eq!(results.len(), 2);
    }

    #[tokio::test]
    async fn test_merge_swallows_extractor_errors() {
        let site = site();
        let page = site.url.clone();
        let mut results = ResultAggregator::new(50);

        let merge = merge_fallback(&MockFallback::failing(), "<html></html>", &site, &page, 20, &mut results).await;

        assert_eq!(merge, FallbackMerge::default());
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_merge_passes_site_url_and_company() {
        let site = site();
        let fallback = MockFallback::new();
        let mut results = ResultAggregator::new(50);

        merge_fallback(&fallback, "<p>x</p>", &site, &site.url, 20, &mut results).await;

        assert_eq!(
            fallback.calls(),
            vec![crate::testing::MockFallbackCall::Extract {
                page_url: "https://acme.com/careers".to_string(),
                company: "Acme".to_string(),
                max_items: 20,
                markup_len: 8,
            }]
        );
    }
}
