//! The extraction engine - main entry point of the library.
//!
//! One run drives one browser through every site in order:
//!
//! ```text
//! launch ─► for each site:
//!             PageController::prepare ─► extract_listings ─► emit
//!                                                  │
//!                                       yield < threshold?
//!                                                  └─► merge_fallback
//!        ─► close
//! ```
//!
//! A failing site is logged and skipped with whatever it already emitted.
//! The fetch limit is global and stops the run the moment it is reached.
//! A browser that cannot be launched yields an empty run, not an error.

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pipeline::extract::extract_listings;
use crate::pipeline::fallback::{merge_fallback, should_invoke};
use crate::pipeline::interact::{PageController, RevealOutcome};
use crate::pipeline::session::ExtractionSession;
use crate::traits::{
    browser::BrowserLauncher,
    fallback::{FallbackExtractor, NoFallback},
};
use crate::types::{
    config::EngineConfig,
    listing::JobListing,
    report::{ExtractionRun, SiteSummary},
    site::SiteConfig,
};

/// How processing of one site ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SiteOutcome {
    Completed,
    LimitReached,
}

/// Extracts job listings from career pages with a browser.
///
/// # Example
///
/// ```rust,ignore
/// let engine = ExtractionEngine::new(ChromeLauncher::default(), NoFallback, EngineConfig::default());
/// let sites = resolve_sites(&inputs, &HttpProbe::new()?).await;
/// let listings = engine.run(&sites).await;
/// ```
pub struct ExtractionEngine<L: BrowserLauncher, F: FallbackExtractor = NoFallback> {
    launcher: L,
    fallback: F,
    config: EngineConfig,
}

impl<L: BrowserLauncher> ExtractionEngine<L, NoFallback> {
    /// Create an engine without a fallback extractor.
    pub fn without_fallback(launcher: L, config: EngineConfig) -> Self {
        Self::new(launcher, NoFallback, config)
    }
}

impl<L: BrowserLauncher, F: FallbackExtractor> ExtractionEngine<L, F> {
    /// Create a new engine.
    pub fn new(launcher: L, fallback: F, config: EngineConfig) -> Self {
        Self {
            launcher,
            fallback,
            config,
        }
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Extract listings from every site, in order.
    pub async fn run(&self, sites: &[SiteConfig]) -> Vec<JobListing> {
        self.run_with_report(sites).await.listings
    }

    /// Extract listings from every site and report what happened per site.
    pub async fn run_with_report(&self, sites: &[SiteConfig]) -> ExtractionRun {
        let mut run = ExtractionRun::default();

        if self.config.fetch_limit == 0 {
            info!("Fetch limit is 0, skipping all sites");
            return run;
        }
        if sites.is_empty() {
            return run;
        }

        let driver = match self.launcher.launch().await {
            Ok(driver) => driver,
            Err(e) => {
                warn!(launcher = self.launcher.name(), error = %e, "Browser unavailable, returning no listings");
                return run;
            }
        };
        info!(
            launcher = self.launcher.name(),
            sites = sites.len(),
            fetch_limit = self.config.fetch_limit,
            fallback = self.fallback.name(),
            "Starting extraction run"
        );

        let mut session = ExtractionSession::new(driver, self.config.fetch_limit);
        for site in sites {
            let mut summary = SiteSummary::for_site(site);
            let outcome = self.process_site(&mut session, site, &mut summary).await;

            match outcome {
                Ok(SiteOutcome::Completed) => {
                    info!(
                        site = %site.source,
                        containers = summary.containers,
                        extracted = summary.extracted,
                        rejected = summary.rejected,
                        fallback_added = summary.fallback_added,
                        "Processed site"
                    );
                    run.sites.push(summary);
                }
                Ok(SiteOutcome::LimitReached) => {
                    summary.limit_reached = true;
                    info!(
                        site = %site.source,
                        fetch_limit = self.config.fetch_limit,
                        "Reached fetch limit, stopping"
                    );
                    run.sites.push(summary);
                    break;
                }
                Err(e) => {
                    warn!(site = %site.source, url = %site.url, error = %e, "Site failed, keeping partial results");
                    summary.error = Some(e.to_string());
                    run.sites.push(summary);
                }
            }
        }

        debug!(last_scroll_height = session.last_scroll_height(), "Run finished");
        run.listings = session.finish().await;
        info!(
            listings = run.listings.len(),
            sites = run.sites.len(),
            failed = run.failed_sites().count(),
            "Extraction run complete"
        );
        run
    }

    async fn process_site(
        &self,
        session: &mut ExtractionSession,
        site: &SiteConfig,
        summary: &mut SiteSummary,
    ) -> Result<SiteOutcome> {
        let ExtractionSession {
            driver,
            last_scroll_height,
            results,
        } = session;

        info!(site = %site.source, url = %site.url, company = %site.company, "Loading careers page");
        let controller = PageController::new(&**driver, &self.config.timings);
        let page = controller.prepare(site).await?;

        *last_scroll_height = page.scroll.final_height;
        summary.scroll_attempts = page.scroll.attempts;
        if let RevealOutcome::Activated { phrase, .. } = &page.reveal {
            summary.revealed_by = Some(phrase.clone());
        }

        let extraction = extract_listings(&page.markup, site, &page.url)?;
        summary.containers = extraction.containers;
        summary.candidates = extraction.candidates.len();
        summary.rejected = extraction.rejected();

        for candidate in extraction.candidates {
            let mut description = candidate.description;
            if description.is_empty() && site.fetch_description_from_link {
                match controller
                    .fetch_detail_description(
                        &candidate.link,
                        site.detail_description_selector.as_deref(),
                        self.config.description_max_chars,
                    )
                    .await
                {
                    Ok(text) => description = text,
                    Err(e) => {
                        warn!(site = %site.source, link = %candidate.link, error = %e, "Failed to fetch description");
                    }
                }
            }

            let listing = JobListing {
                title: candidate.title,
                company: site.company.clone(),
                location: candidate.location,
                description,
                url: candidate.link.to_string(),
                careers_url: site.careers_url.clone(),
                source: site.source.clone(),
            };
            let admission = results.push(listing);
            if admission.is_added() {
                summary.extracted += 1;
            }
            if admission.is_full() {
                return Ok(SiteOutcome::LimitReached);
            }
        }

        if should_invoke(&self.fallback, summary.extracted, self.config.fallback_threshold) {
            debug!(
                site = %site.source,
                extracted = summary.extracted,
                threshold = self.config.fallback_threshold,
                "Low heuristic yield, invoking fallback"
            );
            summary.fallback_invoked = true;
            let merge = merge_fallback(
                &self.fallback,
                &page.markup,
                site,
                &page.url,
                self.config.fallback_max_items,
                results,
            )
            .await;
            summary.fallback_added = merge.added;
            if merge.limit_reached {
                return Ok(SiteOutcome::LimitReached);
            }
        }

        Ok(SiteOutcome::Completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockBrowser, MockFallback, MockLauncher};
    use crate::types::config::Timings;
    use crate::types::listing::PartialListing;

    fn config() -> EngineConfig {
        EngineConfig::default().with_timings(Timings::instant())
    }

    fn rows(n: usize) -> String {
        let rows: String = (0..n)
            .map(|i| format!(r#"<div class="job"><a href="/jobs/{i}">Role {i}</a></div>"#))
            .collect();
        format!("<html><body>{}</body></html>", rows)
    }

    fn site(url: &str) -> SiteConfig {
        SiteConfig::parse(url)
            .unwrap()
            .with_company("Acme")
            .with_list_selector(".job")
    }

    #[tokio::test]
    async fn test_zero_limit_visits_nothing() {
        let browser = MockBrowser::new().with_page("https://acme.com/careers", rows(3));
        let launcher = MockLauncher::new(browser.clone());
        let engine = ExtractionEngine::without_fallback(launcher.clone(), config().with_fetch_limit(0));

        let listings = engine.run(&[site("https://acme.com/careers")]).await;

        assert!(listings.is_empty());
        assert_eq!(launcher.launch_count(), 0);
        assert!(browser.navigations().is_empty());
    }

    #[tokio::test]
    async fn test_unavailable_browser_yields_empty_run() {
        let engine = ExtractionEngine::without_fallback(MockLauncher::failing(), config());

        let run = engine.run_with_report(&[site("https://acme.com/careers")]).await;

        assert!(run.listings.is_empty());
        assert!(run.sites.is_empty());
    }

    #[tokio::test]
    async fn test_limit_stops_mid_site() {
        let browser = MockBrowser::new()
            .with_page("https://acme.com/careers", rows(5))
            .with_page("https://globex.com/careers", rows(5));
        let engine = ExtractionEngine::without_fallback(
            MockLauncher::new(browser.clone()),
            config().with_fetch_limit(3),
        );

        let run = engine
            .run_with_report(&[site("https://acme.com/careers"), site("https://globex.com/careers")])
            .await;

        assert_eq!(run.listings.len(), 3);
        assert_eq!(run.sites.len(), 1);
        assert!(run.sites[0].limit_reached);
        assert_eq!(browser.navigations(), vec!["https://acme.com/careers"]);
        assert!(browser.is_closed());
    }

    #[tokio::test]
    async fn test_failed_site_does_not_abort_run() {
        let browser = MockBrowser::new()
            .fail_url("https://down.example/careers")
            .with_page("https://acme.com/careers", rows(2));
        let engine = ExtractionEngine::without_fallback(MockLauncher::new(browser.clone()), config());

        let run = engine
            .run_with_report(&[site("https://down.example/careers"), site("https://acme.com/careers")])
            .await;

        assert_eq!(run.listings.len(), 2);
        assert!(run.sites[0].failed());
        assert_eq!(run.sites[1].extracted, 2);
        assert_eq!(browser.close_count(), 1);
    }

    #[tokio::test]
    async fn test_scroll_failure_still_extracts_site() {
        let browser = MockBrowser::new()
            .with_page("https://acme.com/careers", rows(3))
            .fail_scroll();
        let engine = ExtractionEngine::without_fallback(MockLauncher::new(browser.clone()), config());

        let run = engine.run_with_report(&[site("https://acme.com/careers")]).await;

        assert_eq!(run.listings.len(), 3);
        assert!(!run.sites[0].failed());
        assert_eq!(run.sites[0].scroll_attempts, 0);
        assert!(browser.is_closed());
    }

    #[tokio::test]
    async fn test_invalid_selector_fails_only_that_site() {
        let browser = MockBrowser::new().with_page("https://acme.com/careers", rows(2));
        let engine = ExtractionEngine::without_fallback(MockLauncher::new(browser), config());
        let broken = site("https://acme.com/careers").with_title_selector("h3[");

        let run = engine
            .run_with_report(&[broken, site("https://acme.com/careers")])
            .await;

        assert!(run.sites[0].error.as_deref().unwrap().contains("h3["));
        assert_eq!(run.listings.len(), 2);
    }

    #[tokio::test]
    async fn test_low_yield_merges_fallback() {
        let browser = MockBrowser::new().with_page("https://acme.com/careers", rows(2));
        let fallback = MockFallback::new().with_listings([
            PartialListing::new("Role 0", "/jobs/0"),
            PartialListing::new("Designer", "/jobs/design"),
        ]);
        let engine = ExtractionEngine::new(MockLauncher::new(browser), fallback.clone(), config());

        let run = engine.run_with_report(&[site("https://acme.com/careers")]).await;

        let urls: Vec<_> = run.listings.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://acme.com/jobs/0",
                "https://acme.com/jobs/1",
                "https://acme.com/jobs/design"
            ]
        );
        assert!(run.sites[0].fallback_invoked);
        assert_eq!(run.sites[0].fallback_added, 1);
        assert_eq!(fallback.call_count(), 1);
    }

    #[tokio::test]
    async fn test_sufficient_yield_skips_fallback() {
        let browser = MockBrowser::new().with_page("https://acme.com/careers", rows(3));
        let fallback = MockFallback::new().with_listings([PartialListing::new("Extra", "/jobs/x")]);
        let engine = ExtractionEngine::new(MockLauncher::new(browser), fallback.clone(), config());

        let listings = engine.run(&[site("https://acme.com/careers")]).await;

        assert_eq!(listings.len(), 3);
        assert_eq!(fallback.call_count(), 0);
    }

    #[tokio::test]
    async fn test_detail_descriptions_are_item_scoped() {
        let browser = MockBrowser::new()
            .with_page("https://acme.com/careers", rows(2))
            .with_page(
                "https://acme.com/jobs/0",
                "<body><section class='jd'>Build things.</section></body>",
            );
        let engine = ExtractionEngine::without_fallback(MockLauncher::new(browser), config());
        let site = site("https://acme.com/careers").with_detail_descriptions(Some(".jd"));

        let listings = engine.run(&[site]).await;

        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].description, "Build things.");
        // jobs/1 has no page, so its detail fetch fails but the listing stays
        assert_eq!(listings[1].description, "");
    }
}
