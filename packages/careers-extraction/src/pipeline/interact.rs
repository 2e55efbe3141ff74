//! Page interaction - bringing a career page to a stable, fully loaded state.
//!
//! Each site walks the same states:
//!
//! ```text
//! Navigate → AwaitReady → RevealSearch → ScrollLoad → Ready
//! ```
//!
//! Only navigation can fail the site. Every other state treats a miss
//! (no readiness selector, no reveal phrase, no control, no height growth,
//! a script error) as a normal branch and moves on.

use std::fmt;
use std::time::Duration;

use tracing::{debug, info, warn};
use url::Url;

use crate::error::{BrowserResult, Result};
use crate::pipeline::extract::detail_description;
use crate::traits::browser::{BrowserDriver, Locator};
use crate::types::config::{seconds, Timings};
use crate::types::site::SiteConfig;

/// Buttons or links whose class or id mentions search.
pub const SEARCH_CONTROL_SELECTOR: &str =
    "button[class*='search'], a[class*='search'], button[id*='search'], a[id*='search']";

/// Anchors pointing at search or job pages.
pub const JOB_HREF_SELECTOR: &str = "a[href*='search'], a[href*='jobs']";

/// Controls searched for an exact reveal phrase.
pub const CONTROL_SCOPE: &str = "button, a";

/// States of the per-site interaction state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageState {
    Navigate,
    AwaitReady,
    RevealSearch,
    ScrollLoad,
    Ready,
}

/// Which reveal strategy found the control that was clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealMethod {
    /// Element whose own text contains the phrase
    OwnText,
    /// Button or link with "search" in its class or id
    SearchControl,
    /// Anchor whose href mentions search or jobs
    JobHref,
    /// Button or link whose text contains the exact phrase
    ControlText,
}

impl fmt::Display for RevealMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OwnText => "own text",
            Self::SearchControl => "search control",
            Self::JobHref => "job href",
            Self::ControlText => "control text",
        };
        f.write_str(name)
    }
}

/// Builds the locator of one reveal strategy for a matched phrase.
pub type RevealStrategy = fn(&str) -> Locator;

/// Reveal strategies in the order they are attempted.
pub const REVEAL_STRATEGIES: [(RevealMethod, RevealStrategy); 4] = [
    (RevealMethod::OwnText, by_own_text),
    (RevealMethod::SearchControl, by_search_control),
    (RevealMethod::JobHref, by_job_href),
    (RevealMethod::ControlText, by_control_text),
];

fn by_own_text(phrase: &str) -> Locator {
    Locator::own_text(phrase)
}

fn by_search_control(_phrase: &str) -> Locator {
    Locator::css(SEARCH_CONTROL_SELECTOR)
}

fn by_job_href(_phrase: &str) -> Locator {
    Locator::css(JOB_HREF_SELECTOR)
}

fn by_control_text(phrase: &str) -> Locator {
    Locator::scoped_text(CONTROL_SCOPE, phrase)
}

/// First configured phrase found in the page text, compared
/// case-insensitively.
pub fn find_reveal_phrase<'a>(
    page_text: &str,
    phrases: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    matching_reveal_phrases(page_text, phrases).into_iter().next()
}

/// Every configured phrase found in the page text, in list order.
pub fn matching_reveal_phrases<'a>(
    page_text: &str,
    phrases: impl IntoIterator<Item = &'a str>,
) -> Vec<&'a str> {
    let page_text = page_text.to_lowercase();
    phrases
        .into_iter()
        .filter(|phrase| !phrase.trim().is_empty() && page_text.contains(&phrase.to_lowercase()))
        .collect()
}

/// How the AwaitReady state ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Readiness {
    /// The wait selector appeared
    SelectorFound,
    /// The wait selector did not appear in time (or could not be evaluated)
    TimedOut,
    /// No wait selector; the fixed settle delay elapsed
    #[default]
    Settled,
}

/// How the RevealSearch state ended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RevealOutcome {
    /// No reveal phrase appears on the page
    #[default]
    NoPhrase,
    /// A control was clicked
    Activated { phrase: String, method: RevealMethod },
    /// A phrase matched but no strategy could activate a control
    NoControl { phrase: String },
}

/// How the ScrollLoad state ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScrollOutcome {
    /// Scrolls that grew the document
    pub attempts: usize,

    /// Last height read
    pub final_height: u64,
}

/// A page brought to the Ready state.
#[derive(Debug, Clone)]
pub struct PreparedPage {
    pub readiness: Readiness,
    pub reveal: RevealOutcome,
    pub scroll: ScrollOutcome,

    /// Rendered markup at the Ready state
    pub markup: String,

    /// URL of the document at the Ready state
    pub url: Url,
}

/// Drives one browser tab through the interaction states.
pub struct PageController<'a> {
    driver: &'a dyn BrowserDriver,
    timings: &'a Timings,
}

impl<'a> PageController<'a> {
    /// Create a controller over a driver.
    pub fn new(driver: &'a dyn BrowserDriver, timings: &'a Timings) -> Self {
        Self { driver, timings }
    }

    /// Run the state machine for a site and snapshot the Ready page.
    ///
    /// Fails only if navigation or the final snapshot fails.
    pub async fn prepare(&self, site: &SiteConfig) -> Result<PreparedPage> {
        let mut readiness = Readiness::default();
        let mut reveal = RevealOutcome::default();
        let mut scroll = ScrollOutcome::default();

        let mut state = PageState::Navigate;
        while state != PageState::Ready {
            debug!(site = %site.source, ?state, "Entering page state");
            state = match state {
                PageState::Navigate => {
                    self.driver.navigate(site.url.as_str()).await?;
                    PageState::AwaitReady
                }
                PageState::AwaitReady => {
                    readiness = self.await_ready(site).await;
                    PageState::RevealSearch
                }
                PageState::RevealSearch => {
                    reveal = self.reveal(site).await;
                    PageState::ScrollLoad
                }
                PageState::ScrollLoad => {
                    scroll = self.scroll_load().await;
                    PageState::Ready
                }
                PageState::Ready => PageState::Ready,
            };
        }

        let markup = self.driver.content().await?;
        let url = match self.driver.current_url().await {
            Ok(current) => Url::parse(&current).unwrap_or_else(|_| site.url.clone()),
            Err(e) => {
                debug!(site = %site.source, error = %e, "Could not read current URL");
                site.url.clone()
            }
        };

        Ok(PreparedPage {
            readiness,
            reveal,
            scroll,
            markup,
            url,
        })
    }

    /// Wait for the site's readiness selector, or apply its settle delay.
    pub async fn await_ready(&self, site: &SiteConfig) -> Readiness {
        let Some(selector) = site.wait_selector.as_deref() else {
            pause(seconds(site.sleep_seconds)).await;
            return Readiness::Settled;
        };

        match self
            .driver
            .wait_for_selector(
                selector,
                self.timings.wait_selector_timeout,
                self.timings.wait_poll_interval,
            )
            .await
        {
            Ok(true) => Readiness::SelectorFound,
            Ok(false) => {
                debug!(site = %site.source, selector, "Wait selector timed out, continuing");
                Readiness::TimedOut
            }
            Err(e) => {
                warn!(site = %site.source, selector, error = %e, "Wait selector failed, continuing");
                Readiness::TimedOut
            }
        }
    }

    /// Click a control revealing the job list, if the page offers one.
    pub async fn reveal(&self, site: &SiteConfig) -> RevealOutcome {
        if site.reveal_phrases().next().is_none() {
            return RevealOutcome::NoPhrase;
        }

        let page_text = match self.driver.body_text().await {
            Ok(text) => text,
            Err(e) => {
                warn!(site = %site.source, error = %e, "Could not read page text for reveal");
                return RevealOutcome::NoPhrase;
            }
        };
        let phrases = matching_reveal_phrases(&page_text, site.reveal_phrases());
        let Some(first) = phrases.first().copied() else {
            return RevealOutcome::NoPhrase;
        };

        // Later phrases only matter when every strategy failed for earlier ones.
        for phrase in phrases {
            if let Some(method) = self.reveal_with(site, phrase).await {
                return RevealOutcome::Activated {
                    phrase: phrase.to_string(),
                    method,
                };
            }
        }

        debug!(site = %site.source, phrase = first, "No reveal control could be activated");
        RevealOutcome::NoControl {
            phrase: first.to_string(),
        }
    }

    /// Run the reveal strategies for one phrase until a control is clicked.
    async fn reveal_with(&self, site: &SiteConfig, phrase: &str) -> Option<RevealMethod> {
        for (method, strategy) in REVEAL_STRATEGIES.iter() {
            let locator = strategy(phrase);
            match self.activate(&locator).await {
                Ok(true) => {
                    let settle = self.timings.reveal_settle_for(site.sleep_seconds);
                    pause(settle).await;
                    info!(
                        site = %site.source,
                        phrase,
                        method = %method,
                        waited_ms = settle.as_millis() as u64,
                        "Clicked reveal control"
                    );
                    return Some(*method);
                }
                Ok(false) => continue,
                Err(e) => {
                    debug!(site = %site.source, locator = %locator, error = %e, "Reveal strategy failed");
                    continue;
                }
            }
        }
        None
    }

    /// Scroll the first match into view, pause, and click it.
    ///
    /// Returns `Ok(false)` when the locator matches nothing.
    async fn activate(&self, locator: &Locator) -> BrowserResult<bool> {
        if self.driver.count(locator).await? == 0 {
            return Ok(false);
        }
        self.driver.scroll_into_view(locator).await?;
        pause(self.timings.reveal_pause).await;
        self.driver.click(locator).await?;
        Ok(true)
    }

    /// Scroll to the bottom until the document stops growing, then return
    /// to the top.
    pub async fn scroll_load(&self) -> ScrollOutcome {
        let mut outcome = ScrollOutcome::default();
        if let Err(e) = self.scroll_until_stable(&mut outcome).await {
            warn!(error = %e, attempts = outcome.attempts, "Scroll loading failed, continuing");
        }
        if let Err(e) = self.driver.scroll_to_top().await {
            warn!(error = %e, "Could not scroll back to top");
        }
        pause(self.timings.scroll_top_pause).await;

        if outcome.attempts > 0 {
            debug!(attempts = outcome.attempts, height = outcome.final_height, "Scrolled to load more listings");
        }
        outcome
    }

    async fn scroll_until_stable(&self, outcome: &mut ScrollOutcome) -> BrowserResult<()> {
        let mut last_height = self.driver.scroll_height().await?;
        outcome.final_height = last_height;

        while outcome.attempts < self.timings.max_scroll_attempts {
            self.driver.scroll_to_bottom().await?;
            pause(self.timings.scroll_wait).await;

            let mut new_height = self.driver.scroll_height().await?;
            if new_height == last_height {
                pause(self.timings.scroll_recheck).await;
                new_height = self.driver.scroll_height().await?;
                if new_height == last_height {
                    break;
                }
            }
            last_height = new_height;
            outcome.final_height = new_height;
            outcome.attempts += 1;
        }
        Ok(())
    }

    /// Open a listing's detail page, read its description and go back.
    pub async fn fetch_detail_description(
        &self,
        link: &Url,
        selector: Option<&str>,
        max_chars: usize,
    ) -> Result<String> {
        self.driver.navigate(link.as_str()).await?;
        pause(self.timings.detail_wait).await;
        let markup = self.driver.content().await;

        if let Err(e) = self.driver.go_back().await {
            warn!(link = %link, error = %e, "Could not navigate back from detail page");
        }
        pause(self.timings.detail_back_wait).await;

        detail_description(&markup?, selector, max_chars)
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
