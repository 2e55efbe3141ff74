//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the extraction library
//! without launching a browser or making network calls. Mocks are cheap to
//! clone and clones share state, so a test can hand one to the engine and
//! keep another for assertions.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{
    BrowserError, BrowserResult, FallbackError, FallbackResult, ProbeError, ProbeResult,
};
use crate::pipeline::markup::{element_text, page_element};
use crate::traits::{
    browser::{BrowserDriver, BrowserLauncher, Locator},
    fallback::FallbackExtractor,
    probe::{CareersProbe, ProbeResponse},
};
use crate::types::listing::PartialListing;

/// A mock browser serving in-memory pages.
///
/// Locators are evaluated against the current markup with `scraper`, so
/// reveal strategies behave as they would on the real page. Clicking can
/// swap in new markup, and scroll heights are scripted.
#[derive(Clone, Default)]
pub struct MockBrowser {
    state: Arc<RwLock<MockBrowserState>>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockBrowserCall>>>,
}

#[derive(Default)]
struct MockBrowserState {
    /// Markup by URL
    pages: HashMap<String, String>,

    /// Markup shown after a click, by the URL clicked on
    click_results: HashMap<String, String>,

    /// URLs whose navigation fails
    fail_urls: HashSet<String>,

    /// Locators whose scroll-into-view or click fails
    fail_clicks: Vec<Locator>,

    /// Whether scroll operations fail
    fail_scroll: bool,

    /// Heights returned by successive scroll height reads
    scroll_heights: VecDeque<u64>,
    last_height: u64,

    current_url: Option<String>,
    markup: String,
    history: Vec<String>,
    closed: bool,
}

/// Record of a call made to the mock browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockBrowserCall {
    Navigate { url: String },
    WaitForSelector { selector: String },
    BodyText,
    Count { locator: Locator },
    ScrollIntoView { locator: Locator },
    Click { locator: Locator },
    ScrollHeight,
    ScrollToBottom,
    ScrollToTop,
    Content,
    CurrentUrl,
    GoBack,
    Close,
}

impl MockBrowser {
    /// Create a mock browser with no pages.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `markup` at `url`.
    pub fn with_page(self, url: impl Into<String>, markup: impl Into<String>) -> Self {
        self.state
            .write()
            .unwrap()
            .pages
            .insert(url.into(), markup.into());
        self
    }

    /// Replace the markup of `url` with `markup` once something is clicked
    /// there.
    pub fn with_click_result(self, url: impl Into<String>, markup: impl Into<String>) -> Self {
        self.state
            .write()
            .unwrap()
            .click_results
            .insert(url.into(), markup.into());
        self
    }

    /// Make navigation to `url` fail.
    pub fn fail_url(self, url: impl Into<String>) -> Self {
        self.state.write().unwrap().fail_urls.insert(url.into());
        self
    }

    /// Make scrolling into view and clicking `locator` fail with a script
    /// error, as with a detached or obscured element.
    pub fn fail_click(self, locator: Locator) -> Self {
        self.state.write().unwrap().fail_clicks.push(locator);
        self
    }

    /// Make every scroll height read and scroll to the bottom fail.
    pub fn fail_scroll(self) -> Self {
        self.state.write().unwrap().fail_scroll = true;
        self
    }

    /// Script the values returned by successive scroll height reads. The
    /// last value repeats once the script runs out.
    pub fn with_scroll_heights(self, heights: impl IntoIterator<Item = u64>) -> Self {
        self.state.write().unwrap().scroll_heights = heights.into_iter().collect();
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockBrowserCall> {
        self.calls.read().unwrap().clone()
    }

    /// URLs navigated to, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockBrowserCall::Navigate { url } => Some(url),
                _ => None,
            })
            .collect()
    }

    /// Locators clicked, in order.
    pub fn clicks(&self) -> Vec<Locator> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                MockBrowserCall::Click { locator } => Some(locator),
                _ => None,
            })
            .collect()
    }

    /// Number of scrolls to the bottom.
    pub fn scroll_to_bottom_count(&self) -> usize {
        self.count_calls(|call| matches!(call, MockBrowserCall::ScrollToBottom))
    }

    /// Number of scrolls to the top.
    pub fn scroll_to_top_count(&self) -> usize {
        self.count_calls(|call| matches!(call, MockBrowserCall::ScrollToTop))
    }

    /// Number of close calls.
    pub fn close_count(&self) -> usize {
        self.count_calls(|call| matches!(call, MockBrowserCall::Close))
    }

    /// Whether the browser has been closed.
    pub fn is_closed(&self) -> bool {
        self.state.read().unwrap().closed
    }

    /// Clear call history.
    pub fn clear_calls(&self) {
        self.calls.write().unwrap().clear();
    }

    fn count_calls(&self, predicate: impl Fn(&MockBrowserCall) -> bool) -> usize {
        self.calls.read().unwrap().iter().filter(|c| predicate(c)).count()
    }

    fn record(&self, call: MockBrowserCall) {
        self.calls.write().unwrap().push(call);
    }

    fn ensure_open(&self) -> BrowserResult<()> {
        if self.state.read().unwrap().closed {
            Err(BrowserError::Closed)
        } else {
            Ok(())
        }
    }

    fn ensure_clickable(&self, locator: &Locator) -> BrowserResult<()> {
        if self.state.read().unwrap().fail_clicks.contains(locator) {
            return Err(BrowserError::Script(format!(
                "element {} is not clickable",
                locator
            )));
        }
        Ok(())
    }

    fn ensure_scrollable(&self) -> BrowserResult<()> {
        self.ensure_open()?;
        if self.state.read().unwrap().fail_scroll {
            return Err(BrowserError::Script("mock scroll failure".to_string()));
        }
        Ok(())
    }

    fn markup(&self) -> BrowserResult<String> {
        self.ensure_open()?;
        Ok(self.state.read().unwrap().markup.clone())
    }

    fn load(&self, url: &str, push_history: bool) -> BrowserResult<()> {
        let mut state = self.state.write().unwrap();
        if state.closed {
            return Err(BrowserError::Closed);
        }
        if state.fail_urls.contains(url) {
            return Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: "mock navigation failure".to_string(),
            });
        }
        let markup = state
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| BrowserError::Navigation {
                url: url.to_string(),
                reason: "net::ERR_NAME_NOT_RESOLVED".to_string(),
            })?;
        if push_history {
            if let Some(previous) = state.current_url.take() {
                state.history.push(previous);
            }
        }
        state.current_url = Some(url.to_string());
        state.markup = markup;
        Ok(())
    }
}

/// Elements of `markup` matched by `locator`, as their rendered text.
fn evaluate(markup: &str, locator: &Locator) -> BrowserResult<Vec<String>> {
    let document = Html::parse_document(markup);
    let matches = match locator {
        Locator::Css(raw) => {
            let selector = parse_selector(raw)?;
            document.select(&selector).map(element_text).collect()
        }
        Locator::OwnText { phrase } => page_element(&document)
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|el| {
                el.children().any(|child| match child.value() {
                    Node::Text(text) => text.to_lowercase().contains(phrase.as_str()),
                    _ => false,
                })
            })
            .map(element_text)
            .collect(),
        Locator::ScopedText { scope, phrase } => {
            let selector = parse_selector(scope)?;
            document
                .select(&selector)
                .map(element_text)
                .filter(|text| text.contains(phrase.as_str()))
                .collect()
        }
    };
    Ok(matches)
}

fn parse_selector(raw: &str) -> BrowserResult<Selector> {
    Selector::parse(raw).map_err(|e| BrowserError::Script(format!("invalid selector {:?}: {}", raw, e)))
}

#[async_trait]
impl BrowserDriver for MockBrowser {
    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        self.record(MockBrowserCall::Navigate { url: url.to_string() });
        self.load(url, true)
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        _timeout: Duration,
        _poll: Duration,
    ) -> BrowserResult<bool> {
        self.record(MockBrowserCall::WaitForSelector {
            selector: selector.to_string(),
        });
        let markup = self.markup()?;
        Ok(!evaluate(&markup, &Locator::css(selector))?.is_empty())
    }

    async fn body_text(&self) -> BrowserResult<String> {
        self.record(MockBrowserCall::BodyText);
        let markup = self.markup()?;
        let document = Html::parse_document(&markup);
        Ok(element_text(page_element(&document)))
    }

    async fn count(&self, locator: &Locator) -> BrowserResult<usize> {
        self.record(MockBrowserCall::Count {
            locator: locator.clone(),
        });
        Ok(evaluate(&self.markup()?, locator)?.len())
    }

    async fn scroll_into_view(&self, locator: &Locator) -> BrowserResult<()> {
        self.record(MockBrowserCall::ScrollIntoView {
            locator: locator.clone(),
        });
        if evaluate(&self.markup()?, locator)?.is_empty() {
            return Err(BrowserError::NoSuchElement(locator.to_string()));
        }
        self.ensure_clickable(locator)
    }

    async fn click(&self, locator: &Locator) -> BrowserResult<()> {
        self.record(MockBrowserCall::Click {
            locator: locator.clone(),
        });
        if evaluate(&self.markup()?, locator)?.is_empty() {
            return Err(BrowserError::NoSuchElement(locator.to_string()));
        }
        self.ensure_clickable(locator)?;

        let mut state = self.state.write().unwrap();
        let revealed = state
            .current_url
            .as_ref()
            .and_then(|url| state.click_results.get(url))
            .cloned();
        if let Some(markup) = revealed {
            state.markup = markup;
        }
        Ok(())
    }

    async fn scroll_height(&self) -> BrowserResult<u64> {
        self.record(MockBrowserCall::ScrollHeight);
        self.ensure_scrollable()?;
        let mut state = self.state.write().unwrap();
        if let Some(height) = state.scroll_heights.pop_front() {
            state.last_height = height;
        }
        Ok(state.last_height)
    }

    async fn scroll_to_bottom(&self) -> BrowserResult<()> {
        self.record(MockBrowserCall::ScrollToBottom);
        self.ensure_scrollable()
    }

    async fn scroll_to_top(&self) -> BrowserResult<()> {
        self.record(MockBrowserCall::ScrollToTop);
        self.ensure_open()
    }

    async fn content(&self) -> BrowserResult<String> {
        self.record(MockBrowserCall::Content);
        self.markup()
    }

    async fn current_url(&self) -> BrowserResult<String> {
        self.record(MockBrowserCall::CurrentUrl);
        self.ensure_open()?;
        Ok(self
            .state
            .read()
            .unwrap()
            .current_url
            .clone()
            .unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn go_back(&self) -> BrowserResult<()> {
        self.record(MockBrowserCall::GoBack);
        let previous = self.state.write().unwrap().history.pop();
        match previous {
            Some(url) => self.load(&url, false),
            None => Err(BrowserError::Script("no history entry to go back to".to_string())),
        }
    }

    async fn close(&self) {
        self.record(MockBrowserCall::Close);
        self.state.write().unwrap().closed = true;
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock launcher handing out a shared [`MockBrowser`].
#[derive(Clone, Default)]
pub struct MockLauncher {
    /// Browser to hand out, `None` to fail every launch
    browser: Option<MockBrowser>,

    launches: Arc<RwLock<usize>>,
}

impl MockLauncher {
    /// Launch `browser` (or a clone sharing its state) on every call.
    pub fn new(browser: MockBrowser) -> Self {
        Self {
            browser: Some(browser),
            launches: Arc::default(),
        }
    }

    /// A launcher whose launches always fail.
    pub fn failing() -> Self {
        Self::default()
    }

    /// Number of launch attempts.
    pub fn launch_count(&self) -> usize {
        *self.launches.read().unwrap()
    }
}

#[async_trait]
impl BrowserLauncher for MockLauncher {
    async fn launch(&self) -> BrowserResult<Box<dyn BrowserDriver>> {
        *self.launches.write().unwrap() += 1;
        match &self.browser {
            Some(browser) => Ok(Box::new(browser.clone())),
            None => Err(BrowserError::Unavailable(
                "mock launcher has no browser".to_string(),
            )),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock fallback extractor returning canned listings.
#[derive(Clone)]
pub struct MockFallback {
    /// Listings returned by every call
    listings: Arc<RwLock<Vec<PartialListing>>>,

    available: bool,
    fail: bool,

    /// Call tracking
    calls: Arc<RwLock<Vec<MockFallbackCall>>>,
}

/// Record of a call made to the mock fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFallbackCall {
    Extract {
        page_url: String,
        company: String,
        max_items: usize,
        markup_len: usize,
    },
}

impl Default for MockFallback {
    fn default() -> Self {
        Self {
            listings: Arc::default(),
            available: true,
            fail: false,
            calls: Arc::default(),
        }
    }
}

impl MockFallback {
    /// An available fallback that returns nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return `listings` from every call.
    pub fn with_listings(self, listings: impl IntoIterator<Item = PartialListing>) -> Self {
        *self.listings.write().unwrap() = listings.into_iter().collect();
        self
    }

    /// A fallback that reports itself unavailable.
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    /// A fallback whose calls fail.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockFallbackCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of extract calls.
    pub fn call_count(&self) -> usize {
        self.calls.read().unwrap().len()
    }
}

#[async_trait]
impl FallbackExtractor for MockFallback {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn extract(
        &self,
        markup: &str,
        page_url: &str,
        company: &str,
        max_items: usize,
    ) -> FallbackResult<Vec<PartialListing>> {
        self.calls.write().unwrap().push(MockFallbackCall::Extract {
            page_url: page_url.to_string(),
            company: company.to_string(),
            max_items,
            markup_len: markup.len(),
        });

        if self.fail {
            return Err(FallbackError::Response("mock fallback failure".to_string()));
        }

        Ok(self
            .listings
            .read()
            .unwrap()
            .iter()
            .take(max_items)
            .cloned()
            .collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A mock careers probe with canned responses.
///
/// Unknown URLs answer 404.
#[derive(Clone, Default)]
pub struct MockProbe {
    /// Responses by requested URL
    responses: Arc<RwLock<HashMap<String, ProbeResponse>>>,

    /// URLs whose requests fail
    fail_urls: Arc<RwLock<HashSet<String>>>,

    /// URLs requested, in order
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockProbe {
    /// Create a probe answering 404 everywhere.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `url` with status 200 and `body`.
    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        let url = url.into();
        let response = ProbeResponse::new(200, url.clone(), body);
        self.responses.write().unwrap().insert(url, response);
        self
    }

    /// Answer `url` with a full response (status, redirect target, body).
    pub fn with_response(self, url: impl Into<String>, response: ProbeResponse) -> Self {
        self.responses.write().unwrap().insert(url.into(), response);
        self
    }

    /// Make requests to `url` fail.
    pub fn fail_url(self, url: impl Into<String>) -> Self {
        self.fail_urls.write().unwrap().insert(url.into());
        self
    }

    /// URLs requested, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }
}

#[async_trait]
impl CareersProbe for MockProbe {
    async fn fetch(&self, url: &str) -> ProbeResult<ProbeResponse> {
        self.calls.write().unwrap().push(url.to_string());

        if self.fail_urls.read().unwrap().contains(url) {
            return Err(ProbeError::Http(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "Mock connection refused",
            ))));
        }

        Ok(self
            .responses
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_else(|| ProbeResponse::new(404, url, "Not Found")))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_browser_navigation_and_history() {
        let browser = MockBrowser::new()
            .with_page("https://acme.com/careers", "<body>List</body>")
            .with_page("https://acme.com/jobs/1", "<body>Detail</body>");

        browser.navigate("https://acme.com/careers").await.unwrap();
        browser.navigate("https://acme.com/jobs/1").await.unwrap();
        assert_eq!(browser.body_text().await.unwrap(), "Detail");

        browser.go_back().await.unwrap();
        assert_eq!(browser.current_url().await.unwrap(), "https://acme.com/careers");
        assert_eq!(
            browser.navigations(),
            vec!["https://acme.com/careers", "https://acme.com/jobs/1"]
        );

        // Unknown page should fail
        assert!(browser.navigate("https://acme.com/missing").await.is_err());
    }

    #[tokio::test]
    async fn test_mock_browser_locators() {
        let browser = MockBrowser::new().with_page(
            "https://acme.com/careers",
            r#"<body><p>Intro</p><button class="btn-search">Search Jobs</button><a href="/jobs">All</a></body>"#,
        );
        browser.navigate("https://acme.com/careers").await.unwrap();

        assert_eq!(browser.count(&Locator::own_text("search jobs")).await.unwrap(), 1);
        assert_eq!(browser.count(&Locator::css("a[href*='jobs']")).await.unwrap(), 1);
        assert_eq!(
            browser
                .count(&Locator::scoped_text("button, a", "Search Jobs"))
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            browser
                .count(&Locator::scoped_text("button, a", "search jobs"))
                .await
                .unwrap(),
            0
        );
        assert!(browser.click(&Locator::css(".missing")).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_browser_close_is_idempotent() {
        let browser = MockBrowser::new().with_page("https://acme.com", "<body></body>");
        browser.close().await;
        browser.close().await;

        assert!(browser.is_closed());
        assert_eq!(browser.close_count(), 2);
        assert!(matches!(
            browser.navigate("https://acme.com").await,
            Err(BrowserError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_mock_launcher() {
        let browser = MockBrowser::new();
        let launcher = MockLauncher::new(browser.clone());
        let driver = launcher.launch().await.unwrap();
        driver.close().await;

        assert!(browser.is_closed());
        assert!(MockLauncher::failing().launch().await.is_err());
    }

    #[tokio::test]
    async fn test_mock_fallback_respects_max_items() {
        let fallback = MockFallback::new().with_listings(
            (0..5).map(|i| PartialListing::new(format!("Role {}", i), format!("/jobs/{}", i))),
        );

        let items = fallback.extract("<html></html>", "https://acme.com", "Acme", 3).await.unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(fallback.call_count(), 1);
        assert!(!MockFallback::unavailable().is_available());
    }

    #[tokio::test]
    async fn test_mock_probe_defaults_to_not_found() {
        let probe = MockProbe::new().with_page("https://acme.com/careers", "Join us");

        let hit = probe.fetch("https://acme.com/careers").await.unwrap();
        let miss = probe.fetch("https://acme.com/jobs").await.unwrap();

        assert_eq!(hit.status, 200);
        assert_eq!(miss.status, 404);
        assert_eq!(probe.calls().len(), 2);
    }
}
