//! Headless Chromium driver over the DevTools protocol.
//!
//! Locators are evaluated in the page by generated JavaScript, so the
//! reveal strategies see the live DOM exactly as a user would.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Handler, Page};
use futures::StreamExt;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::{BrowserError, BrowserResult};
use crate::traits::browser::{BrowserDriver, BrowserLauncher, Locator};

/// Desktop Chrome user agent sent by default.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Launch settings for Chromium.
#[derive(Debug, Clone)]
pub struct ChromeConfig {
    /// Run without a window
    pub headless: bool,

    /// Viewport width and height
    pub window_size: (u32, u32),

    pub user_agent: String,

    /// Extra command line switches
    pub extra_args: Vec<String>,

    /// Timeout of individual DevTools requests
    pub request_timeout: Duration,

    /// Upper bound on a page load
    pub navigation_timeout: Duration,

    /// Chromium binary (found on PATH when unset)
    pub executable: Option<PathBuf>,
}

impl Default for ChromeConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_size: (1920, 1080),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            extra_args: Vec::new(),
            request_timeout: Duration::from_secs(30),
            navigation_timeout: Duration::from_secs(60),
            executable: None,
        }
    }
}

impl ChromeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the browser window.
    pub fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Add a command line switch.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.extra_args.push(arg.into());
        self
    }

    pub fn with_navigation_timeout(mut self, timeout: Duration) -> Self {
        self.navigation_timeout = timeout;
        self
    }

    pub fn with_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.executable = Some(path.into());
        self
    }

    /// Command line switches passed on top of chromiumoxide's defaults.
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "--disable-dev-shm-usage".to_string(),
            "--disable-gpu".to_string(),
            format!("--user-agent={}", self.user_agent),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }

    fn to_browser_config(&self) -> BrowserResult<BrowserConfig> {
        let (width, height) = self.window_size;
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(width, height)
            .request_timeout(self.request_timeout);
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        for arg in self.args() {
            builder = builder.arg(arg);
        }
        builder.build().map_err(BrowserError::Unavailable)
    }
}

/// Launches a [`ChromeDriver`] per run.
#[derive(Debug, Clone, Default)]
pub struct ChromeLauncher {
    config: ChromeConfig,
}

impl ChromeLauncher {
    pub fn new(config: ChromeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChromeConfig {
        &self.config
    }
}

#[async_trait]
impl BrowserLauncher for ChromeLauncher {
    async fn launch(&self) -> BrowserResult<Box<dyn BrowserDriver>> {
        let driver = ChromeDriver::launch(&self.config).await?;
        Ok(Box::new(driver))
    }

    fn name(&self) -> &str {
        "chromium"
    }
}

/// One Chromium process with a single working tab.
pub struct ChromeDriver {
    browser: Mutex<Option<Browser>>,
    page: Page,
    handler_task: JoinHandle<()>,
    closed: Arc<AtomicBool>,
    navigation_timeout: Duration,
}

impl ChromeDriver {
    /// Start Chromium and open a blank tab.
    pub async fn launch(config: &ChromeConfig) -> BrowserResult<Self> {
        let (mut browser, handler) = Browser::launch(config.to_browser_config()?)
            .await
            .map_err(|e| BrowserError::Unavailable(e.to_string()))?;

        let closed = Arc::new(AtomicBool::new(false));
        let handler_task = spawn_handler_task(handler, Arc::clone(&closed));

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let _ = browser.close().await;
                handler_task.abort();
                return Err(BrowserError::Unavailable(e.to_string()));
            }
        };

        info!(headless = config.headless, "Launched Chromium");
        Ok(Self {
            browser: Mutex::new(Some(browser)),
            page,
            handler_task,
            closed,
            navigation_timeout: config.navigation_timeout,
        })
    }

    fn ensure_open(&self) -> BrowserResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(BrowserError::Closed)
        } else {
            Ok(())
        }
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> BrowserResult<T> {
        self.ensure_open()?;
        let result = self.page.evaluate(script).await.map_err(script_error)?;
        result.into_value::<T>().map_err(script_error)
    }
}

fn spawn_handler_task(mut handler: Handler, closed: Arc<AtomicBool>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = handler.next().await {
            if let Err(e) = event {
                debug!(error = %e, "Chromium handler event error");
            }
        }
        closed.store(true, Ordering::SeqCst);
    })
}

fn script_error(e: impl std::fmt::Display) -> BrowserError {
    BrowserError::Script(e.to_string())
}

/// A JavaScript string literal.
fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

/// JavaScript expression evaluating to the array of elements a locator
/// matches, in document order.
pub(crate) fn locator_expression(locator: &Locator) -> String {
    match locator {
        Locator::Css(selector) => {
            format!("Array.from(document.querySelectorAll({}))", js_string(selector))
        }
        Locator::OwnText { phrase } => format!(
            "Array.from(document.body ? document.body.querySelectorAll('*') : []).filter(el => \
             Array.from(el.childNodes).some(n => n.nodeType === Node.TEXT_NODE && \
             n.textContent.toLowerCase().includes({})))",
            js_string(phrase)
        ),
        Locator::ScopedText { scope, phrase } => format!(
            "Array.from(document.querySelectorAll({})).filter(el => \
             (el.innerText || el.textContent || '').includes({}))",
            js_string(scope),
            js_string(phrase)
        ),
    }
}

/// Script running `action` on the first match of a locator. Evaluates to
/// `false` when nothing matches.
fn first_match_script(locator: &Locator, action: &str) -> String {
    format!(
        "(() => {{ const found = {}; if (!found.length) return false; {}; return true; }})()",
        locator_expression(locator),
        action
    )
}

#[async_trait]
impl BrowserDriver for ChromeDriver {
    async fn navigate(&self, url: &str) -> BrowserResult<()> {
        self.ensure_open()?;
        let navigation = tokio::time::timeout(self.navigation_timeout, self.page.goto(url)).await;
        match navigation {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: e.to_string(),
            }),
            Err(_) => Err(BrowserError::Navigation {
                url: url.to_string(),
                reason: format!("timed out after {:?}", self.navigation_timeout),
            }),
        }
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
        poll: Duration,
    ) -> BrowserResult<bool> {
        let script = format!("document.querySelector({}) !== null", js_string(selector));
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.eval::<bool>(script.clone()).await? {
                return Ok(true);
            }
            if tokio::time::Instant::now() >= deadline {
                return Ok(false);
            }
            tokio::time::sleep(poll).await;
        }
    }

    async fn body_text(&self) -> BrowserResult<String> {
        self.eval("document.body ? document.body.innerText : ''".to_string())
            .await
    }

    async fn count(&self, locator: &Locator) -> BrowserResult<usize> {
        self.eval(format!("{}.length", locator_expression(locator)))
            .await
    }

    async fn scroll_into_view(&self, locator: &Locator) -> BrowserResult<()> {
        let script = first_match_script(locator, "found[0].scrollIntoView({block: 'center'})");
        if self.eval::<bool>(script).await? {
            Ok(())
        } else {
            Err(BrowserError::NoSuchElement(locator.to_string()))
        }
    }

    async fn click(&self, locator: &Locator) -> BrowserResult<()> {
        let script = first_match_script(locator, "found[0].click()");
        if self.eval::<bool>(script).await? {
            Ok(())
        } else {
            Err(BrowserError::NoSuchElement(locator.to_string()))
        }
    }

    async fn scroll_height(&self) -> BrowserResult<u64> {
        let height: f64 = self
            .eval("document.body ? document.body.scrollHeight : 0".to_string())
            .await?;
        Ok(height.max(0.0) as u64)
    }

    async fn scroll_to_bottom(&self) -> BrowserResult<()> {
        self.eval::<bool>(
            "(() => { window.scrollTo(0, document.body ? document.body.scrollHeight : 0); return true; })()"
                .to_string(),
        )
        .await
        .map(|_| ())
    }

    async fn scroll_to_top(&self) -> BrowserResult<()> {
        self.eval::<bool>("(() => { window.scrollTo(0, 0); return true; })()".to_string())
            .await
            .map(|_| ())
    }

    async fn content(&self) -> BrowserResult<String> {
        self.ensure_open()?;
        self.page.content().await.map_err(script_error)
    }

    async fn current_url(&self) -> BrowserResult<String> {
        self.ensure_open()?;
        let url = self.page.url().await.map_err(script_error)?;
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn go_back(&self) -> BrowserResult<()> {
        self.eval::<bool>("(() => { window.history.back(); return true; })()".to_string())
            .await?;
        if let Err(e) = self.page.wait_for_navigation().await {
            debug!(error = %e, "No navigation observed after going back");
        }
        Ok(())
    }

    async fn close(&self) {
        let browser = self.browser.lock().await.take();
        let Some(mut browser) = browser else {
            return;
        };

        if let Err(e) = browser.close().await {
            warn!(error = %e, "Failed to close Chromium cleanly");
        }
        if let Err(e) = browser.wait().await {
            debug!(error = %e, "Failed to wait for Chromium exit");
        }
        self.handler_task.abort();
        self.closed.store(true, Ordering::SeqCst);
        info!("Closed Chromium");
    }

    fn name(&self) -> &str {
        "chromium"
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}
