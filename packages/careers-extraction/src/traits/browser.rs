//! Browser traits for driving a rendered page.
//!
//! The engine never talks to a concrete browser. It receives a
//! [`BrowserLauncher`] at construction time and drives the single
//! [`BrowserDriver`] it launches for the whole run:
//!
//! - `ChromeLauncher` - headless Chromium over CDP (`browser` feature)
//! - `UnavailableBrowser` - always fails to launch (degraded mode)
//! - `MockLauncher` - in-memory pages for testing
//!
//! # Usage
//!
//! ```rust,ignore
//! let driver = launcher.launch().await?;
//! driver.navigate("https://acme.com/careers").await?;
//! let markup = driver.content().await?;
//! driver.close().await;
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::BrowserResult;

/// A way of finding elements in the live page.
///
/// Locators are evaluated by the driver, so they are plain data rather than
/// element handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Any element with a direct text node containing `phrase`,
    /// compared case-insensitively.
    OwnText { phrase: String },

    /// Elements matching a CSS selector.
    Css(String),

    /// Elements matching `scope` whose rendered text contains `phrase`
    /// exactly (case-sensitive).
    ScopedText { scope: String, phrase: String },
}

impl Locator {
    /// Elements whose own text contains `phrase`, ignoring case.
    pub fn own_text(phrase: impl Into<String>) -> Self {
        Self::OwnText {
            phrase: phrase.into().to_lowercase(),
        }
    }

    /// Elements matching a CSS selector.
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Elements within `scope` whose text contains `phrase`.
    pub fn scoped_text(scope: impl Into<String>, phrase: impl Into<String>) -> Self {
        Self::ScopedText {
            scope: scope.into(),
            phrase: phrase.into(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OwnText { phrase } => write!(f, "text~{:?}", phrase),
            Self::Css(selector) => write!(f, "css {:?}", selector),
            Self::ScopedText { scope, phrase } => write!(f, "{} containing {:?}", scope, phrase),
        }
    }
}

/// A single browser tab driven sequentially by the engine.
///
/// Every method is a bounded operation: implementations must not block
/// indefinitely on an unresponsive page.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Load a URL and wait for the navigation to finish.
    async fn navigate(&self, url: &str) -> BrowserResult<()>;

    /// Wait until an element matches `selector`, up to `timeout`.
    ///
    /// Returns `Ok(false)` on timeout.
    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
        poll: Duration,
    ) -> BrowserResult<bool>;

    /// Visible text of the document body.
    async fn body_text(&self) -> BrowserResult<String>;

    /// Number of elements matched by a locator.
    async fn count(&self, locator: &Locator) -> BrowserResult<usize>;

    /// Scroll the first element matched by a locator into view.
    async fn scroll_into_view(&self, locator: &Locator) -> BrowserResult<()>;

    /// Click the first element matched by a locator.
    async fn click(&self, locator: &Locator) -> BrowserResult<()>;

    /// Current scroll height of the document.
    async fn scroll_height(&self) -> BrowserResult<u64>;

    /// Scroll to the bottom of the document.
    async fn scroll_to_bottom(&self) -> BrowserResult<()>;

    /// Scroll back to the top of the document.
    async fn scroll_to_top(&self) -> BrowserResult<()>;

    /// Rendered markup of the current document.
    async fn content(&self) -> BrowserResult<String>;

    /// URL of the current document.
    async fn current_url(&self) -> BrowserResult<String>;

    /// Go back one entry in the tab's history.
    async fn go_back(&self) -> BrowserResult<()>;

    /// Shut the browser down. Must be safe to call more than once.
    async fn close(&self);

    /// Driver name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

/// Starts the browser used for a run.
///
/// Launch failure is the engine's "browser unavailable" degraded mode: the
/// run returns no listings instead of an error.
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// Start a browser and open its working tab.
    async fn launch(&self) -> BrowserResult<Box<dyn BrowserDriver>>;

    /// Launcher name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_text_is_lowercased() {
        let locator = Locator::own_text("View All Jobs");
        assert_eq!(
            locator,
            Locator::OwnText {
                phrase: "view all jobs".to_string()
            }
        );
    }

    #[test]
    fn test_scoped_text_keeps_case() {
        let locator = Locator::scoped_text("button, a", "Search Jobs");
        assert_eq!(locator.to_string(), "button, a containing \"Search Jobs\"");
    }
}
