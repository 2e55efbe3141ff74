//! Configuration types for the extraction engine.

use std::time::Duration;

/// Configuration for an extraction run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum listings returned by a run, across all sites.
    ///
    /// Processing stops the moment this many listings have been collected,
    /// even in the middle of a site. Default: 50.
    pub fetch_limit: usize,

    /// Sites yielding fewer heuristic listings than this consult the
    /// fallback extractor. Default: 3.
    pub fallback_threshold: usize,

    /// Upper bound passed to the fallback extractor. Default: 20.
    pub fallback_max_items: usize,

    /// Detail-page descriptions are truncated to this many characters.
    ///
    /// Default: 2000.
    pub description_max_chars: usize,

    /// Delays and timeouts used while driving the browser.
    pub timings: Timings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch_limit: 50,
            fallback_threshold: 3,
            fallback_max_items: 20,
            description_max_chars: 2000,
            timings: Timings::default(),
        }
    }
}

impl EngineConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global fetch limit.
    pub fn with_fetch_limit(mut self, limit: usize) -> Self {
        self.fetch_limit = limit;
        self
    }

    /// Set the fallback threshold.
    pub fn with_fallback_threshold(mut self, threshold: usize) -> Self {
        self.fallback_threshold = threshold;
        self
    }

    /// Set the fallback item bound.
    pub fn with_fallback_max_items(mut self, max: usize) -> Self {
        self.fallback_max_items = max;
        self
    }

    /// Set the detail description cap.
    pub fn with_description_max_chars(mut self, max: usize) -> Self {
        self.description_max_chars = max;
        self
    }

    /// Set browser timings.
    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }
}

/// Delays and bounds used by the page interaction controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Timings {
    /// Upper bound on waiting for a site's `wait_selector`.
    pub wait_selector_timeout: Duration,

    /// Polling interval while waiting for a selector.
    pub wait_poll_interval: Duration,

    /// Pause between scrolling a reveal control into view and clicking it.
    pub reveal_pause: Duration,

    /// Minimum settle delay after a reveal click.
    pub reveal_settle: Duration,

    /// Wait after each scroll to the bottom.
    pub scroll_wait: Duration,

    /// Extra wait before re-reading an unchanged height.
    pub scroll_recheck: Duration,

    /// Maximum scroll-to-bottom attempts.
    pub max_scroll_attempts: usize,

    /// Pause after returning to the top of the page.
    pub scroll_top_pause: Duration,

    /// Wait after opening a detail page.
    pub detail_wait: Duration,

    /// Wait after navigating back from a detail page.
    pub detail_back_wait: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            wait_selector_timeout: Duration::from_secs(12),
            wait_poll_interval: Duration::from_millis(250),
            reveal_pause: Duration::from_millis(500),
            reveal_settle: Duration::from_secs(3),
            scroll_wait: Duration::from_secs(2),
            scroll_recheck: Duration::from_secs(1),
            max_scroll_attempts: 5,
            scroll_top_pause: Duration::from_millis(500),
            detail_wait: Duration::from_secs(2),
            detail_back_wait: Duration::from_secs(1),
        }
    }
}

impl Timings {
    /// Timings with every delay set to zero, for tests against in-memory
    /// browsers.
    pub fn instant() -> Self {
        Self {
            wait_selector_timeout: Duration::ZERO,
            wait_poll_interval: Duration::ZERO,
            reveal_pause: Duration::ZERO,
            reveal_settle: Duration::ZERO,
            scroll_wait: Duration::ZERO,
            scroll_recheck: Duration::ZERO,
            max_scroll_attempts: 5,
            scroll_top_pause: Duration::ZERO,
            detail_wait: Duration::ZERO,
            detail_back_wait: Duration::ZERO,
        }
    }

    /// Settle delay after a reveal click: the configured minimum or the
    /// site's own delay, whichever is longer.
    pub fn reveal_settle_for(&self, sleep_seconds: f64) -> Duration {
        self.reveal_settle.max(seconds(sleep_seconds))
    }
}

/// Convert a number of seconds to a `Duration`.
///
/// Negative and NaN values become zero; values too large for a `Duration`
/// saturate.
pub(crate) fn seconds(value: f64) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}
