//! Run-scoped browser session.

use tracing::debug;

use crate::pipeline::aggregate::ResultAggregator;
use crate::traits::browser::BrowserDriver;
use crate::types::listing::JobListing;

/// State bound to one browser for one run: the driven tab, the last scroll
/// height observed, and the shared result list.
pub struct ExtractionSession {
    pub(crate) driver: Box<dyn BrowserDriver>,
    pub(crate) last_scroll_height: u64,
    pub(crate) results: ResultAggregator,
}

impl ExtractionSession {
    /// Start a session over a launched driver.
    pub fn new(driver: Box<dyn BrowserDriver>, fetch_limit: usize) -> Self {
        Self {
            driver,
            last_scroll_height: 0,
            results: ResultAggregator::new(fetch_limit),
        }
    }

    pub fn driver(&self) -> &dyn BrowserDriver {
        self.driver.as_ref()
    }

    pub fn last_scroll_height(&self) -> u64 {
        self.last_scroll_height
    }

    pub fn results(&self) -> &ResultAggregator {
        &self.results
    }

    /// Close the browser and hand back the collected listings.
    pub async fn finish(self) -> Vec<JobListing> {
        debug!(driver = self.driver.name(), collected = self.results.len(), "Closing browser session");
        self.driver.close().await;
        self.results.into_listings()
    }
}
