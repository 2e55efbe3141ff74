//! Result aggregation across sites.
//!
//! Listings are kept in emission order. The fetch limit is global: once it
//! is reached nothing more is accepted and the engine stops.

use std::collections::HashSet;

use crate::types::listing::JobListing;

/// Outcome of offering a listing to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Appended; there is room for more
    Accepted,
    /// Appended, and the limit is now reached
    Filled,
    /// Not appended: a listing with the same URL was already collected
    Duplicate,
    /// Not appended: the limit was already reached
    Full,
}

impl Admission {
    /// Whether the listing was appended.
    pub fn is_added(self) -> bool {
        matches!(self, Self::Accepted | Self::Filled)
    }

    /// Whether the limit is reached after this admission.
    pub fn is_full(self) -> bool {
        matches!(self, Self::Filled | Self::Full)
    }
}

/// Ordered, limit-bounded collection of listings for one run.
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    listings: Vec<JobListing>,
    seen_urls: HashSet<String>,
    fetch_limit: usize,
}

impl ResultAggregator {
    /// Create an empty aggregator holding at most `fetch_limit` listings.
    pub fn new(fetch_limit: usize) -> Self {
        Self {
            listings: Vec::new(),
            seen_urls: HashSet::new(),
            fetch_limit,
        }
    }

    /// Append a heuristic listing.
    ///
    /// Heuristic listings are not deduplicated: two containers linking to
    /// the same posting both count.
    pub fn push(&mut self, listing: JobListing) -> Admission {
        if self.is_full() {
            return Admission::Full;
        }
        self.append(listing)
    }

    /// Append a listing unless its URL was already collected.
    pub fn push_unseen(&mut self, listing: JobListing) -> Admission {
        if self.is_full() {
            return Admission::Full;
        }
        if self.contains_url(&listing.url) {
            return Admission::Duplicate;
        }
        self.append(listing)
    }

    fn append(&mut self, listing: JobListing) -> Admission {
        self.seen_urls.insert(listing.url.clone());
        self.listings.push(listing);
        if self.is_full() {
            Admission::Filled
        } else {
            Admission::Accepted
        }
    }

    /// Whether a listing with this URL was collected.
    pub fn contains_url(&self, url: &str) -> bool {
        self.seen_urls.contains(url)
    }

    /// Whether the fetch limit is reached.
    pub fn is_full(&self) -> bool {
        self.listings.len() >= self.fetch_limit
    }

    /// Listings still accepted before the limit.
    pub fn remaining(&self) -> usize {
        self.fetch_limit.saturating_sub(self.listings.len())
    }

    pub fn fetch_limit(&self) -> usize {
        self.fetch_limit
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Collected listings in emission order.
    pub fn listings(&self) -> &[JobListing] {
        &self.listings
    }

    pub fn into_listings(self) -> Vec<JobListing> {
        self.listings
    }
}
