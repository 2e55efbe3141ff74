//! Run report types - what happened on each site.

use serde::{Deserialize, Serialize};

use crate::types::listing::JobListing;
use crate::types::site::SiteConfig;

/// Per-site diagnostics of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSummary {
    /// Provenance tag of the site
    pub source: String,

    /// Career page loaded
    pub url: String,

    /// Phrase whose control was clicked to reveal listings
    pub revealed_by: Option<String>,

    /// Scrolls that grew the page
    pub scroll_attempts: usize,

    /// Containers considered
    pub containers: usize,

    /// Candidates with a title and an accepted link
    pub candidates: usize,

    /// Heuristic listings emitted
    pub extracted: usize,

    /// Links rejected by accept-rules
    pub rejected: usize,

    /// Whether the fallback extractor ran
    pub fallback_invoked: bool,

    /// Listings added by the fallback extractor
    pub fallback_added: usize,

    /// Whether the run stopped on this site because the fetch limit was hit
    pub limit_reached: bool,

    /// Why the site failed, if it did
    pub error: Option<String>,
}

impl SiteSummary {
    /// An empty summary for a site.
    pub fn for_site(site: &SiteConfig) -> Self {
        Self {
            source: site.source.clone(),
            url: site.url.to_string(),
            ..Default::default()
        }
    }

    /// Total listings this site contributed.
    pub fn total(&self) -> usize {
        self.extracted + self.fallback_added
    }

    /// Whether the site failed before completing.
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Listings of a run together with per-site diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionRun {
    /// Listings in emission order
    pub listings: Vec<JobListing>,

    /// One summary per site visited, in visiting order
    pub sites: Vec<SiteSummary>,
}

impl ExtractionRun {
    /// Sites that failed.
    pub fn failed_sites(&self) -> impl Iterator<Item = &SiteSummary> {
        self.sites.iter().filter(|s| s.failed())
    }
}
