//! Extraction pipeline - the core of the library.
//!
//! The pipeline orchestrates:
//! - Site resolution (bare URL, company slug, structured config)
//! - Page interaction (navigate, await readiness, reveal, scroll)
//! - Listing extraction over the rendered snapshot
//! - Link normalization and accept-rules
//! - Fallback extraction for low-yield sites
//! - Result aggregation under a global fetch limit

pub mod aggregate;
pub mod engine;
pub mod extract;
pub mod fallback;
pub mod interact;
pub mod links;
pub mod markup;
pub mod resolve;
pub mod session;

pub use aggregate::{Admission, ResultAggregator};
pub use engine::ExtractionEngine;
pub use extract::{
    detail_description, extract_listings, resolve_link, Candidate, LinkMethod, PageExtraction,
    LINK_STRATEGIES,
};
pub use fallback::{merge_fallback, promote, should_invoke, FallbackMerge};
pub use interact::{
    find_reveal_phrase, matching_reveal_phrases, PageController, PageState, PreparedPage,
    Readiness, RevealMethod, RevealOutcome, ScrollOutcome, REVEAL_STRATEGIES,
};
pub use links::{is_navigable, normalize, LinkFilter, Rejection};
pub use resolve::{
    best_guess_url, candidate_urls, classify, discover_careers_url, from_spec, resolve_site,
    resolve_sites, BareTarget, CAREERS_URL_PATTERNS,
};
pub use session::ExtractionSession;
