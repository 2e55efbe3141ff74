//! Adaptive Job-Listing Extraction Library
//!
//! Drives a real browser through heterogeneous company career pages and
//! turns whatever markup they render into a uniform list of job postings.
//!
//! # Design Philosophy
//!
//! **"Heuristics first, models last"**
//!
//! - One browser, sites visited strictly in order
//! - Extraction runs on a rendered snapshot, not on live element handles
//! - Ordered strategy tables for link discovery and reveal controls
//! - A failing site never fails the run
//! - Browser and fallback extractor are injected capabilities
//!
//! # Usage
//!
//! ```rust,ignore
//! use careers_extraction::{resolve_sites, EngineConfig, ExtractionEngine, SiteInput};
//! use careers_extraction::browsers::ChromeLauncher;
//! use careers_extraction::probes::HttpProbe;
//!
//! let inputs = vec![SiteInput::from("https://acme.com/careers"), SiteInput::from("globex")];
//! let sites = resolve_sites(&inputs, &HttpProbe::new()?).await;
//!
//! let engine = ExtractionEngine::without_fallback(ChromeLauncher::default(), EngineConfig::default());
//! let listings = engine.run(&sites).await;
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Capability abstractions (BrowserLauncher, FallbackExtractor, CareersProbe)
//! - [`types`] - Site plans, listings, configuration and run reports
//! - [`pipeline`] - Resolution, page interaction, extraction and aggregation
//! - [`browsers`] - Browser implementations (ChromeLauncher, UnavailableBrowser)
//! - [`probes`] - Careers page probes (HttpProbe)
//! - [`ai`] - Model-backed fallback extractors (`openai` feature)
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod browsers;
pub mod error;
pub mod pipeline;
pub mod probes;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{BrowserError, ExtractionError, FallbackError, ProbeError};
pub use traits::{
    browser::{BrowserDriver, BrowserLauncher, Locator},
    fallback::{FallbackExtractor, NoFallback},
    probe::{CareersProbe, ProbeResponse},
};
pub use types::{
    config::{EngineConfig, Timings},
    listing::{JobListing, PartialListing},
    report::{ExtractionRun, SiteSummary},
    site::{SiteConfig, SiteInput, SiteSpec},
};

// Re-export the engine and resolver
pub use pipeline::{resolve_site, resolve_sites, ExtractionEngine, ExtractionSession};

// Re-export implementations
pub use browsers::UnavailableBrowser;

#[cfg(feature = "browser")]
pub use browsers::{ChromeConfig, ChromeLauncher};

pub use probes::HttpProbe;

// Re-export testing utilities
pub use testing::{MockBrowser, MockFallback, MockLauncher, MockProbe};
