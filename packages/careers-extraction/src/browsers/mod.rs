//! Browser implementations for driving career pages.
//!
//! # Available Browsers
//!
//! - `ChromeLauncher` - Headless Chromium over CDP (requires `browser` feature)
//! - `UnavailableBrowser` - Never launches; the engine returns no listings
//! - `MockLauncher` - For testing (see [`crate::testing`])
//!
//! # Example
//!
//! ```rust,ignore
//! use careers_extraction::browsers::{ChromeConfig, ChromeLauncher};
//!
//! let launcher = ChromeLauncher::new(ChromeConfig::default().with_headless(false));
//! let engine = ExtractionEngine::without_fallback(launcher, EngineConfig::default());
//! ```

mod unavailable;

#[cfg(feature = "browser")]
mod chrome;

pub use unavailable::UnavailableBrowser;

#[cfg(feature = "browser")]
pub use chrome::{ChromeConfig, ChromeDriver, ChromeLauncher};

// Re-export from traits for convenience
pub use crate::traits::browser::{BrowserDriver, BrowserLauncher, Locator};
