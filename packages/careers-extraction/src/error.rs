//! Typed errors for the careers extraction library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling.

use thiserror::Error;

/// Errors that abort the processing of a single site.
///
/// None of these abort a run: the engine logs them, keeps whatever the site
/// already produced and moves on to the next site.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Browser interaction failed
    #[error("browser error: {0}")]
    Browser(#[from] BrowserError),

    /// A configured CSS selector could not be parsed
    #[error("invalid {field} selector {selector:?}: {reason}")]
    InvalidSelector {
        field: &'static str,
        selector: String,
        reason: String,
    },

    /// Site input could not be turned into an extraction plan
    #[error("invalid site input {input:?}: {reason}")]
    InvalidSite { input: String, reason: String },
}

/// Errors raised by a browser driver.
#[derive(Debug, Error)]
pub enum BrowserError {
    /// No browser could be started (missing binary, sandbox failure, ...)
    #[error("browser unavailable: {0}")]
    Unavailable(String),

    /// Navigation to a URL failed
    #[error("navigation to {url} failed: {reason}")]
    Navigation { url: String, reason: String },

    /// Script evaluation failed in the page
    #[error("script evaluation failed: {0}")]
    Script(String),

    /// A locator matched nothing when an element was required
    #[error("no element matches {0}")]
    NoSuchElement(String),

    /// The browser connection has gone away
    #[error("browser session closed")]
    Closed,
}

/// Errors raised while probing conventional careers URLs.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Request timed out
    #[error("timeout probing: {url}")]
    Timeout { url: String },
}

/// Errors raised by a fallback extractor.
#[derive(Debug, Error)]
pub enum FallbackError {
    /// The backing service failed or rejected the request
    #[error("service error: {0}")]
    Service(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The service answered with something that is not a listing array
    #[error("unparseable response: {0}")]
    Response(String),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Missing credentials or other configuration
    #[error("config error: {0}")]
    Config(String),
}

/// Result type alias for site-level operations.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Result type alias for browser operations.
pub type BrowserResult<T> = std::result::Result<T, BrowserError>;

/// Result type alias for probe operations.
pub type ProbeResult<T> = std::result::Result<T, ProbeError>;

/// Result type alias for fallback extractor operations.
pub type FallbackResult<T> = std::result::Result<T, FallbackError>;
