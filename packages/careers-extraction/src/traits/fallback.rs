//! Fallback extractor trait for markup-based listing extraction.
//!
//! When the heuristic pipeline finds too few listings on a site, the engine
//! hands the rendered markup to a fallback extractor (typically an LLM).
//! The contract is deliberately loose: best-effort, no ordering guarantee,
//! possibly fewer than `max_items` results.

use async_trait::async_trait;

use crate::error::FallbackResult;
use crate::types::listing::PartialListing;

/// Markup-based listing extraction used when heuristics underperform.
#[async_trait]
pub trait FallbackExtractor: Send + Sync {
    /// Whether the extractor can be used at all (credentials present,
    /// service configured). Unavailable extractors are never called.
    fn is_available(&self) -> bool {
        true
    }

    /// Extract up to `max_items` candidate listings from rendered markup.
    ///
    /// Malformed markup must not produce an error; an error means the
    /// extractor itself failed (network, service, response format).
    async fn extract(
        &self,
        markup: &str,
        page_url: &str,
        company: &str,
        max_items: usize,
    ) -> FallbackResult<Vec<PartialListing>>;

    /// Extractor name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

/// The absent fallback: reports itself unavailable and extracts nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFallback;

#[async_trait]
impl FallbackExtractor for NoFallback {
    fn is_available(&self) -> bool {
        false
    }

    async fn extract(
        &self,
        _markup: &str,
        _page_url: &str,
        _company: &str,
        _max_items: usize,
    ) -> FallbackResult<Vec<PartialListing>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &str {
        "none"
    }
}

#[async_trait]
impl<F: FallbackExtractor + ?Sized> FallbackExtractor for Box<F> {
    fn is_available(&self) -> bool {
        (**self).is_available()
    }

    async fn extract(
        &self,
        markup: &str,
        page_url: &str,
        company: &str,
        max_items: usize,
    ) -> FallbackResult<Vec<PartialListing>> {
        (**self).extract(markup, page_url, company, max_items).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_fallback_is_unavailable_and_empty() {
        let fallback = NoFallback;
        assert!(!fallback.is_available());
        assert!(fallback
            .extract("<html></html>", "https://acme.com", "Acme", 20)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_boxed_fallback_delegates() {
        let boxed: Box<dyn FallbackExtractor> = Box::new(NoFallback);
        assert!(!boxed.is_available());
        assert_eq!(boxed.name(), "none");
    }
}
