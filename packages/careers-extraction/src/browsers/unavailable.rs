//! The absent browser.

use async_trait::async_trait;

use crate::error::{BrowserError, BrowserResult};
use crate::traits::browser::{BrowserDriver, BrowserLauncher};

/// A launcher for environments without a browser.
///
/// Every launch fails, which the engine treats as "no listings" rather than
/// an error.
#[derive(Debug, Clone, Default)]
pub struct UnavailableBrowser {
    reason: Option<String>,
}

impl UnavailableBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record why no browser is available (reported by `launch`).
    pub fn with_reason(reason: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
        }
    }
}

#[async_trait]
impl BrowserLauncher for UnavailableBrowser {
    async fn launch(&self) -> BrowserResult<Box<dyn BrowserDriver>> {
        Err(BrowserError::Unavailable(
            self.reason
                .clone()
                .unwrap_or_else(|| "no browser configured".to_string()),
        ))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_launch_always_fails() {
        let result = UnavailableBrowser::with_reason("chromium not installed").launch().await;

        match result {
            Err(BrowserError::Unavailable(reason)) => assert_eq!(reason, "chromium not installed"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("launch should fail"),
        }
    }
}
