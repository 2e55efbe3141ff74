//! Probe trait for checking candidate careers URLs.
//!
//! Used by the site resolver to turn a bare company slug into a careers page
//! URL. Implementations perform one bounded GET per call.

use async_trait::async_trait;

use crate::error::ProbeResult;

/// Outcome of a single probe request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    /// HTTP status code
    pub status: u16,

    /// URL after following redirects
    pub final_url: String,

    /// Response body as text
    pub body: String,
}

impl ProbeResponse {
    /// Create a response.
    pub fn new(status: u16, final_url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            final_url: final_url.into(),
            body: body.into(),
        }
    }

    /// Whether this looks like a careers page: status 200 and a body that
    /// mentions careers or jobs.
    pub fn looks_like_careers_page(&self) -> bool {
        if self.status != 200 {
            return false;
        }
        let body = self.body.to_lowercase();
        body.contains("career") || body.contains("job")
    }
}

/// Fetches a candidate careers URL.
#[async_trait]
pub trait CareersProbe: Send + Sync {
    /// GET `url`, following redirects, within the implementation's timeout.
    async fn fetch(&self, url: &str) -> ProbeResult<ProbeResponse>;

    /// Probe name (for logging/debugging).
    fn name(&self) -> &str {
        "unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_careers_page_detection() {
        assert!(ProbeResponse::new(200, "https://acme.com/careers", "Join our CAREERS team").looks_like_careers_page());
        assert!(ProbeResponse::new(200, "https://acme.com/jobs", "Open Jobs").looks_like_careers_page());
        assert!(!ProbeResponse::new(200, "https://acme.com", "Welcome to Acme").looks_like_careers_page());
        assert!(!ProbeResponse::new(404, "https://acme.com/careers", "careers not found").looks_like_careers_page());
    }
}
