//! HTTP-based careers probe.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{ProbeError, ProbeResult};
use crate::traits::probe::{CareersProbe, ProbeResponse};

/// User agent sent with probe requests.
pub const PROBE_USER_AGENT: &str = "Mozilla/5.0 (compatible; JobMatcher/1.0)";

/// Probe that GETs candidate URLs, following redirects.
///
/// # Example
///
/// ```rust,ignore
/// use careers_extraction::probes::HttpProbe;
///
/// let probe = HttpProbe::new()?;
/// let sites = resolve_sites(&inputs, &probe).await;
/// ```
pub struct HttpProbe {
    client: reqwest::Client,
    user_agent: String,
}

impl HttpProbe {
    /// Create a probe with a 30 second timeout.
    pub fn new() -> ProbeResult<Self> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Create a probe with a custom request timeout.
    pub fn with_timeout(timeout: Duration) -> ProbeResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ProbeError::Http(Box::new(e)))?;
        Ok(Self {
            client,
            user_agent: PROBE_USER_AGENT.to_string(),
        })
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl CareersProbe for HttpProbe {
    async fn fetch(&self, url: &str) -> ProbeResult<ProbeResponse> {
        debug!(url = %url, "Probing careers URL");
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .send()
            .await
            .map_err(|e| request_error(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await.map_err(|e| request_error(url, e))?;

        debug!(url = %url, status, final_url = %final_url, "Probe response");
        Ok(ProbeResponse::new(status, final_url, body))
    }

    fn name(&self) -> &str {
        "http"
    }
}

fn request_error(url: &str, e: reqwest::Error) -> ProbeError {
    if e.is_timeout() {
        ProbeError::Timeout {
            url: url.to_string(),
        }
    } else {
        ProbeError::Http(Box::new(e))
    }
}
