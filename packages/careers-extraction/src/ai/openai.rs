//! OpenAI implementation of the fallback extractor.
//!
//! Sends a compact digest of the rendered page (text plus links) to the chat
//! completions API and parses the JSON listing array it answers with.
//!
//! # Example
//!
//! ```rust,ignore
//! use careers_extraction::ai::OpenAiFallback;
//!
//! let fallback = OpenAiFallback::from_env()?.with_model("gpt-4o");
//! let engine = ExtractionEngine::new(ChromeLauncher::default(), fallback, EngineConfig::default());
//! ```

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FallbackError, FallbackResult};
use crate::pipeline::markup::page_digest;
use crate::traits::fallback::FallbackExtractor;
use crate::types::listing::PartialListing;

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Characters of page digest sent per request.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 30_000;

const SYSTEM_PROMPT: &str = r#"You extract job postings from the text of a company careers page.

Output JSON with this structure:
{
  "jobs": [
    {"title": "job title", "url": "link to the posting as it appears in LINKS", "location": "location or empty", "description": "one or two sentences or empty"}
  ]
}

Only include real job postings that have a link. Never invent postings or links."#;

/// OpenAI-based fallback extractor.
pub struct OpenAiFallback {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    max_input_chars: usize,
}

impl OpenAiFallback {
    /// Create a new extractor with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::from(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    /// Create from `OPENAI_API_KEY`, with the model from `OPENAI_MODEL` when set.
    pub fn from_env() -> FallbackResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| FallbackError::Config("OPENAI_API_KEY not set".into()))?;
        let fallback = Self::new(api_key);
        Ok(match std::env::var("OPENAI_MODEL") {
            Ok(model) if !model.trim().is_empty() => fallback.with_model(model.trim()),
            _ => fallback,
        })
    }

    /// Set the chat model (default: gpt-4o-mini).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set how much of the page digest is sent.
    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }

    /// Get the current model name.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn user_prompt(&self, markup: &str, page_url: &str, company: &str, max_items: usize) -> String {
        format!(
            "Company: {}\nCareers page: {}\nReturn at most {} jobs.\n\n{}",
            if company.is_empty() { "(unknown)" } else { company },
            page_url,
            max_items,
            page_digest(markup, self.max_input_chars)
        )
    }

    async fn chat(&self, user: String) -> FallbackResult<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user,
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_object".to_string(),
            },
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await
            .map_err(|e| FallbackError::Service(Box::new(e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(FallbackError::Response(format!(
                "OpenAI API error {}: {}",
                status, error_text
            )));
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| FallbackError::Service(Box::new(e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| FallbackError::Response("No response from OpenAI".into()))
    }
}

/// Parse a model answer into candidate listings.
///
/// Accepts `{"jobs": [...]}` or a bare array, optionally inside a markdown
/// code block.
pub fn parse_listings(response: &str) -> FallbackResult<Vec<PartialListing>> {
    let json_str = response
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    let value: serde_json::Value = serde_json::from_str(json_str)?;
    let items = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut object) => object
            .remove("jobs")
            .or_else(|| object.remove("listings"))
            .ok_or_else(|| FallbackError::Response("missing \"jobs\" array".into()))?,
        other => {
            return Err(FallbackError::Response(format!(
                "expected a JSON object or array, got {}",
                other
            )))
        }
    };

    Ok(serde_json::from_value(items)?)
}

#[async_trait]
impl FallbackExtractor for OpenAiFallback {
    fn is_available(&self) -> bool {
        !self.api_key.expose_secret().trim().is_empty()
    }

    async fn extract(
        &self,
        markup: &str,
        page_url: &str,
        company: &str,
        max_items: usize,
    ) -> FallbackResult<Vec<PartialListing>> {
        let user = self.user_prompt(markup, page_url, company, max_items);
        debug!(page_url, model = %self.model, prompt_chars = user.len(), "Requesting fallback extraction");

        let response = self.chat(user).await?;
        let mut listings = parse_listings(&response)?;
        listings.truncate(max_items);
        Ok(listings)
    }

    fn name(&self) -> &str {
        "openai"
    }
}

// Request/Response types

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}
