//! Listing types - extracted job postings.

use serde::{Deserialize, Serialize};

/// A job posting extracted from a career page.
///
/// `title` and `url` are always non-empty; every other field is an empty
/// string when unavailable. `careers_url` records the page the listing was
/// found on and is never used in place of `url`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobListing {
    pub title: String,
    pub company: String,
    pub location: String,
    pub description: String,
    pub url: String,
    pub careers_url: String,
    pub source: String,
}

/// A candidate listing returned by a fallback extractor.
///
/// Fallback extractors are best-effort, so every field is optional. Only
/// candidates carrying both a title and a URL are promoted to
/// [`JobListing`]s.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialListing {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub careers_url: Option<String>,
    pub source: Option<String>,
}

impl PartialListing {
    /// Create a candidate with a title and URL.
    pub fn new(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            url: Some(url.into()),
            ..Default::default()
        }
    }

    /// Set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Trimmed title, if non-empty.
    pub fn title_text(&self) -> Option<&str> {
        present(&self.title)
    }

    /// Trimmed URL, if non-empty.
    pub fn url_text(&self) -> Option<&str> {
        present(&self.url)
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
