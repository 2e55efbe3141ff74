//! Fallback extractor implementations backed by language models.
//!
//! This module provides a reference implementation of the
//! `FallbackExtractor` trait. Users can use it directly or implement their
//! own.

#[cfg(feature = "openai")]
mod openai;

#[cfg(feature = "openai")]
pub use openai::{parse_listings, OpenAiFallback, DEFAULT_MODEL};
