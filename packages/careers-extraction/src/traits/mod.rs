//! Core trait abstractions for the careers extraction library.
//!
//! These traits are the capabilities the engine is constructed with:
//! a browser to drive, a fallback extractor, and a probe for slug
//! resolution.

pub mod browser;
pub mod fallback;
pub mod probe;
