//! Probe implementations for careers page discovery.
//!
//! # Available Probes
//!
//! - `HttpProbe` - Plain HTTP GET with redirects
//! - `MockProbe` - For testing (see [`crate::testing`])

mod http;

pub use http::{HttpProbe, PROBE_USER_AGENT};

// Re-export from traits for convenience
pub use crate::traits::probe::{CareersProbe, ProbeResponse};
