//! Data types for the careers extraction engine.

pub mod config;
pub mod listing;
pub mod report;
pub mod site;
