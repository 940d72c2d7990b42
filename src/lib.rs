//! Instagram comment harvester library.
//!
//! Acquires comment and post metadata from a hostile, undocumented content
//! platform: a strategy chain tries multiple protocols to fetch comment
//! pages, and a schema-tolerant deep-search parser recovers structured
//! records from whatever shape of JSON or HTML comes back.

pub mod cache;
pub mod config;
pub mod constants;
pub mod extract;
pub mod fetch;
pub mod harness;
pub mod model;
pub mod pipeline;
