//! Seams to the external crawling harness.
//!
//! Queueing, concurrency, retries, and proxy *rotation policy* all live in
//! the harness; this crate only consumes a proxy per client construction.

use url::Url;

/// Supplies a fresh proxy URL per request-client construction.
pub trait ProxyProvider: Send + Sync {
    /// The next proxy to route requests through, or `None` for a direct
    /// connection.
    fn next_proxy(&self) -> Option<Url>;
}

/// Trivial provider that always hands out the same proxy.
#[derive(Debug, Clone)]
pub struct FixedProxy {
    url: Url,
}

impl FixedProxy {
    #[must_use]
    pub fn new(url: Url) -> Self {
        Self { url }
    }
}

impl ProxyProvider for FixedProxy {
    fn next_proxy(&self) -> Option<Url> {
        Some(self.url.clone())
    }
}
