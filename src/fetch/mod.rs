//! Network acquisition from the platform's endpoints.
//!
//! The strategy chain tries the private GraphQL endpoint (several document
//! ids), then REST pagination. Strategy attempts per content id are
//! strictly sequential; parallelism across content ids belongs to the
//! external crawling harness.

pub mod chain;
pub mod client;
mod graphql;
mod rest;

use std::time::Duration;

use rand::Rng;
use reqwest::header::LOCATION;
use reqwest::{Response, StatusCode};

pub use chain::acquire_via_chain;
pub use client::build_client;
pub use rest::media_id_from_shortcode;

use crate::config::Config;
use crate::constants::LOGIN_PATH;

/// Check whether a status/location pair is a blocking signal: HTTP 403,
/// HTTP 429, or a redirect whose `Location` contains the login path.
#[must_use]
pub fn is_blocking_signal(status: StatusCode, location: Option<&str>) -> bool {
    if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
        return true;
    }
    status.is_redirection() && location.is_some_and(|l| l.contains(LOGIN_PATH))
}

pub(crate) fn response_is_blocking(response: &Response) -> bool {
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok());
    is_blocking_signal(response.status(), location)
}

/// Sleep the configured inter-request delay with ±25% jitter. Fixed
/// intervals are a scraping fingerprint.
pub(crate) async fn pause_between_requests(config: &Config) {
    if config.request_delay.is_zero() {
        return;
    }
    let base = u64::try_from(config.request_delay.as_millis()).unwrap_or(u64::MAX);
    let jitter = base / 4;
    let wait = base - jitter + rand::thread_rng().gen_range(0..=jitter * 2);
    tokio::time::sleep(Duration::from_millis(wait)).await;
}
