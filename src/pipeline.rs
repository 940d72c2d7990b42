//! Top-level acquisition pipeline for one content id.
//!
//! Drives the fetch strategy chain; when neither API strategy yields
//! anything and the platform hasn't blocked us, falls back to scraping the
//! plain post page and running it through the response parser.

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::extract::{parse_html_response, ExtractError};
use crate::fetch::{acquire_via_chain, build_client, response_is_blocking};
use crate::harness::ProxyProvider;
use crate::model::{dedup_comments, AcquisitionReport, ParseResult};

/// Acquires comments and post metadata for content ids, one at a time.
pub struct AcquisitionPipeline {
    client: Client,
    config: Config,
}

/// Outcome of the secondary post-page scrape.
enum PageScrape {
    Parsed(ParseResult),
    Blocked,
    Nothing,
}

impl AcquisitionPipeline {
    /// Build a pipeline from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be constructed.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_proxies(config, None)
    }

    /// Build a pipeline that routes requests through harness-supplied
    /// proxies.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be constructed.
    pub fn with_proxies(config: Config, proxies: Option<&dyn ProxyProvider>) -> Result<Self> {
        config.validate().context("Invalid configuration")?;
        let client = build_client(&config, proxies)?;
        Ok(Self { client, config })
    }

    /// Acquire up to `max_comments` comments for one content id.
    ///
    /// Never fails for platform-shape drift or blocking; those surface as
    /// flags on the report. The returned comment list is deduplicated by
    /// (username, text) and never exceeds `max_comments`.
    pub async fn acquire(&self, shortcode: &str, max_comments: usize) -> AcquisitionReport {
        let outcome =
            acquire_via_chain(&self.client, &self.config, shortcode, max_comments).await;

        let mut comments = outcome.comments;
        let mut blocked = outcome.blocked;
        let mut post = None;

        if comments.is_empty() && !blocked {
            debug!(shortcode, "Strategy chain empty, scraping plain post page");
            match self.scrape_post_page(shortcode).await {
                PageScrape::Parsed(result) => {
                    post = result.post;
                    comments = result.comments;
                }
                PageScrape::Blocked => blocked = true,
                PageScrape::Nothing => {}
            }
        }

        let mut comments = dedup_comments(comments);
        comments.truncate(max_comments);
        let exhausted = comments.is_empty();

        info!(
            shortcode,
            comments = comments.len(),
            blocked,
            exhausted,
            "Acquisition finished"
        );

        AcquisitionReport {
            shortcode: shortcode.to_string(),
            post,
            comments,
            blocked,
            exhausted,
            fetched_at: Utc::now(),
        }
    }

    async fn scrape_post_page(&self, shortcode: &str) -> PageScrape {
        let url = format!("{}/{shortcode}/", self.config.page_base_url);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(shortcode, error = %e, "Post page request failed");
                return PageScrape::Nothing;
            }
        };

        if response_is_blocking(&response) {
            warn!(shortcode, status = %response.status(), "Post page fetch blocked");
            return PageScrape::Blocked;
        }
        if !response.status().is_success() {
            debug!(shortcode, status = %response.status(), "Post page unavailable");
            return PageScrape::Nothing;
        }

        let html = match response.text().await {
            Ok(html) => html,
            Err(e) => {
                warn!(shortcode, error = %e, "Failed to read post page body");
                return PageScrape::Nothing;
            }
        };

        match parse_html_response(&html, self.config.deep_merge_cap) {
            Ok(result) if !result.is_empty() => PageScrape::Parsed(result),
            Ok(_) => PageScrape::Nothing,
            Err(ExtractError::LoginWall) => {
                warn!(shortcode, "Post page is a login wall");
                PageScrape::Blocked
            }
        }
    }
}
