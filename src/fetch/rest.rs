//! REST phase of the fetch strategy chain.
//!
//! Thinner than GraphQL (no post metadata, weaker ordering) but more
//! stable, so it runs as the fallback. The endpoint is media-id scoped;
//! the media id is derived locally from the shortcode instead of costing
//! an extra lookup request.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::constants::{REST_MAX_PAGES, SHORTCODE_ALPHABET};
use crate::fetch::pause_between_requests;
use crate::model::{Comment, PageCursor};

/// Result of the REST phase.
#[derive(Debug, Default)]
pub(super) struct RestPhase {
    pub comments: Vec<Comment>,
    /// 401/403 from the REST endpoint: the session itself is likely
    /// invalid, a stronger diagnostic than a deprecated GraphQL doc id.
    pub blocked: bool,
}

#[derive(Debug, Deserialize)]
struct RestCommentsResponse {
    #[serde(default)]
    comments: Vec<RestComment>,
    #[serde(default)]
    next_min_id: Option<String>,
    #[serde(default)]
    has_more_comments: bool,
}

#[derive(Debug, Deserialize)]
struct RestComment {
    #[serde(default)]
    text: String,
    #[serde(default)]
    user: RestUser,
}

#[derive(Debug, Default, Deserialize)]
struct RestUser {
    #[serde(default)]
    username: String,
}

/// Paginate the media-scoped comments endpoint with a `min_id` cursor.
pub(super) async fn fetch_comments(
    client: &Client,
    config: &Config,
    shortcode: &str,
    max_comments: usize,
) -> RestPhase {
    let mut phase = RestPhase::default();

    let Some(media_id) = media_id_from_shortcode(shortcode) else {
        debug!(shortcode, "Shortcode does not decode to a media id, skipping REST phase");
        return phase;
    };

    let url = format!("{}/{media_id}/comments/", config.rest_base_url);
    let mut cursor: Option<PageCursor> = None;

    for page in 0..REST_MAX_PAGES {
        if page > 0 {
            pause_between_requests(config).await;
        }

        let mut request = client
            .get(&url)
            .query(&[("can_support_threading", "true")]);
        if let Some(cursor) = &cursor {
            request = request.query(&[("min_id", cursor.as_str())]);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(shortcode, media_id, page, error = %e, "REST request failed");
                break;
            }
        };

        match response.status() {
            StatusCode::NOT_FOUND => {
                // Media truly has no comments endpoint or the id is invalid.
                debug!(shortcode, media_id, "REST endpoint returned 404");
                break;
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                warn!(
                    shortcode,
                    media_id,
                    status = %response.status(),
                    "REST endpoint refused the session"
                );
                phase.blocked = true;
                break;
            }
            status if !status.is_success() => {
                // Transient; the harness may retry the whole content id.
                warn!(shortcode, media_id, status = %status, "Unexpected REST status");
                break;
            }
            _ => {}
        }

        let body: RestCommentsResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                warn!(shortcode, media_id, page, error = %e, "REST response was not valid JSON");
                break;
            }
        };

        let batch = body.comments.len();
        for comment in body.comments {
            if phase.comments.len() >= max_comments {
                break;
            }
            if comment.text.is_empty() {
                continue;
            }
            phase
                .comments
                .push(Comment::new(comment.user.username, comment.text));
        }

        debug!(
            shortcode,
            media_id,
            page,
            batch,
            total = phase.comments.len(),
            "Fetched REST comment page"
        );

        if batch == 0 || phase.comments.len() >= max_comments {
            break;
        }

        cursor = body.next_min_id.and_then(PageCursor::new);
        if !body.has_more_comments || cursor.is_none() {
            break;
        }
    }

    phase
}

/// Decode a shortcode into the numeric media id it encodes (each character
/// is one base-64 digit of the id). Shortcodes longer than eleven
/// characters carry extra private-account material; only the leading
/// eleven encode the id.
#[must_use]
pub fn media_id_from_shortcode(shortcode: &str) -> Option<u64> {
    let mut id: u64 = 0;
    let mut len = 0;

    for ch in shortcode.chars().take(11) {
        let idx = SHORTCODE_ALPHABET.find(ch)? as u64;
        id = id.checked_mul(64)?.checked_add(idx)?;
        len += 1;
    }

    if len == 0 || id == 0 {
        None
    } else {
        Some(id)
    }
}
