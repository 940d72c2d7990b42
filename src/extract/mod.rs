//! Response parsing: recovers structured records from whatever shape of
//! JSON or HTML the platform returns.
//!
//! Orchestration order: embedded-blob location, deep search over each
//! candidate that parses, then the dirty-text fallback. The first stage
//! that yields data wins.

pub mod blob_locator;
pub mod deep_search;
pub mod dirty_text;

use thiserror::Error;
use tracing::{debug, trace};

use crate::model::ParseResult;

pub use blob_locator::locate_candidate_blobs;
pub use deep_search::{extract_parse_result, search_comments};
pub use dirty_text::extract_dirty_comments;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The page is a login/auth wall. Distinct from an empty result so the
    /// caller can mark the strategy blocked rather than merely empty.
    #[error("login wall detected in page title")]
    LoginWall,
}

/// Parse a raw HTML page into post metadata and comments.
///
/// Candidate JSON blobs are tried most-likely first; a candidate that fails
/// to parse is discarded locally and never propagated. When no candidate
/// yields data, the dirty-text fallback scans the raw markup.
///
/// # Errors
///
/// Returns [`ExtractError::LoginWall`] when the page is a login wall.
pub fn parse_html_response(html: &str, merge_cap: usize) -> Result<ParseResult, ExtractError> {
    let candidates = locate_candidate_blobs(html)?;
    let candidate_count = candidates.len();

    for (index, blob) in candidates.into_iter().enumerate() {
        let value = match serde_json::from_str(&blob) {
            Ok(value) => value,
            Err(e) => {
                trace!(index, error = %e, "Candidate blob failed to parse, discarding");
                continue;
            }
        };

        let result = extract_parse_result(&value, merge_cap);
        if !result.is_empty() {
            debug!(
                index,
                candidates = candidate_count,
                comments = result.comments.len(),
                "Extracted records from embedded blob"
            );
            return Ok(result);
        }
    }

    let comments = extract_dirty_comments(html);
    if !comments.is_empty() {
        debug!(
            comments = comments.len(),
            "No structured blob yielded data, using dirty-text fallback"
        );
    }
    Ok(ParseResult {
        post: None,
        comments,
    })
}
