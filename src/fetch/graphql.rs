//! GraphQL phase of the fetch strategy chain.
//!
//! The platform's comment query is addressed by a numeric document id that
//! gets deprecated silently over time. Each doc id is tried in turn; a
//! block on one doc id does not imply a block on the platform overall,
//! since doc ids are deprecated independently, so a 403/429/login-redirect
//! advances to the next doc id rather than aborting the phase.

use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::constants::{GRAPHQL_COMMENT_DOC_IDS, GRAPHQL_MAX_PAGES, GRAPHQL_PAGE_SIZE};
use crate::extract::search_comments;
use crate::fetch::{pause_between_requests, response_is_blocking};
use crate::model::{Comment, PageCursor};

/// Result of the whole GraphQL phase.
#[derive(Debug, Default)]
pub(super) struct GraphqlPhase {
    pub comments: Vec<Comment>,
    /// At least one doc id hit a blocking signal.
    pub saw_block: bool,
}

/// Outcome of paginating a single document id.
enum DocIdOutcome {
    Yielded(Vec<Comment>),
    Blocked,
    Empty,
}

/// Try each known document id in order; the first one yielding any
/// comments wins and later doc ids are never attempted.
pub(super) async fn fetch_comments(
    client: &Client,
    config: &Config,
    shortcode: &str,
    max_comments: usize,
) -> GraphqlPhase {
    let mut phase = GraphqlPhase::default();

    for (attempt, doc_id) in GRAPHQL_COMMENT_DOC_IDS.iter().enumerate() {
        if attempt > 0 {
            pause_between_requests(config).await;
        }

        match try_doc_id(client, config, shortcode, doc_id, max_comments).await {
            DocIdOutcome::Yielded(comments) => {
                info!(
                    shortcode,
                    doc_id = %doc_id,
                    comments = comments.len(),
                    "GraphQL doc id yielded comments"
                );
                phase.comments = comments;
                return phase;
            }
            DocIdOutcome::Blocked => {
                debug!(shortcode, doc_id = %doc_id, "GraphQL doc id blocked, trying next");
                phase.saw_block = true;
            }
            DocIdOutcome::Empty => {
                debug!(shortcode, doc_id = %doc_id, "GraphQL doc id yielded nothing, trying next");
            }
        }
    }

    phase
}

/// Paginate one document id until the cursor runs out, `max_comments` is
/// reached, or the page ceiling is hit.
async fn try_doc_id(
    client: &Client,
    config: &Config,
    shortcode: &str,
    doc_id: &str,
    max_comments: usize,
) -> DocIdOutcome {
    let mut comments: Vec<Comment> = Vec::new();
    let mut cursor: Option<PageCursor> = None;

    for page in 0..GRAPHQL_MAX_PAGES {
        if page > 0 {
            pause_between_requests(config).await;
        }

        let response = match send_page(client, config, shortcode, doc_id, cursor.as_ref()).await {
            Ok(response) => response,
            Err(e) => {
                // Transient network failure: abort this attempt, no
                // internal retry (retry-with-backoff is the harness's job).
                warn!(shortcode, doc_id, page, error = %e, "GraphQL request failed");
                break;
            }
        };

        if response_is_blocking(&response) {
            if comments.is_empty() {
                return DocIdOutcome::Blocked;
            }
            // Partial result before the block: keep what we have.
            warn!(shortcode, doc_id, page, "Blocked mid-pagination, keeping partial result");
            break;
        }

        if !response.status().is_success() {
            warn!(shortcode, doc_id, page, status = %response.status(), "Unexpected GraphQL status");
            break;
        }

        let value: Value = match response.json().await {
            Ok(value) => value,
            Err(e) => {
                warn!(shortcode, doc_id, page, error = %e, "GraphQL response was not JSON");
                break;
            }
        };

        let page_comments = search_comments(&value, config.deep_merge_cap);
        if page == 0 && page_comments.is_empty() {
            // A permanently-empty schema wastes no further pages.
            return DocIdOutcome::Empty;
        }

        debug!(
            shortcode,
            doc_id,
            page,
            batch = page_comments.len(),
            total = comments.len() + page_comments.len(),
            "Fetched GraphQL comment page"
        );
        comments.extend(page_comments);

        if comments.len() >= max_comments {
            debug!(shortcode, doc_id, "Reached comment limit");
            break;
        }

        let (has_next, next_cursor) = find_page_info(&value, 0).unwrap_or((false, None));
        if !has_next {
            break;
        }
        cursor = next_cursor;
        if cursor.is_none() {
            break;
        }
    }

    if comments.is_empty() {
        DocIdOutcome::Empty
    } else {
        DocIdOutcome::Yielded(comments)
    }
}

async fn send_page(
    client: &Client,
    config: &Config,
    shortcode: &str,
    doc_id: &str,
    cursor: Option<&PageCursor>,
) -> reqwest::Result<reqwest::Response> {
    let mut variables = json!({
        "shortcode": shortcode,
        "first": GRAPHQL_PAGE_SIZE,
    });
    if let Some(cursor) = cursor {
        variables["after"] = json!(cursor.as_str());
    }
    let variables = variables.to_string();

    client
        .post(&config.graphql_url)
        .form(&[("doc_id", doc_id), ("variables", variables.as_str())])
        .send()
        .await
}

/// Locate pagination state anywhere in the payload. The `page_info` object
/// moves around with the schema, and field names flip between snake and
/// camel case.
fn find_page_info(value: &Value, depth: usize) -> Option<(bool, Option<PageCursor>)> {
    if depth > 10 {
        return None;
    }

    match value {
        Value::Object(obj) => {
            if obj.contains_key("has_next_page") || obj.contains_key("hasNextPage") {
                let has_next = obj
                    .get("has_next_page")
                    .or_else(|| obj.get("hasNextPage"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                let cursor = obj
                    .get("end_cursor")
                    .or_else(|| obj.get("endCursor"))
                    .and_then(Value::as_str)
                    .and_then(PageCursor::new);
                return Some((has_next, cursor));
            }
            obj.values().find_map(|v| find_page_info(v, depth + 1))
        }
        Value::Array(items) => items.iter().find_map(|v| find_page_info(v, depth + 1)),
        _ => None,
    }
}
