//! The fetch strategy chain: GraphQL doc ids, then REST pagination.

use reqwest::Client;
use tracing::{debug, info};

use crate::config::Config;
use crate::fetch::{graphql, pause_between_requests, rest};
use crate::model::{dedup_comments, Comment, FetchOutcome};

/// Acquire comments for one content id by trying each strategy in order.
///
/// The chain stops at the first strategy that yields comments; otherwise
/// it reports `exhausted: true` with an empty comment list. Blocking and
/// platform-shape drift never surface as errors, only as outcome flags.
pub async fn acquire_via_chain(
    client: &Client,
    config: &Config,
    shortcode: &str,
    max_comments: usize,
) -> FetchOutcome {
    debug!(shortcode, max_comments, "Starting strategy chain");

    let graphql_phase = graphql::fetch_comments(client, config, shortcode, max_comments).await;
    if !graphql_phase.comments.is_empty() {
        return successful(graphql_phase.comments, max_comments, shortcode, "graphql");
    }

    pause_between_requests(config).await;

    let rest_phase = rest::fetch_comments(client, config, shortcode, max_comments).await;
    if !rest_phase.comments.is_empty() {
        return successful(rest_phase.comments, max_comments, shortcode, "rest");
    }

    let blocked = graphql_phase.saw_block || rest_phase.blocked;
    info!(shortcode, blocked, "All strategies exhausted without comments");
    FetchOutcome {
        comments: Vec::new(),
        blocked,
        exhausted: true,
    }
}

fn successful(
    comments: Vec<Comment>,
    max_comments: usize,
    shortcode: &str,
    strategy: &str,
) -> FetchOutcome {
    let mut comments = dedup_comments(comments);
    comments.truncate(max_comments);
    info!(
        shortcode,
        strategy,
        comments = comments.len(),
        "Strategy chain succeeded"
    );
    FetchOutcome {
        comments,
        blocked: false,
        exhausted: false,
    }
}
