//! Core data types produced by the acquisition pipeline.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single recovered comment.
///
/// Comments have no reliable external id across acquisition strategies, so
/// identity is the exact (username, text) pair within one content id. An
/// empty `username` means the comment came from the dirty-text fallback and
/// should be treated as lower confidence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Comment {
    pub username: String,
    pub text: String,
}

impl Comment {
    #[must_use]
    pub fn new(username: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            text: text.into(),
        }
    }
}

/// Best-effort snapshot of post metadata.
///
/// Every field is optional: which fields are populated depends on which
/// strategy answered, and none of them are authoritative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Option<String>,
    pub shortcode: Option<String>,
    pub caption: Option<String>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub timestamp: Option<i64>,
    pub owner_username: Option<String>,
}

impl Post {
    /// Check whether any field was recovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.id.is_none()
            && self.shortcode.is_none()
            && self.caption.is_none()
            && self.like_count.is_none()
            && self.comment_count.is_none()
            && self.timestamp.is_none()
            && self.owner_username.is_none()
    }
}

/// Output of one parse of a platform response.
///
/// `post` is optional because some strategies (REST comment pagination)
/// carry no post metadata at all.
#[derive(Debug, Clone, Default)]
pub struct ParseResult {
    pub post: Option<Post>,
    pub comments: Vec<Comment>,
}

impl ParseResult {
    /// True when neither post metadata nor comments were recovered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty() && self.post.as_ref().is_none_or(Post::is_empty)
    }
}

/// Output of the fetch strategy chain for one content id.
#[derive(Debug, Clone, Default)]
pub struct FetchOutcome {
    pub comments: Vec<Comment>,
    /// The platform actively refused access (403/429/login redirect).
    /// Callers should not retry the same strategy.
    pub blocked: bool,
    /// Pagination ended normally: no cursor, or no more pages.
    pub exhausted: bool,
}

/// Opaque pagination token.
///
/// Created by a page response (GraphQL `end_cursor` or REST `next_min_id`),
/// consumed by the next request, discarded once used. Absence terminates
/// pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageCursor(String);

impl PageCursor {
    /// Wrap a non-empty token; empty tokens mean "no next page".
    #[must_use]
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Final per-content-id result exported to downstream consumers.
#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionReport {
    pub shortcode: String,
    pub post: Option<Post>,
    pub comments: Vec<Comment>,
    pub blocked: bool,
    pub exhausted: bool,
    pub fetched_at: DateTime<Utc>,
}

/// Deduplicate comments by exact (username, text) pair, preserving the
/// first occurrence. Strategies and adjacent pages routinely return the
/// same comment twice.
#[must_use]
pub fn dedup_comments(comments: Vec<Comment>) -> Vec<Comment> {
    let mut seen = HashSet::new();
    comments
        .into_iter()
        .filter(|c| seen.insert((c.username.clone(), c.text.clone())))
        .collect()
}
