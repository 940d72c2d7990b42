//! Schema-tolerant extraction of posts and comments from arbitrary JSON.
//!
//! The platform re-nests the same logical payload under different keys from
//! one deploy to the next. Extraction therefore runs in three tiers: known
//! key paths (cheap, almost always right when the schema hasn't moved),
//! structural array-bearing keys (catches "same shape, nested differently"),
//! and a depth-bounded exhaustive recursion that tolerates total drift at
//! the cost of scanning the whole tree.

use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::constants::MAX_SEARCH_DEPTH;
use crate::model::{Comment, ParseResult, Post};

/// One step of a known key path.
#[derive(Debug, Clone, Copy)]
enum Seg {
    Key(&'static str),
    Idx(usize),
}

/// Key paths where media nodes have historically lived.
const KNOWN_MEDIA_PATHS: &[&[Seg]] = &[
    &[Seg::Key("graphql"), Seg::Key("shortcode_media")],
    &[Seg::Key("data"), Seg::Key("shortcode_media")],
    &[Seg::Key("data"), Seg::Key("xdt_shortcode_media")],
    &[Seg::Key("items"), Seg::Idx(0)],
    &[
        Seg::Key("entry_data"),
        Seg::Key("PostPage"),
        Seg::Idx(0),
        Seg::Key("graphql"),
        Seg::Key("shortcode_media"),
    ],
    &[
        Seg::Key("props"),
        Seg::Key("pageProps"),
        Seg::Key("graphql"),
        Seg::Key("shortcode_media"),
    ],
];

/// Object keys whose array values directly carry comment items.
const COMMENT_LIST_KEYS: &[&str] = &["comments", "preview_comments", "edges"];

/// Extract a `ParseResult` from an already-parsed JSON value of unknown
/// shape. `merge_cap` bounds how many comments the exhaustive recursion
/// will merge in one call.
#[must_use]
pub fn extract_parse_result(value: &Value, merge_cap: usize) -> ParseResult {
    // Known paths first: O(1) lookups, almost always correct when the
    // platform hasn't changed its schema.
    for path in KNOWN_MEDIA_PATHS {
        if let Some(node) = lookup_path(value, path) {
            let post = extract_post(node);
            let comments = search_comments(node, merge_cap);
            if post.is_some() || !comments.is_empty() {
                return ParseResult { post, comments };
            }
        }
    }

    let comments = search_comments(value, merge_cap);
    let post = find_media_node(value, 0).and_then(extract_post);
    ParseResult { post, comments }
}

/// Depth-bounded recursive comment search over a JSON tree.
///
/// Deduplicates by (username, text) as results accumulate and stops once
/// `merge_cap` comments have been merged.
#[must_use]
pub fn search_comments(value: &Value, merge_cap: usize) -> Vec<Comment> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    collect_comments(value, 0, merge_cap, &mut seen, &mut out);
    out
}

fn collect_comments(
    value: &Value,
    depth: usize,
    merge_cap: usize,
    seen: &mut HashSet<(String, String)>,
    out: &mut Vec<Comment>,
) {
    if depth > MAX_SEARCH_DEPTH || out.len() >= merge_cap {
        return;
    }

    match value {
        Value::Object(obj) => {
            // Tie-break: an object can look like a comment *and* carry an
            // edges array. Comment detection wins; a false-positive comment
            // node is self-evidently wrong (no text), a false-positive edge
            // array just costs a bounded recursion.
            if let Some(comment) = comment_from_node(obj) {
                push_unique(comment, seen, out);
                return;
            }

            let lists = candidate_lists(obj);
            if !lists.is_empty() {
                let before = out.len();
                for list in lists {
                    for item in list {
                        if out.len() >= merge_cap {
                            return;
                        }
                        let node = item.get("node").unwrap_or(item);
                        collect_comments(node, depth + 1, merge_cap, seen, out);
                    }
                }
                if out.len() > before {
                    return;
                }
            }

            // Exhaustive last resort: visit every value.
            for child in obj.values() {
                collect_comments(child, depth + 1, merge_cap, seen, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_comments(item, depth + 1, merge_cap, seen, out);
            }
        }
        _ => {}
    }
}

/// Arrays under this object that plausibly hold comment items: the known
/// list keys, plus any child object shaped like a GraphQL edge connection
/// (an object carrying a non-empty `edges` array).
fn candidate_lists(obj: &Map<String, Value>) -> Vec<&Vec<Value>> {
    let mut lists = Vec::new();

    for key in COMMENT_LIST_KEYS {
        if let Some(Value::Array(items)) = obj.get(*key) {
            if !items.is_empty() {
                lists.push(items);
            }
        }
    }

    for child in obj.values() {
        if let Some(Value::Array(items)) = child.get("edges") {
            if !items.is_empty() {
                lists.push(items);
            }
        }
    }

    lists
}

/// Check whether an object node is itself a comment: a non-empty string
/// `text` field with an owner/user sibling providing a username.
fn comment_from_node(obj: &Map<String, Value>) -> Option<Comment> {
    let text = obj.get("text")?.as_str()?;
    if text.is_empty() {
        return None;
    }

    let username = ["owner", "user"]
        .iter()
        .find_map(|key| obj.get(*key)?.get("username")?.as_str())?;
    if username.is_empty() {
        return None;
    }

    Some(Comment::new(username, text))
}

fn push_unique(comment: Comment, seen: &mut HashSet<(String, String)>, out: &mut Vec<Comment>) {
    if seen.insert((comment.username.clone(), comment.text.clone())) {
        out.push(comment);
    }
}

fn lookup_path<'a>(value: &'a Value, path: &[Seg]) -> Option<&'a Value> {
    let mut current = value;
    for seg in path {
        current = match seg {
            Seg::Key(key) => current.get(key)?,
            Seg::Idx(idx) => current.get(idx)?,
        };
    }
    Some(current)
}

/// Find the first object that looks like a media node (carries a string
/// shortcode). Used only when no known path matched.
fn find_media_node(value: &Value, depth: usize) -> Option<&Value> {
    if depth > MAX_SEARCH_DEPTH {
        return None;
    }

    match value {
        Value::Object(obj) => {
            let has_shortcode = ["shortcode", "code"]
                .iter()
                .any(|key| obj.get(*key).is_some_and(Value::is_string));
            if has_shortcode {
                return Some(value);
            }
            obj.values().find_map(|v| find_media_node(v, depth + 1))
        }
        Value::Array(items) => items.iter().find_map(|v| find_media_node(v, depth + 1)),
        _ => None,
    }
}

/// Best-effort post metadata from a media-like node, tolerating the field
/// renames observed across platform schema generations.
#[must_use]
pub fn extract_post(node: &Value) -> Option<Post> {
    let obj = node.as_object()?;

    let post = Post {
        id: string_or_number(obj, &["id", "pk"]),
        shortcode: string_field(obj, &["shortcode", "code"]),
        caption: extract_caption(obj),
        like_count: count_field(obj, &["like_count"], &["edge_media_preview_like", "edge_liked_by"]),
        comment_count: count_field(
            obj,
            &["comment_count"],
            &["edge_media_to_parent_comment", "edge_media_to_comment"],
        ),
        timestamp: obj
            .get("taken_at_timestamp")
            .or_else(|| obj.get("taken_at"))
            .and_then(Value::as_i64),
        owner_username: ["owner", "user"]
            .iter()
            .find_map(|key| Some(obj.get(*key)?.get("username")?.as_str()?.to_string())),
    };

    if post.is_empty() {
        None
    } else {
        Some(post)
    }
}

/// Caption appears as a bare string, a `{text}` object, or a caption edge
/// depending on schema generation.
fn extract_caption(obj: &Map<String, Value>) -> Option<String> {
    if let Some(caption) = obj.get("caption") {
        if let Some(text) = caption.as_str() {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
        if let Some(text) = caption.get("text").and_then(Value::as_str) {
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }

    let text = obj
        .get("edge_media_to_caption")?
        .get("edges")?
        .get(0)?
        .get("node")?
        .get("text")?
        .as_str()?;
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| Some(obj.get(*key)?.as_str()?.to_string()))
}

/// Ids arrive as strings or numbers depending on the endpoint.
fn string_or_number(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Counts arrive flat (`like_count: 12`) or wrapped in an edge connection
/// (`edge_liked_by: {count: 12}`).
fn count_field(obj: &Map<String, Value>, flat: &[&str], edges: &[&str]) -> Option<u64> {
    if let Some(count) = flat.iter().find_map(|key| obj.get(*key)?.as_u64()) {
        return Some(count);
    }
    edges
        .iter()
        .find_map(|key| obj.get(*key)?.get("count")?.as_u64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CAP: usize = 500;

    #[test]
    fn test_known_path_graphql_shortcode_media() {
        let value = json!({
            "graphql": {
                "shortcode_media": {
                    "id": "123",
                    "shortcode": "CxYz",
                    "edge_media_to_parent_comment": {
                        "count": 2,
                        "edges": [
                            {"node": {"text": "first!", "owner": {"username": "alice"}}},
                            {"node": {"text": "nice", "owner": {"username": "bob"}}}
                        ]
                    }
                }
            }
        });

        let result = extract_parse_result(&value, CAP);
        let post = result.post.expect("post should be extracted");
        assert_eq!(post.shortcode.as_deref(), Some("CxYz"));
        assert_eq!(post.comment_count, Some(2));
        assert_eq!(result.comments.len(), 2);
        assert_eq!(result.comments[0], Comment::new("alice", "first!"));
    }

    #[test]
    fn test_known_path_items_zero() {
        let value = json!({
            "items": [{
                "pk": 9000,
                "code": "AbCd",
                "like_count": 7,
                "caption": {"text": "sunset"},
                "user": {"username": "carol"},
                "taken_at": 1_700_000_000,
                "comments": [
                    {"text": "wow", "user": {"username": "dave"}}
                ]
            }]
        });

        let result = extract_parse_result(&value, CAP);
        let post = result.post.expect("post should be extracted");
        assert_eq!(post.id.as_deref(), Some("9000"));
        assert_eq!(post.shortcode.as_deref(), Some("AbCd"));
        assert_eq!(post.like_count, Some(7));
        assert_eq!(post.caption.as_deref(), Some("sunset"));
        assert_eq!(post.owner_username.as_deref(), Some("carol"));
        assert_eq!(post.timestamp, Some(1_700_000_000));
        assert_eq!(result.comments, vec![Comment::new("dave", "wow")]);
    }

    #[test]
    fn test_fallback_finds_renamed_nesting() {
        // No known path matches, but the comment list is still reachable.
        let value = json!({
            "payload": {
                "media_info": {
                    "thread": {
                        "comments": [
                            {"text": "hidden deep", "owner": {"username": "erin"}}
                        ]
                    }
                }
            }
        });

        let result = extract_parse_result(&value, CAP);
        assert_eq!(result.comments, vec![Comment::new("erin", "hidden deep")]);
        assert!(result.post.is_none());
    }

    #[test]
    fn test_comment_node_requires_username_sibling() {
        // A bare text field without an owner/user sibling is not a comment.
        let value = json!({"text": "just a label"});
        assert!(search_comments(&value, CAP).is_empty());

        let value = json!({"text": "", "owner": {"username": "alice"}});
        assert!(search_comments(&value, CAP).is_empty());
    }

    #[test]
    fn test_comment_detection_wins_over_edges() {
        // Ambiguous node: looks like a comment and carries an edge array.
        // The node itself must win; the nested reply must not be visited.
        let value = json!({
            "text": "parent comment",
            "owner": {"username": "alice"},
            "edges": [
                {"node": {"text": "reply", "owner": {"username": "bob"}}}
            ]
        });

        let comments = search_comments(&value, CAP);
        assert_eq!(comments, vec![Comment::new("alice", "parent comment")]);
    }

    #[test]
    fn test_depth_bound_enforced() {
        let mut value = json!({"text": "deep", "owner": {"username": "zed"}});
        for _ in 0..13 {
            value = json!({"wrap": value});
        }
        // 13 wrappers: node sits at depth 13, within the bound.
        assert_eq!(search_comments(&value, CAP).len(), 1);

        for _ in 0..7 {
            value = json!({"wrap": value});
        }
        // 20 wrappers: beyond the bound, nothing found, no overflow.
        assert!(search_comments(&value, CAP).is_empty());
    }

    #[test]
    fn test_merge_cap_bounds_recursion() {
        let comments: Vec<Value> = (0..50)
            .map(|i| json!({"text": format!("c{i}"), "owner": {"username": format!("u{i}")}}))
            .collect();
        let value = json!({"comments": comments});

        assert_eq!(search_comments(&value, 10).len(), 10);
        assert_eq!(search_comments(&value, CAP).len(), 50);
    }

    #[test]
    fn test_dedup_across_branches() {
        let value = json!({
            "comments": [
                {"text": "same", "owner": {"username": "alice"}}
            ],
            "preview_comments": [
                {"text": "same", "owner": {"username": "alice"}},
                {"text": "other", "owner": {"username": "alice"}}
            ]
        });

        let comments = search_comments(&value, CAP);
        assert_eq!(comments.len(), 2);
    }

    #[test]
    fn test_post_field_drift() {
        // Old-style edge-wrapped counts and caption edge.
        let node = json!({
            "id": "42",
            "shortcode": "Zz99",
            "edge_liked_by": {"count": 11},
            "edge_media_to_comment": {"count": 3},
            "edge_media_to_caption": {
                "edges": [{"node": {"text": "old caption"}}]
            },
            "taken_at_timestamp": 1_600_000_000,
            "owner": {"username": "frank"}
        });

        let post = extract_post(&node).expect("post should be extracted");
        assert_eq!(post.like_count, Some(11));
        assert_eq!(post.comment_count, Some(3));
        assert_eq!(post.caption.as_deref(), Some("old caption"));
        assert_eq!(post.timestamp, Some(1_600_000_000));
        assert_eq!(post.owner_username.as_deref(), Some("frank"));
    }

    #[test]
    fn test_extract_post_empty_node() {
        assert!(extract_post(&json!({})).is_none());
        assert!(extract_post(&json!("not an object")).is_none());
    }
}
