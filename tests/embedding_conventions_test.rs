//! Schema-independence tests: the same logical post wrapped in each known
//! embedding convention must yield the same parse result.

use ig_comment_harvester::constants::DEFAULT_MERGE_CAP;
use ig_comment_harvester::extract::{extract_parse_result, parse_html_response};
use ig_comment_harvester::model::{Comment, ParseResult};

/// The shared logical payload: one post, two comments.
fn shortcode_media_json() -> String {
    r#"{
        "id": "3141592653",
        "shortcode": "CxYzAbC",
        "edge_media_preview_like": {"count": 42},
        "edge_media_to_parent_comment": {
            "count": 2,
            "edges": [
                {"node": {"text": "first!", "owner": {"username": "alice"}}},
                {"node": {"text": "selling? DM me", "owner": {"username": "bob"}}}
            ]
        },
        "edge_media_to_caption": {"edges": [{"node": {"text": "golden hour"}}]},
        "taken_at_timestamp": 1700000000,
        "owner": {"username": "carol"}
    }"#
    .to_string()
}

fn expected_comments() -> Vec<Comment> {
    vec![
        Comment::new("alice", "first!"),
        Comment::new("bob", "selling? DM me"),
    ]
}

fn assert_expected(result: &ParseResult, convention: &str) {
    assert_eq!(
        result.comments,
        expected_comments(),
        "comments differ under convention: {convention}"
    );
    let post = result
        .post
        .as_ref()
        .unwrap_or_else(|| panic!("no post under convention: {convention}"));
    assert_eq!(post.shortcode.as_deref(), Some("CxYzAbC"));
    assert_eq!(post.like_count, Some(42));
    assert_eq!(post.comment_count, Some(2));
    assert_eq!(post.caption.as_deref(), Some("golden hour"));
    assert_eq!(post.owner_username.as_deref(), Some("carol"));
}

#[test]
fn test_inline_global_assignment() {
    let media = shortcode_media_json();
    let html = format!(
        r#"<html><head><title>Post</title></head><body>
        <script>window._sharedData = {{"entry_data":{{"PostPage":[{{"graphql":{{"shortcode_media":{media}}}}}]}}}};</script>
        </body></html>"#
    );

    let result = parse_html_response(&html, DEFAULT_MERGE_CAP).unwrap();
    assert_expected(&result, "inline global assignment");
}

#[test]
fn test_json_script_tag() {
    let media = shortcode_media_json();
    let html = format!(
        r#"<html><head><title>Post</title></head><body>
        <script type="application/json" id="__NEXT_DATA__">{{"props":{{"pageProps":{{"graphql":{{"shortcode_media":{media}}}}}}}}}</script>
        </body></html>"#
    );

    let result = parse_html_response(&html, DEFAULT_MERGE_CAP).unwrap();
    assert_expected(&result, "application/json script tag");
}

#[test]
fn test_function_call_wrapper() {
    let media = shortcode_media_json();
    let html = format!(
        r#"<html><head><title>Post</title></head><body>
        <script>window.__additionalDataLoaded('/p/CxYzAbC/', {{"graphql":{{"shortcode_media":{media}}}}});</script>
        </body></html>"#
    );

    let result = parse_html_response(&html, DEFAULT_MERGE_CAP).unwrap();
    assert_expected(&result, "function-call wrapper");
}

#[test]
fn test_root_component_marker() {
    let media = shortcode_media_json();
    let html = format!(
        r#"<html><head><title>Post</title></head><body>
        <script>["PolarisPostRootQuery",{{"data":{{"xdt_shortcode_media":{media}}}}}]</script>
        </body></html>"#
    );

    let result = parse_html_response(&html, DEFAULT_MERGE_CAP).unwrap();
    assert_expected(&result, "root component marker");
}

#[test]
fn test_bare_xhr_json() {
    // The XHR path hands already-parsed JSON straight to the extractor.
    let media = shortcode_media_json();
    let value: serde_json::Value =
        serde_json::from_str(&format!(r#"{{"graphql":{{"shortcode_media":{media}}}}}"#)).unwrap();

    let result = extract_parse_result(&value, DEFAULT_MERGE_CAP);
    assert_expected(&result, "bare XHR JSON");
}

#[test]
fn test_conventions_agree_with_each_other() {
    let media = shortcode_media_json();
    let inline = format!(
        r#"<html><head><title>Post</title></head><body>
        <script>window._sharedData = {{"entry_data":{{"PostPage":[{{"graphql":{{"shortcode_media":{media}}}}}]}}}};</script>
        </body></html>"#
    );
    let script_tag = format!(
        r#"<html><head><title>Post</title></head><body>
        <script type="application/json">{{"graphql":{{"shortcode_media":{media}}}}}</script>
        </body></html>"#
    );

    let a = parse_html_response(&inline, DEFAULT_MERGE_CAP).unwrap();
    let b = parse_html_response(&script_tag, DEFAULT_MERGE_CAP).unwrap();
    assert_eq!(a.comments, b.comments);
    assert_eq!(a.post, b.post);
}

fn nested_comment_payload(wrappers: usize) -> serde_json::Value {
    let mut payload = r#"{"text":"needle","owner":{"username":"zed"}}"#.to_string();
    for _ in 0..wrappers {
        payload = format!(r#"{{"wrap":{payload}}}"#);
    }
    serde_json::from_str(&payload).unwrap()
}

#[test]
fn test_deeply_nested_comment_within_bound_is_found() {
    let value = nested_comment_payload(13);
    let result = extract_parse_result(&value, DEFAULT_MERGE_CAP);
    assert_eq!(result.comments, vec![Comment::new("zed", "needle")]);
}

#[test]
fn test_comment_beyond_depth_bound_is_not_found() {
    // No stack overflow, no comments.
    let value = nested_comment_payload(20);
    let result = extract_parse_result(&value, DEFAULT_MERGE_CAP);
    assert!(result.comments.is_empty());
}
