//! Locates candidate JSON substrings embedded in raw post-page HTML.
//!
//! The platform has shipped at least four embedding conventions for the
//! same payload: inline global assignments, `application/json` script tags,
//! function-call wrappers, and a root-component preloader blob. The locator
//! is a permissive lexical pre-filter: it returns candidates most-likely
//! first and the caller re-validates every one with a real JSON parser.

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};

use crate::constants::MAX_BLOB_LEN;
use crate::extract::ExtractError;

/// Global variables the platform has assigned its bootstrap payload to.
const GLOBAL_VARS: &[&str] = &[
    "window._sharedData",
    "window.__initialData",
    "window.__additionalData",
];

/// Function-call wrappers known to carry payloads as their last argument.
const CALL_WRAPPERS: &[&str] = &["__additionalDataLoaded", "requireLazy"];

/// Markers for the root-component preloader convention.
const ROOT_MARKERS: &[&str] = &["PolarisPostRootQuery", "PolarisPostRoot"];

/// Ceiling on candidates returned per page.
const MAX_CANDIDATES: usize = 16;

/// Generic `identifier(` or `identifier("key", ` prefix ahead of a JSON
/// literal. Permissive on purpose; candidates are re-validated by parsing.
static CALL_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[A-Za-z_$][A-Za-z0-9_$]*\s*\(\s*(?:(?:"[^"]*"|'[^']*')\s*,\s*)?([\[{])"#)
        .expect("valid call-prefix regex")
});

static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("valid title selector"));

static JSON_SCRIPT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse(r#"script[type="application/json"]"#).expect("valid json script selector")
});

/// Scan raw HTML for candidate JSON substrings, most-likely-correct first.
///
/// Pure function of the HTML string; produces zero or more candidates the
/// caller tries in order until one parses and yields data.
///
/// # Errors
///
/// Returns [`ExtractError::LoginWall`] when the page title indicates a
/// login/auth wall, so callers can mark the strategy blocked instead of
/// merely empty.
pub fn locate_candidate_blobs(html: &str) -> Result<Vec<String>, ExtractError> {
    let document = Html::parse_document(html);

    if let Some(title) = document.select(&TITLE_SELECTOR).next() {
        let title: String = title.text().collect();
        if is_login_wall_title(&title) {
            return Err(ExtractError::LoginWall);
        }
    }

    let mut candidates = Vec::new();

    // (a) inline global assignments
    for var in GLOBAL_VARS {
        collect_global_assignments(html, var, &mut candidates);
    }

    // (b) application/json script tags, fixed-id block first
    let mut json_scripts: Vec<(bool, String)> = document
        .select(&JSON_SCRIPT_SELECTOR)
        .filter_map(|el| {
            let body: String = el.text().collect();
            let body = body.trim();
            if body.is_empty() || body.len() > MAX_BLOB_LEN {
                return None;
            }
            let named = el.value().attr("id") == Some("__NEXT_DATA__")
                || el.value().attr("data-sjs").is_some();
            Some((named, body.to_string()))
        })
        .collect();
    json_scripts.sort_by_key(|(named, _)| !named);
    candidates.extend(json_scripts.into_iter().map(|(_, body)| body));

    // (c) function-call wrappers
    collect_call_payloads(html, &mut candidates);

    // (d) root-component preloader marker followed by a large object literal
    for marker in ROOT_MARKERS {
        collect_after_marker(html, marker, &mut candidates);
    }

    candidates.dedup();
    candidates.truncate(MAX_CANDIDATES);
    Ok(candidates)
}

/// Check whether a page title looks like the platform's login/auth wall.
#[must_use]
pub fn is_login_wall_title(title: &str) -> bool {
    let lower = title.trim().to_lowercase();
    lower.contains("login") || lower.contains("log in") || lower.contains("sign up")
}

/// `window._sharedData = {...};` style assignments.
fn collect_global_assignments(html: &str, var: &str, out: &mut Vec<String>) {
    let mut search_from = 0;
    while let Some(rel) = html[search_from..].find(var) {
        let at = search_from + rel;
        let after = &html[at + var.len()..];
        search_from = at + var.len();

        let Some(eq) = after.find('=') else { continue };
        // Only direct assignments; a '.' or '(' between name and '=' means
        // this was a member access, not the bootstrap assignment.
        if !after[..eq].trim().is_empty() {
            continue;
        }
        let rest = after[eq + 1..].trim_start();
        if !rest.starts_with('{') {
            continue;
        }
        let offset = after.len() - rest.len();
        if let Some(end) = find_balanced(after, offset, MAX_BLOB_LEN) {
            out.push(after[offset..=end].to_string());
        }
    }
}

/// `identifier([...])` / `identifier("key", {...})` wrappers. Known wrapper
/// names are scanned first, then the generic pattern.
fn collect_call_payloads(html: &str, out: &mut Vec<String>) {
    for wrapper in CALL_WRAPPERS {
        let mut search_from = 0;
        while let Some(rel) = html[search_from..].find(wrapper) {
            let at = search_from + rel;
            search_from = at + wrapper.len();
            if let Some(m) = CALL_PREFIX_RE.find_at(html, at) {
                if m.start() != at {
                    continue;
                }
                if let Some(cap) = CALL_PREFIX_RE.captures(&html[at..m.end()]) {
                    let open = at + cap.get(1).map_or(0, |g| g.start());
                    if let Some(end) = find_balanced(html, open, MAX_BLOB_LEN) {
                        out.push(html[open..=end].to_string());
                    }
                }
            }
        }
    }

    for cap in CALL_PREFIX_RE.captures_iter(html).take(32) {
        let Some(open) = cap.get(1) else { continue };
        if let Some(end) = find_balanced(html, open.start(), MAX_BLOB_LEN) {
            let blob = &html[open.start()..=end];
            // Generic calls are noisy; only object payloads of meaningful
            // size are worth a parse attempt.
            if blob.len() > 64 {
                out.push(blob.to_string());
            }
        }
    }
}

/// Marker identifier followed by the next object literal.
fn collect_after_marker(html: &str, marker: &str, out: &mut Vec<String>) {
    let Some(at) = html.find(marker) else { return };
    let after = &html[at + marker.len()..];
    let Some(rel) = after.find('{') else { return };
    if let Some(end) = find_balanced(after, rel, MAX_BLOB_LEN) {
        out.push(after[rel..=end].to_string());
    }
}

/// Byte index of the bracket closing the one at `open`, or `None` if the
/// input is unbalanced or the span exceeds `max_len`.
///
/// String-literal aware: delimiters inside JSON strings (and escaped
/// quotes) are ignored. Operates on bytes; all delimiters are ASCII so the
/// returned index is always a char boundary.
fn find_balanced(s: &str, open: usize, max_len: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let open_byte = *bytes.get(open)?;
    let close_byte = match open_byte {
        b'{' => b'}',
        b'[' => b']',
        _ => return None,
    };

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if i - open >= max_len {
            return None;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            _ if b == open_byte => depth += 1,
            _ if b == close_byte => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_assignment_candidate() {
        let html = r#"<html><head><title>Post</title></head><body>
            <script>window._sharedData = {"entry_data":{"key":"value"}};</script>
        </body></html>"#;

        let candidates = locate_candidate_blobs(html).unwrap();
        assert!(candidates.contains(&r#"{"entry_data":{"key":"value"}}"#.to_string()));
    }

    #[test]
    fn test_json_script_tag_candidate() {
        let html = r#"<html><body>
            <script type="application/json" data-sjs>{"require":[1,2]}</script>
            <script type="text/javascript">var x = 1;</script>
        </body></html>"#;

        let candidates = locate_candidate_blobs(html).unwrap();
        assert_eq!(candidates, vec![r#"{"require":[1,2]}"#.to_string()]);
    }

    #[test]
    fn test_next_data_script_ordered_first() {
        let html = r#"<html><body>
            <script type="application/json">{"other":1}</script>
            <script type="application/json" id="__NEXT_DATA__">{"props":{"a":1}}</script>
        </body></html>"#;

        let candidates = locate_candidate_blobs(html).unwrap();
        assert_eq!(candidates[0], r#"{"props":{"a":1}}"#);
    }

    #[test]
    fn test_call_wrapper_candidate() {
        let html = r#"<script>window.__additionalDataLoaded('feed', {"comments":[{"x":1}]});</script>"#;

        let candidates = locate_candidate_blobs(html).unwrap();
        assert!(candidates.contains(&r#"{"comments":[{"x":1}]}"#.to_string()));
    }

    #[test]
    fn test_root_marker_candidate() {
        let html = r#"<script>["PolarisPostRootQuery",{"data":{"result":1}}]</script>"#;

        let candidates = locate_candidate_blobs(html).unwrap();
        assert!(candidates.iter().any(|c| c.contains(r#""result":1"#)));
    }

    #[test]
    fn test_login_wall_raises_distinct_signal() {
        let html = "<html><head><title>Login \u{2022} Instagram</title></head><body></body></html>";
        assert!(matches!(
            locate_candidate_blobs(html),
            Err(ExtractError::LoginWall)
        ));
    }

    #[test]
    fn test_plain_page_yields_no_candidates() {
        let html = "<html><head><title>A post</title></head><body><p>hello</p></body></html>";
        assert!(locate_candidate_blobs(html).unwrap().is_empty());
    }

    #[test]
    fn test_find_balanced_ignores_braces_in_strings() {
        let s = r#"{"a":"}}","b":{"c":1}}"#;
        assert_eq!(find_balanced(s, 0, 1024), Some(s.len() - 1));
    }

    #[test]
    fn test_find_balanced_respects_length_bound() {
        let s = format!("{{\"a\":\"{}\"}}", "x".repeat(100));
        assert!(find_balanced(&s, 0, 50).is_none());
        assert_eq!(find_balanced(&s, 0, 1024), Some(s.len() - 1));
    }

    #[test]
    fn test_find_balanced_unterminated() {
        assert!(find_balanced(r#"{"a": {"b": 1}"#, 0, 1024).is_none());
    }

    #[test]
    fn test_member_access_not_mistaken_for_assignment() {
        // `window._sharedData.foo = {...}` assigns a member, not the global.
        let html = r#"<script>window._sharedData.foo = {"x":1};</script>"#;
        let mut out = Vec::new();
        collect_global_assignments(html, "window._sharedData", &mut out);
        assert!(out.is_empty());
    }
}
