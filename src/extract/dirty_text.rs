//! Last-resort comment recovery from raw HTML.
//!
//! When no structured blob parses at all, scanning for literal
//! `"text":"…"` fields still recovers comment bodies, minus usernames.
//! Callers must treat the resulting empty-username comments as lower
//! confidence.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::constants::MAX_DIRTY_TEXT_LEN;
use crate::model::Comment;

static TEXT_FIELD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""text"\s*:\s*"((?:\\.|[^"\\])*)""#).expect("valid text-field regex")
});

/// UI boilerplate strings the platform also serializes as `"text"` fields.
/// Compared case-insensitively against the whole decoded candidate.
static BOILERPLATE_PHRASES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "log in",
        "login",
        "sign up",
        "instagram",
        "create account",
        "open in app",
        "see more",
        "learn more",
        "not now",
        "continue",
        "follow",
        "share",
        "save",
        "report",
    ]
    .into_iter()
    .collect()
});

/// Scan raw HTML for bare `"text":"…"` fields and return the plausible
/// comment bodies, deduplicated by decoded text. Usernames are unknown on
/// this path and returned empty.
#[must_use]
pub fn extract_dirty_comments(html: &str) -> Vec<Comment> {
    let mut seen = HashSet::new();
    let mut comments = Vec::new();

    for cap in TEXT_FIELD_RE.captures_iter(html) {
        let Some(raw) = cap.get(1) else { continue };
        let decoded = unescape_json_string(raw.as_str());
        let decoded = decoded.trim();

        if decoded.is_empty() || decoded.len() > MAX_DIRTY_TEXT_LEN {
            continue;
        }
        if BOILERPLATE_PHRASES.contains(decoded.to_lowercase().as_str()) {
            continue;
        }
        if seen.insert(decoded.to_string()) {
            comments.push(Comment::new("", decoded));
        }
    }

    comments
}

/// Decode the platform's JSON string escapes: `\uXXXX` (surrogate pairs
/// included), `\"`, `\\`, `\/`, `\n`, `\t`, `\r`.
fn unescape_json_string(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '\\' {
            out.push(chars[i]);
            i += 1;
            continue;
        }

        let Some(&escape) = chars.get(i + 1) else {
            break;
        };
        match escape {
            'n' => out.push('\n'),
            't' => out.push('\t'),
            'r' => out.push('\r'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'u' => {
                if let Some(high) = parse_hex4(&chars, i + 2) {
                    let mut consumed = 6;
                    let code = if (0xD800..=0xDBFF).contains(&high)
                        && chars.get(i + 6) == Some(&'\\')
                        && chars.get(i + 7) == Some(&'u')
                    {
                        // Combine a surrogate pair into one scalar value.
                        parse_hex4(&chars, i + 8)
                            .filter(|low| (0xDC00..=0xDFFF).contains(low))
                            .map_or(high, |low| {
                                consumed = 12;
                                0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                            })
                    } else {
                        high
                    };
                    out.push(char::from_u32(code).unwrap_or('\u{fffd}'));
                    i += consumed;
                    continue;
                }
                // Malformed \u escape: keep it verbatim.
                out.push('\\');
                out.push('u');
            }
            other => out.push(other),
        }
        i += 2;
    }

    out
}

fn parse_hex4(chars: &[char], at: usize) -> Option<u32> {
    let digits: String = chars.get(at..at + 4)?.iter().collect();
    u32::from_str_radix(&digits, 16).ok()
}
