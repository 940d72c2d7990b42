//! Shared constants used across the acquisition pipeline.

/// User agent string used for all platform requests.
///
/// This is a realistic browser user agent; the platform serves noticeably
/// thinner (or no) data to clients that identify as anything else.
pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// App id the platform's own web client sends on every API request.
pub const WEB_APP_ID: &str = "936619743392459";

/// GraphQL query endpoint.
pub const GRAPHQL_URL: &str = "https://www.instagram.com/graphql/query";

/// Base URL for the REST media API (`{base}/{media_id}/comments/`).
pub const REST_MEDIA_BASE_URL: &str = "https://www.instagram.com/api/v1/media";

/// Base URL for plain post pages (`{base}/{shortcode}/`).
pub const POST_PAGE_BASE_URL: &str = "https://www.instagram.com/p";

/// GraphQL document ids for the parent-comments query, in the order they
/// are attempted. The platform deprecates these silently over time;
/// trying several raises the odds that one still answers.
pub const GRAPHQL_COMMENT_DOC_IDS: &[&str] = &[
    "8845758582119845",
    "7190249924394573",
    "17852405266163336",
];

/// Comments requested per GraphQL page (the platform's effective maximum).
pub const GRAPHQL_PAGE_SIZE: u32 = 50;

/// Ceiling on GraphQL pages fetched per document id.
pub const GRAPHQL_MAX_PAGES: usize = 40;

/// Ceiling on REST pages fetched per content id.
pub const REST_MAX_PAGES: usize = 20;

/// Substring of the login path the platform redirects blocked clients to.
pub const LOGIN_PATH: &str = "/accounts/login";

/// Maximum recursion depth for the schema-agnostic deep search.
pub const MAX_SEARCH_DEPTH: usize = 14;

/// Default per-call ceiling on comments merged by the deep search.
pub const DEFAULT_MERGE_CAP: usize = 500;

/// Maximum length of a candidate embedded-JSON substring (512 KiB).
///
/// Bounds balanced-brace scanning so a pathological page cannot make the
/// locator walk megabytes of markup per candidate.
pub const MAX_BLOB_LEN: usize = 512 * 1024;

/// Maximum decoded length of a dirty-fallback comment. Real comments are
/// short; longer `"text"` matches are almost always non-comment JSON.
pub const MAX_DIRTY_TEXT_LEN: usize = 400;

/// Alphabet the platform uses to encode media ids as shortcodes.
pub const SHORTCODE_ALPHABET: &str =
    "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";
