//! Markup stripping for fetched HTML.
//!
//! [`strip_markup`] is a pattern-based extractor, not an HTML parser. Its
//! contract:
//!
//! 1. Every `<script …>…</script>` and `<style …>…</style>` byte range is
//!    removed. Matching is case-insensitive and non-greedy: the range ends at
//!    the first closing tag, so nested or string-embedded `</script>` ends it
//!    early. An unterminated `<script>` is not removed as a block; only its
//!    opening tag is dropped in step 2.
//! 2. Every remaining `<…>` tag (comments and doctype included) is replaced
//!    with a single space.
//! 3. Entities (`&amp;`, `&nbsp;`, …) are left as-is.
//! 4. Runs of whitespace collapse to one space; the result is trimmed.

use regex::Regex;
use std::sync::LazyLock;

static RE_SCRIPT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<script\b.*?</script>").unwrap());
static RE_STYLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<style\b.*?</style>").unwrap());
static RE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());
static RE_WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Extract visible text from an HTML document.
pub fn strip_markup(html: &str) -> String {
    let text = RE_SCRIPT.replace_all(html, "");
    let text = RE_STYLE.replace_all(&text, "");
    let text = RE_TAG.replace_all(&text, " ");
    collapse_whitespace(&text)
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    RE_WHITESPACE.replace_all(text, " ").trim().to_string()
}
