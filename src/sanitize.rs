//! Response body sanitization

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

// Non-greedy: stops at the first semicolon. `.` does not cross line breaks.
#[allow(clippy::expect_used)]
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"&.*?;").expect("entity pattern is valid"));

/// Delete every `&...;` character-entity reference from `text`.
///
/// Entities are removed, not decoded: `a &amp; b` becomes `a  b`. A lone `&`
/// with no later `;` on the same line is left alone. Stripping is idempotent.
pub fn strip_entities(text: &str) -> Cow<'_, str> {
    ENTITY.replace_all(text, "")
}

/// Returns true when the stripped body is the "no results" sentinel.
///
/// The comparison trims surrounding whitespace and ignores case. With
/// `empty_is_sentinel`, a whitespace-only body counts as well.
pub fn is_no_results(stripped: &str, empty_is_sentinel: bool) -> bool {
    let trimmed = stripped.trim();
    trimmed.eq_ignore_ascii_case("no results") || (empty_is_sentinel && trimmed.is_empty())
}
