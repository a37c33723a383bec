//! Normalization of raw command output.
//!
//! Remote output may use CR-LF line endings, carry trailing whitespace and
//! contain warning noise. Rules compare normalized lines, never raw text.

use std::collections::BTreeSet;

/// Lines of `raw`, trimmed, with empty lines dropped. Handles both LF and
/// CR-LF line endings.
pub fn normalized_lines(raw: &str) -> impl Iterator<Item = &str> {
    raw.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Set of normalized lines of `raw`.
pub fn line_set(raw: &str) -> BTreeSet<String> {
    normalized_lines(raw).map(str::to_string).collect()
}

/// Last whitespace-separated token of `raw`, if any.
pub fn last_token(raw: &str) -> Option<&str> {
    raw.split_whitespace().last()
}

/// First normalized line of `raw`, if any.
pub fn first_line(raw: &str) -> Option<&str> {
    normalized_lines(raw).next()
}
