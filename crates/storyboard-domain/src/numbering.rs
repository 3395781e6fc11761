//! Numbering grammar for model output
//!
//! A numbered line starts with one or more ASCII digits followed by one of
//! `.`, `、`, `．` or whitespace. The same separator set defines the prefix
//! that is stripped when only the content of a line matters.
//!
//! ```text
//! 1. 他走进屋子。      -> numbered, prefix "1. "
//! 2、她回头。          -> numbered, prefix "2、"
//! 3．雨停了。          -> numbered, prefix "3．"
//! 4 镜头拉远。         -> numbered, prefix "4 "
//! 第5镜                -> not numbered
//! ```

use std::sync::LazyLock;

use regex::Regex;

static NUMBERED_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]+)[.、．\s]").expect("numbered line pattern is valid"));

static NUMBER_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]+[.、．\s]+").expect("number prefix pattern is valid"));

/// Return the numeral of a numbered line, if the line is one.
///
/// The line is expected to be trimmed already. `Some(None)` means the line is
/// numbered but its numeral does not fit in a `usize`.
pub fn leading_number(line: &str) -> Option<Option<usize>> {
    NUMBERED_LINE
        .captures(line)
        .map(|caps| caps.get(1).and_then(|m| m.as_str().parse().ok()))
}

/// Check whether a (trimmed) line is a numbered line.
pub fn is_numbered(line: &str) -> bool {
    NUMBERED_LINE.is_match(line)
}

/// Strip the numeral and its separators from the start of a line.
///
/// Lines without a prefix are returned unchanged.
pub fn strip_number_prefix(line: &str) -> &str {
    match NUMBER_PREFIX.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    }
}
