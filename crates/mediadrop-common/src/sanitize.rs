//! Filesystem-safe names for media titles

use regex::Regex;
use std::sync::LazyLock;

/// Maximum length of a sanitized name, in characters
pub const MAX_FILENAME_CHARS: usize = 200;

/// Name used when a title sanitizes down to nothing
pub const FALLBACK_FILENAME: &str = "video";

const PLACEHOLDER: char = '_';

#[allow(clippy::unwrap_used)]
static WHITESPACE_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

#[allow(clippy::unwrap_used)]
static PLACEHOLDER_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_{2,}").unwrap());

fn is_illegal(c: char) -> bool {
    matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || c.is_control()
}

/// Sanitize a display title into a file name (without extension)
///
/// Characters illegal on common filesystems become `_`, whitespace runs
/// collapse to one space, `_` runs collapse to one `_`, and the result is
/// trimmed and capped at [`MAX_FILENAME_CHARS`].
pub fn sanitize_filename(title: &str) -> String {
    // Tabs and newlines are whitespace first, control characters second
    let replaced: String = title
        .chars()
        .map(|c| {
            if c.is_whitespace() {
                ' '
            } else if is_illegal(c) {
                PLACEHOLDER
            } else {
                c
            }
        })
        .collect();

    let collapsed = WHITESPACE_RUN.replace_all(&replaced, " ");
    let collapsed = PLACEHOLDER_RUN.replace_all(&collapsed, "_");

    let capped: String = trim_edges(&collapsed).chars().take(MAX_FILENAME_CHARS).collect();
    let name = trim_edges(&capped);

    if name.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        name.to_string()
    }
}

fn trim_edges(s: &str) -> &str {
    s.trim_matches(|c: char| c == ' ' || c == '.' || c == PLACEHOLDER)
}
