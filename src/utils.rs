//! Small text helpers shared across the crate.

/// Truncate a string to at most `max_chars` characters without splitting a
/// multi-byte character. Questions and abstracts routinely carry non-ASCII
/// text (Greek gene aliases, author names), so byte slicing is not safe here.
#[inline]
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

/// Like [`safe_truncate`] but appends `...` when the input was shortened.
/// Used for log lines only.
#[inline]
pub fn safe_truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}
