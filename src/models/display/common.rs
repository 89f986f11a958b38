//! Common display utilities and helpers

/// Truncate string to max length (in characters) with ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// First line of a possibly multi-line message
pub fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or_default()
}
