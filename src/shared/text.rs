/// Upper bound for any diagnostic text persisted with a status or surfaced
/// from the tracking service.
pub const MAX_MESSAGE_CHARS: usize = 2000;

/// Truncates `text` to at most `max_chars` characters, respecting UTF-8
/// boundaries.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => text[..byte_idx].to_string(),
        None => text.to_string(),
    }
}

/// Truncates to [`MAX_MESSAGE_CHARS`].
pub fn truncate_message(text: &str) -> String {
    truncate_chars(text, MAX_MESSAGE_CHARS)
}
