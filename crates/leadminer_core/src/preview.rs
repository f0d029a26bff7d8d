const TRUNCATED_MARKER: &str = "\n.[truncated]";
pub const MAX_PREVIEW_CHARS: usize = 280;

/// Shorten `text` for the progress stream, cutting on a char boundary.
pub fn prepare_preview(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.len() <= MAX_PREVIEW_CHARS {
        trimmed.to_string()
    } else {
        let mut end = MAX_PREVIEW_CHARS;
        while end > 0 && !trimmed.is_char_boundary(end) {
            end -= 1;
        }
        let truncated = &trimmed[..end];
        format!("{truncated}{TRUNCATED_MARKER}")
    }
}

#[cfg(test)]
mod tests {
    use super::{prepare_preview, MAX_PREVIEW_CHARS, TRUNCATED_MARKER};

    #[test]
    fn short_content_kept_as_is() {
        assert_eq!(prepare_preview("  www.acme.com\n"), "www.acme.com");
    }

    #[test]
    fn truncated_content_appends_marker() {
        let content: String = "a".repeat(MAX_PREVIEW_CHARS + 128);
        let preview = prepare_preview(&content);
        assert!(preview.ends_with(TRUNCATED_MARKER));
        assert_eq!(preview.len(), MAX_PREVIEW_CHARS + TRUNCATED_MARKER.len());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let content: String = "é".repeat(MAX_PREVIEW_CHARS);
        let preview = prepare_preview(&content);
        assert!(preview.ends_with(TRUNCATED_MARKER));
        assert!(preview.len() <= MAX_PREVIEW_CHARS + TRUNCATED_MARKER.len());
    }
}
