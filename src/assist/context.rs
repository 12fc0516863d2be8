//! Cursor context extraction
//!
//! Derives the bounded text window around the cursor that feeds prompts and
//! cache keys. All offsets are character offsets so multi-byte text never
//! splits inside a code point.

/// Cursor location derived from the editor selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub struct CursorPosition {
    /// 0-based line index
    pub line: usize,
    /// 0-based column, in characters from the start of the line
    pub column: usize,
    /// Absolute character offset into the document
    pub offset: usize,
}

impl CursorPosition {
    /// Compute line and column for an absolute character offset
    ///
    /// Offsets past the end of the document are clamped to the end.
    pub fn from_offset(text: &str, offset: usize) -> Self {
        let mut line = 0;
        let mut column = 0;
        let mut consumed = 0;

        for ch in text.chars().take(offset) {
            consumed += 1;
            if ch == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }
        }

        Self {
            line,
            column,
            offset: consumed,
        }
    }
}

/// Stable document metadata supplied by the host editor
///
/// Part of the cache key and the prompt, so a suggestion computed for one
/// article is never served for another with the same trailing text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, serde::Serialize)]
pub struct DocumentMeta {
    pub title: Option<String>,
    pub category: Option<String>,
}

impl DocumentMeta {
    pub fn new(title: Option<String>, category: Option<String>) -> Self {
        Self { title, category }
    }
}

/// Text flanking the cursor
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ContextWindow {
    /// Up to `window_chars` characters ending at the cursor
    pub before: String,
    /// Up to `window_chars` characters starting at the cursor
    pub after: String,
}

impl ContextWindow {
    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

/// Extract the context window around `cursor_offset`
///
/// The cursor is clamped to the document, so an out-of-range offset yields the
/// tail of the document as `before` and an empty `after`.
pub fn extract_context(text: &str, cursor_offset: usize, window_chars: usize) -> ContextWindow {
    let total = text.chars().count();
    let cursor = cursor_offset.min(total);
    let start = cursor.saturating_sub(window_chars);
    let end = cursor.saturating_add(window_chars).min(total);

    let cursor_byte = byte_index(text, cursor);
    let start_byte = byte_index(text, start);
    let end_byte = byte_index(text, end);

    ContextWindow {
        before: text[start_byte..cursor_byte].to_string(),
        after: text[cursor_byte..end_byte].to_string(),
    }
}

/// Everything before the `cursor_offset`-th character, clamped to the document
pub fn text_before(text: &str, cursor_offset: usize) -> &str {
    &text[..byte_index(text, cursor_offset)]
}

/// Last `count` characters of `text`
pub fn trailing_chars(text: &str, count: usize) -> &str {
    let total = text.chars().count();
    &text[byte_index(text, total.saturating_sub(count))..]
}

/// Byte index of the `char_offset`-th character, or `text.len()` past the end
fn byte_index(text: &str, char_offset: usize) -> usize {
    text.char_indices()
        .nth(char_offset)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod context_tests;
