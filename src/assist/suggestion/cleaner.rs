//! Cleaning of generated text before insertion
//!
//! Providers sometimes wrap continuations in HTML, code fences, or quotes.
//! Accepted text is inserted verbatim, so all of that is removed here:
//! ```text
//! "<b>Hola</b> mundo"   ->  Hola mundo
//! "“Next sentence.”"    ->  Next sentence.
//! ```

/// Tags that separate words when removed
const BLOCK_TAGS: &[&str] = &[
    "br", "p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "tr",
    "td",
];

const QUOTE_PAIRS: &[(char, char)] = &[
    ('"', '"'),
    ('\'', '\''),
    ('“', '”'),
    ('‘', '’'),
    ('«', '»'),
    ('`', '`'),
];

/// Strip markup and quoting, normalize whitespace, and trim
pub fn clean_suggestion_text(raw: &str) -> String {
    let without_fences = strip_code_fences(raw.trim());
    let without_tags = strip_tags(without_fences);
    let decoded = decode_entities(&without_tags);
    let collapsed = collapse_whitespace(&decoded);
    strip_wrapping_quotes(&collapsed).to_string()
}

/// Remove a surrounding ``` fence (with optional language tag)
fn strip_code_fences(text: &str) -> &str {
    let Some(inner) = text.strip_prefix("```") else {
        return text;
    };
    let Some(inner) = inner.strip_suffix("```") else {
        return text;
    };
    // Drop the language tag line, if any
    match inner.find('\n') {
        Some(newline) if !inner[..newline].contains(' ') => &inner[newline + 1..],
        _ => inner,
    }
}

/// Remove `<...>` tags; a `<` not followed by a tag name is kept as text
fn strip_tags(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('<') {
        result.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let looks_like_tag = after
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '/' || c == '!');

        match after.find('>') {
            Some(end) if looks_like_tag => {
                if is_block_tag(&after[..end]) {
                    result.push(' ');
                }
                rest = &after[end + 1..];
            }
            _ => {
                result.push('<');
                rest = after;
            }
        }
    }

    result.push_str(rest);
    result
}

fn is_block_tag(tag_body: &str) -> bool {
    let name: String = tag_body
        .trim_start_matches('/')
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase();
    BLOCK_TAGS.contains(&name.as_str())
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        // Last, so "&amp;lt;" decodes to "&lt;" and not "<"
        .replace("&amp;", "&")
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove quotes that enclose the whole text
///
/// A pair only counts as wrapping when neither quote character occurs again
/// inside, so `"Yes," she said, "today."` is left alone.
fn strip_wrapping_quotes(text: &str) -> &str {
    let mut current = text;
    loop {
        let mut chars = current.chars();
        let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
            return current;
        };

        let Some(&(open, close)) = QUOTE_PAIRS
            .iter()
            .find(|&&(open, close)| first == open && last == close)
        else {
            return current;
        };

        let inner = &current[first.len_utf8()..current.len() - last.len_utf8()];
        if inner.contains(open) || inner.contains(close) {
            return current;
        }
        current = inner.trim();
    }
}

#[cfg(test)]
#[path = "cleaner_tests.rs"]
mod cleaner_tests;
