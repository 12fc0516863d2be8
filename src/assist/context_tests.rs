//! Tests for cursor context extraction

use super::*;
use proptest::prelude::*;

#[test]
fn test_window_in_middle_of_document() {
    let window = extract_context("abcdefghij", 5, 3);
    assert_eq!(window.before, "cde");
    assert_eq!(window.after, "fgh");
}

#[test]
fn test_window_clamped_at_document_start() {
    let window = extract_context("abcdefghij", 1, 4);
    assert_eq!(window.before, "a");
    assert_eq!(window.after, "bcde");
}

#[test]
fn test_window_clamped_at_document_end() {
    let window = extract_context("abcdefghij", 10, 4);
    assert_eq!(window.before, "ghij");
    assert_eq!(window.after, "");
}

#[test]
fn test_cursor_past_end_is_clamped() {
    let window = extract_context("abc", 99, 10);
    assert_eq!(window.before, "abc");
    assert!(window.after.is_empty());
}

#[test]
fn test_empty_document_gives_empty_window() {
    let window = extract_context("", 0, 150);
    assert!(window.is_empty());
}

#[test]
fn test_multibyte_text_is_split_on_char_boundaries() {
    let text = "¿Qué tal? añadir más";
    let window = extract_context(text, 4, 3);
    assert_eq!(window.before, "Qué");
    assert_eq!(window.after, " ta");
}

#[test]
fn test_cursor_position_first_line() {
    let pos = CursorPosition::from_offset("hello world", 5);
    assert_eq!(
        pos,
        CursorPosition {
            line: 0,
            column: 5,
            offset: 5
        }
    );
}

#[test]
fn test_cursor_position_after_newlines() {
    let pos = CursorPosition::from_offset("one\ntwo\nthree", 10);
    assert_eq!(pos.line, 2);
    assert_eq!(pos.column, 2);
    assert_eq!(pos.offset, 10);
}

#[test]
fn test_cursor_position_right_after_newline() {
    let pos = CursorPosition::from_offset("one\ntwo", 4);
    assert_eq!(pos.line, 1);
    assert_eq!(pos.column, 0);
}

#[test]
fn test_cursor_position_clamps_offset() {
    let pos = CursorPosition::from_offset("ab\nc", 50);
    assert_eq!(pos.offset, 4);
    assert_eq!(pos.line, 1);
    assert_eq!(pos.column, 1);
}

#[test]
fn test_trailing_chars() {
    assert_eq!(trailing_chars("abcdef", 3), "def");
    assert_eq!(trailing_chars("abc", 10), "abc");
    assert_eq!(trailing_chars("añé", 2), "ñé");
}

#[test]
fn test_text_before_cursor() {
    assert_eq!(text_before("abcdef", 2), "ab");
    assert_eq!(text_before("añé!", 2), "añ");
    assert_eq!(text_before("abc", 10), "abc");
    assert_eq!(text_before("abc", 0), "");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_window_is_bounded_and_adjacent(
        text in "\\PC{0,300}",
        cursor in 0usize..400,
        window_chars in 0usize..200,
    ) {
        let window = extract_context(&text, cursor, window_chars);

        prop_assert!(window.before.chars().count() <= window_chars);
        prop_assert!(window.after.chars().count() <= window_chars);

        // before + after is always a contiguous slice of the document
        let joined = format!("{}{}", window.before, window.after);
        prop_assert!(text.contains(&joined));
    }
}
