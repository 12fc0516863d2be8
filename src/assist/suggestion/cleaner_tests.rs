//! Tests for suggestion text cleaning

use super::*;
use proptest::prelude::*;

#[test]
fn test_strips_inline_markup() {
    assert_eq!(clean_suggestion_text("<b>Hola</b> mundo"), "Hola mundo");
}

#[test]
fn test_inline_tags_do_not_split_words() {
    assert_eq!(clean_suggestion_text("un<em>believ</em>able"), "unbelievable");
}

#[test]
fn test_block_tags_separate_words() {
    assert_eq!(
        clean_suggestion_text("<p>First line.</p><p>Second line.</p>"),
        "First line. Second line."
    );
    assert_eq!(clean_suggestion_text("one<br/>two"), "one two");
}

#[test]
fn test_tags_with_attributes() {
    assert_eq!(
        clean_suggestion_text(r#"<span class="hl">warm</span> weather"#),
        "warm weather"
    );
}

#[test]
fn test_less_than_in_prose_is_kept() {
    assert_eq!(clean_suggestion_text("if a < b then"), "if a < b then");
    assert_eq!(clean_suggestion_text("3 <5"), "3 <5");
}

#[test]
fn test_unterminated_tag_is_kept_as_text() {
    assert_eq!(clean_suggestion_text("see <b"), "see <b");
}

#[test]
fn test_entities_are_decoded_after_tags() {
    assert_eq!(
        clean_suggestion_text("Fish&nbsp;&amp;&nbsp;chips &lt;b&gt;"),
        "Fish & chips <b>"
    );
    assert_eq!(clean_suggestion_text("&amp;lt;"), "&lt;");
}

#[test]
fn test_whitespace_is_collapsed_and_trimmed() {
    assert_eq!(
        clean_suggestion_text("  and then\n\n  the   rain\tstopped  "),
        "and then the rain stopped"
    );
}

#[test]
fn test_wrapping_quotes_are_removed() {
    assert_eq!(clean_suggestion_text("\"Next sentence.\""), "Next sentence.");
    assert_eq!(clean_suggestion_text("“Smart quotes”"), "Smart quotes");
    assert_eq!(clean_suggestion_text("« Bonjour »"), "Bonjour");
    assert_eq!(clean_suggestion_text("'\"nested\"'"), "nested");
}

#[test]
fn test_inner_quotes_are_kept() {
    assert_eq!(
        clean_suggestion_text("she said \"hi\" twice"),
        "she said \"hi\" twice"
    );
    assert_eq!(clean_suggestion_text("\"open only"), "\"open only");
}

#[test]
fn test_quoted_dialogue_keeps_balanced_quotes() {
    let dialogue = "\"Yes,\" she said, \"today.\"";
    assert_eq!(clean_suggestion_text(dialogue), dialogue);
    assert_eq!(
        clean_suggestion_text("“Go,” he said. “Now.”"),
        "“Go,” he said. “Now.”"
    );
    assert_eq!(clean_suggestion_text("'It's late'"), "'It's late'");
}

#[test]
fn test_single_quote_character_is_kept() {
    assert_eq!(clean_suggestion_text("\""), "\"");
}

#[test]
fn test_code_fence_is_removed() {
    assert_eq!(
        clean_suggestion_text("```text\nthe continuation\n```"),
        "the continuation"
    );
    assert_eq!(clean_suggestion_text("```plain words```"), "plain words");
}

#[test]
fn test_empty_input() {
    assert_eq!(clean_suggestion_text(""), "");
    assert_eq!(clean_suggestion_text("   <br>  "), "");
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_output_is_trimmed_and_collapsed(raw in "\\PC{0,200}") {
        let cleaned = clean_suggestion_text(&raw);
        prop_assert_eq!(cleaned.trim(), cleaned.as_str());
        prop_assert!(!cleaned.contains("  "));
        prop_assert!(!cleaned.contains('\n'));
    }

    #[test]
    fn prop_plain_words_pass_through(words in prop::collection::vec("[a-zA-Z]{1,10}", 1..20)) {
        let text = words.join(" ");
        prop_assert_eq!(clean_suggestion_text(&text), text);
    }
}
