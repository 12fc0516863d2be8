//! Prompt template generation
//!
//! Builds the continuation prompt sent to the generation provider from the
//! context window around the cursor and the document metadata.

use super::context::{ContextWindow, DocumentMeta};

/// Everything the provider sees about the current cursor context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptContext {
    pub window: ContextWindow,
    pub meta: DocumentMeta,
}

impl PromptContext {
    pub fn new(window: ContextWindow, meta: DocumentMeta) -> Self {
        Self { window, meta }
    }
}

/// Build a continuation prompt for the cursor context
pub fn build_prompt(context: &PromptContext) -> String {
    let mut prompt = String::new();

    prompt.push_str("You are a writing assistant embedded in a content editor.\n");
    prompt.push_str("Continue the text at the cursor with ONE short, natural continuation.\n");
    prompt.push_str("Match the language, tone, and style of the surrounding text.\n");
    prompt.push_str("Reply with the continuation only: no quotes, no markup, no explanations.\n\n");

    if let Some(ref title) = context.meta.title {
        prompt.push_str(&format!("Title: {}\n", title));
    }
    if let Some(ref category) = context.meta.category {
        prompt.push_str(&format!("Category: {}\n", category));
    }
    if context.meta.title.is_some() || context.meta.category.is_some() {
        prompt.push('\n');
    }

    prompt.push_str("## Text before the cursor\n");
    prompt.push_str(&format!("```\n{}\n```\n", context.window.before));

    if !context.window.after.is_empty() {
        prompt.push_str("\n## Text after the cursor\n");
        prompt.push_str(&format!("```\n{}\n```\n", context.window.after));
        prompt.push_str("The continuation must read naturally into the text after the cursor.\n");
    }

    prompt
}
