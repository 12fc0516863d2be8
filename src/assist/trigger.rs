//! Trigger pipeline for suggestion requests
//!
//! Collapses a stream of content-change events into at most one generation
//! intent per quiet period (trailing-edge debounce). The pending timer is a
//! single slot that every qualifying event cancels and rearms, so a burst of
//! keystrokes fires once, with the content of the last keystroke.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::context::{ContextWindow, CursorPosition, extract_context};
use crate::config::assist_types::AssistConfig;

/// Result of feeding one edit event to the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The debounce slot was (re)armed with this event
    Armed,
    /// Content equals the last evaluated content; any armed slot was cancelled
    Unchanged,
    /// Content is below `min_length`; any armed slot was cancelled
    TooShort,
    /// The host reported the user busy elsewhere; nothing changed
    Busy,
}

/// An approved request to evaluate a suggestion for the given content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationIntent {
    pub content: String,
    pub position: CursorPosition,
    pub window: ContextWindow,
}

/// The single pending timer handle
#[derive(Debug)]
struct DebounceSlot {
    armed_at: u64,
    content: String,
    cursor_offset: usize,
}

#[derive(Debug)]
pub struct TriggerPipeline {
    debounce_ms: u64,
    min_length: usize,
    context_chars: usize,
    slot: Option<DebounceSlot>,
    /// Hash of the content that last fired an intent
    last_evaluated_hash: Option<u64>,
}

impl TriggerPipeline {
    pub fn new(debounce_ms: u64, min_length: usize, context_chars: usize) -> Self {
        Self {
            debounce_ms,
            min_length,
            context_chars,
            slot: None,
            last_evaluated_hash: None,
        }
    }

    pub fn from_config(config: &AssistConfig) -> Self {
        Self::new(config.debounce_ms, config.min_length, config.context_chars)
    }

    /// Feed one content-change event observed at `now`
    pub fn on_event_at(
        &mut self,
        content: &str,
        cursor_offset: usize,
        busy: bool,
        now: u64,
    ) -> TriggerOutcome {
        if busy {
            return TriggerOutcome::Busy;
        }

        if self.last_evaluated_hash == Some(content_hash(content)) {
            self.cancel();
            return TriggerOutcome::Unchanged;
        }

        if content.chars().count() < self.min_length {
            self.cancel();
            return TriggerOutcome::TooShort;
        }

        self.slot = Some(DebounceSlot {
            armed_at: now,
            content: content.to_string(),
            cursor_offset,
        });
        TriggerOutcome::Armed
    }

    /// Fire the slot if the quiet period has elapsed by `now`
    ///
    /// Returns the intent at most once per armed slot.
    pub fn poll_at(&mut self, now: u64) -> Option<GenerationIntent> {
        let ready = self
            .slot
            .as_ref()
            .is_some_and(|slot| now.saturating_sub(slot.armed_at) >= self.debounce_ms);
        if !ready {
            return None;
        }

        let slot = self.slot.take()?;
        self.last_evaluated_hash = Some(content_hash(&slot.content));

        let window = extract_context(&slot.content, slot.cursor_offset, self.context_chars);
        let position = CursorPosition::from_offset(&slot.content, slot.cursor_offset);
        Some(GenerationIntent {
            content: slot.content,
            position,
            window,
        })
    }

    /// Disarm the pending slot without firing
    pub fn cancel(&mut self) {
        self.slot = None;
    }

    pub fn has_pending(&self) -> bool {
        self.slot.is_some()
    }

    /// Milliseconds until the armed slot fires, if any
    pub fn remaining_ms_at(&self, now: u64) -> Option<u64> {
        self.slot
            .as_ref()
            .map(|slot| self.debounce_ms.saturating_sub(now.saturating_sub(slot.armed_at)))
    }

    /// Forget the last evaluated content so identical content can fire again
    pub fn forget_last_evaluated(&mut self) {
        self.last_evaluated_hash = None;
    }

    pub fn debounce_ms(&self) -> u64 {
        self.debounce_ms
    }
}

impl Default for TriggerPipeline {
    fn default() -> Self {
        Self::from_config(&AssistConfig::default())
    }
}

fn content_hash(content: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
#[path = "trigger_tests.rs"]
mod trigger_tests;
