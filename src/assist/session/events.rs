//! Session event handling
//!
//! Edit events feed the trigger pipeline; `tick` drains worker responses,
//! fires the debounce slot and sweeps the cache.
//!
//! An intent is served from cache, or by a call already in flight for the
//! same context. Only when a new call is needed does the rate limiter decide
//! whether the coordinator may dispatch it.

use super::AssistSession;
use crate::assist::clock::now_ms;
use crate::assist::context::text_before;
use crate::assist::coordinator::{DispatchOutcome, Publication};
use crate::assist::prompt::{PromptContext, build_prompt};
use crate::assist::suggestion::Suggestion;
use crate::assist::trigger::{GenerationIntent, TriggerOutcome};

impl AssistSession {
    /// Feed a content-change event
    ///
    /// `busy` is set while the user is interacting with another part of the
    /// editor; such events are ignored entirely. Returns `None` when the
    /// assistant is disabled.
    pub fn on_content_change(
        &mut self,
        content: &str,
        cursor_offset: usize,
        busy: bool,
    ) -> Option<TriggerOutcome> {
        self.on_content_change_at(content, cursor_offset, busy, now_ms())
    }

    pub fn on_content_change_at(
        &mut self,
        content: &str,
        cursor_offset: usize,
        busy: bool,
        now: u64,
    ) -> Option<TriggerOutcome> {
        if !self.enabled {
            return None;
        }
        Some(self.trigger.on_event_at(content, cursor_offset, busy, now))
    }

    /// Advance the session; call on every iteration of the host event loop
    ///
    /// Returns true if the visible suggestion changed.
    pub fn tick(&mut self) -> bool {
        self.tick_at(now_ms())
    }

    pub fn tick_at(&mut self, now: u64) -> bool {
        if !self.enabled {
            return false;
        }

        let mut changed = false;

        if let Some(publication) = self.coordinator.poll_responses_at(&mut self.cache, now) {
            self.publish(publication);
            changed = true;
        }

        if let Some(intent) = self.trigger.poll_at(now) {
            changed |= self.evaluate(intent, now);
        }

        if now.saturating_sub(self.last_sweep_at) >= self.sweep_interval_ms {
            let removed = self.cache.evict_expired_at(now);
            if removed > 0 {
                log::debug!("Swept {} expired cache entries", removed);
            }
            self.last_sweep_at = now;
        }

        changed
    }

    /// Serve an intent from cache or dispatch it; true if a suggestion was published
    fn evaluate(&mut self, intent: GenerationIntent, now: u64) -> bool {
        let sequence = self.coordinator.begin_intent();
        let before_cursor = text_before(&intent.content, intent.position.offset);
        let context_hash = self.cache.context_key(before_cursor, &self.meta);

        if let Some(entry) = self.cache.lookup_at(context_hash, now) {
            log::debug!("Cache hit for intent {}", sequence);
            self.coordinator.release_superseded(None);
            self.publish(Publication {
                suggestion: Suggestion {
                    text: entry.text,
                    confidence: entry.confidence,
                    position: intent.position,
                },
                input: intent.window.before,
                sequence,
            });
            return true;
        }

        if self.coordinator.adopt_in_flight(
            sequence,
            context_hash,
            &intent.window.before,
            intent.position,
        ) {
            return false;
        }

        if !self.limiter.can_request_at(now) {
            log::debug!(
                "Rate limited intent {}: {:?}",
                sequence,
                self.limiter.status_at(now)
            );
            return false;
        }

        let prompt = build_prompt(&PromptContext::new(intent.window.clone(), self.meta.clone()));
        let outcome = self.coordinator.dispatch_at(
            sequence,
            context_hash,
            prompt,
            intent.window.before,
            intent.position,
            self.credential.clone(),
            now,
        );
        log::debug!("Intent {}: {:?}", sequence, outcome);

        if outcome == DispatchOutcome::Dispatched {
            self.limiter.record_request_at(now);
        }
        false
    }
}
