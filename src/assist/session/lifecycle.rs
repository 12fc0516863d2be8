//! Suggestion lifecycle within a session
//!
//! At most one suggestion is visible. Publishing a new one supersedes the
//! previous; accepting or rejecting clears it. Every transition is recorded by
//! the tracking sink.

use super::{ActiveSuggestion, AssistSession, SessionStats};
use crate::assist::clock::now_ms;
use crate::assist::coordinator::Publication;
use crate::assist::suggestion::Suggestion;
use crate::assist::tracking::TrackingMetadata;

impl AssistSession {
    pub(super) fn publish(&mut self, publication: Publication) {
        if let Some(previous) = self.current.take() {
            self.tracking.mark_superseded(previous.tracking_id);
        }

        let Publication {
            suggestion, input, ..
        } = publication;
        let metadata = TrackingMetadata {
            title: self.meta.title.clone(),
            category: self.meta.category.clone(),
            confidence: suggestion.confidence,
        };
        let tracking_id =
            self.tracking
                .track_proposed(&input, &suggestion.insertable_text(), metadata);

        self.current = Some(ActiveSuggestion {
            suggestion,
            tracking_id,
        });
    }

    /// The visible suggestion, if any
    pub fn suggestion(&self) -> Option<&Suggestion> {
        self.current.as_ref().map(|active| &active.suggestion)
    }

    pub fn is_visible(&self) -> bool {
        self.current.is_some()
    }

    /// Accept the visible suggestion, returning the cleaned text to insert
    pub fn accept(&mut self) -> Option<String> {
        let active = self.current.take()?;
        let text = active.suggestion.insertable_text();
        self.tracking.mark_accepted(active.tracking_id, &text);
        Some(text)
    }

    /// Dismiss the visible suggestion; returns false if none was visible
    pub fn reject(&mut self) -> bool {
        match self.current.take() {
            Some(active) => {
                self.tracking.mark_rejected(active.tracking_id);
                true
            }
            None => false,
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats_at(now_ms())
    }

    pub fn stats_at(&self, now: u64) -> SessionStats {
        SessionStats {
            cache: self.cache.stats(),
            rate_limiter: self.limiter.status_at(now),
            coordinator: self.coordinator.stats(),
        }
    }
}
