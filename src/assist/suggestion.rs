//! Suggestion types and lifecycle
//!
//! A published suggestion starts `Proposed` and ends in exactly one terminal
//! state: accepted, rejected, or superseded by a newer suggestion.

mod cleaner;

pub use cleaner::clean_suggestion_text;

use serde::Serialize;

use super::context::CursorPosition;

/// The currently visible proposal
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    /// Raw generated text, as returned by the provider
    pub text: String,
    /// Provider-reported confidence, when the provider reports one
    pub confidence: Option<f32>,
    /// Cursor position the suggestion was generated for
    pub position: CursorPosition,
}

impl Suggestion {
    /// Text ready to insert at `position`
    pub fn insertable_text(&self) -> String {
        clean_suggestion_text(&self.text)
    }
}

/// Lifecycle state of a suggestion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionState {
    Proposed,
    Accepted,
    Rejected,
    Superseded,
}

impl SuggestionState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SuggestionState::Proposed)
    }

    /// Apply a transition, returning the new state if it is legal
    ///
    /// Only `Proposed` can move, and only to a terminal state.
    pub fn transition(self, to: SuggestionState) -> Option<SuggestionState> {
        match (self, to) {
            (SuggestionState::Proposed, SuggestionState::Proposed) => None,
            (SuggestionState::Proposed, terminal) => Some(terminal),
            _ => None,
        }
    }
}
