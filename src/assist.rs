//! Writing assistant for a content editor
//!
//! Decides when to ask a generation service for a continuation of the text at
//! the cursor, serves repeated contexts from a local cache, keeps request
//! volume within limits, and makes sure only the freshest suggestion is shown.

pub mod cache;
mod clock;
pub mod context;
pub mod coordinator;
pub mod credential;
pub mod prompt;
pub mod provider;
pub mod rate_limiter;
pub mod session;
pub mod suggestion;
pub mod tracking;
pub mod trigger;
pub mod worker;

pub use clock::now_ms;
pub use context::{CursorPosition, DocumentMeta};
pub use credential::Credential;
pub use session::{AssistSession, SessionStats};
pub use suggestion::{Suggestion, SuggestionState};
pub use trigger::TriggerOutcome;
