//! draftpilot library - AI writing suggestions for content editors
//!
//! The host editor owns an [`AssistSession`] and drives it from its event loop.

pub mod assist;
pub mod config;
pub mod error;

// Re-export commonly used types for convenience
pub use assist::{AssistSession, Credential, DocumentMeta, Suggestion};
pub use config::Config;
pub use error::DraftError;
