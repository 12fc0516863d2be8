//! Credential passed explicitly with every generation request
//!
//! There is no process-wide token: the host builds a `Credential` once per
//! session (or refreshes it) and the session hands a clone to each call.

use std::fmt;

use crate::config::assist_types::{AssistConfig, ProviderType};

/// Environment variable consulted when the config carries no key
pub const API_KEY_ENV: &str = "DRAFTPILOT_API_KEY";

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    token: String,
}

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Credential for the configured provider, falling back to `DRAFTPILOT_API_KEY`
    ///
    /// Returns `None` when neither source has a non-blank key.
    pub fn from_config(config: &AssistConfig) -> Option<Self> {
        let configured = match config.provider {
            Some(ProviderType::Anthropic) => config.anthropic.api_key.clone(),
            Some(ProviderType::OpenAi) => config.openai.api_key.clone(),
            Some(ProviderType::Endpoint) => config.endpoint.api_key.clone(),
            None => None,
        };

        configured
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .map(Self::new)
    }
}

// Keys never reach logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_token() {
        let credential = Credential::new("sk-secret");
        let debug = format!("{:?}", credential);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_from_config_uses_selected_provider_key() {
        let mut config = AssistConfig {
            provider: Some(ProviderType::OpenAi),
            ..AssistConfig::default()
        };
        config.openai.api_key = Some("sk-openai".to_string());
        config.anthropic.api_key = Some("sk-anthropic".to_string());

        let credential = Credential::from_config(&config).unwrap();
        assert_eq!(credential.token(), "sk-openai");
    }

    #[test]
    fn test_from_config_rejects_blank_key() {
        let mut config = AssistConfig {
            provider: Some(ProviderType::Anthropic),
            ..AssistConfig::default()
        };
        config.anthropic.api_key = Some("   ".to_string());

        // A blank configured key wins over the environment, and is rejected
        assert!(Credential::from_config(&config).is_none());
    }
}
