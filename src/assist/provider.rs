//! Generation provider abstraction
//!
//! Defines the GenerationProvider enum, GenerationError types, and factory for creating
//! provider instances. Calls are async and race a CancellationToken so superseded
//! requests can be aborted.

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::credential::Credential;
use crate::config::assist_types::{AssistConfig, ProviderType};

mod anthropic;
mod endpoint;
mod openai;

pub use anthropic::AnthropicClient;
pub use endpoint::EndpointClient;
pub use openai::OpenAiClient;

/// Errors that can occur during a generation call
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum GenerationError {
    /// Provider is not configured (missing model, URL, or disabled)
    #[error("[{provider}] Not configured: {message}")]
    NotConfigured { provider: String, message: String },

    /// Network error during the request
    #[error("[{provider}] Network error: {message}")]
    Network { provider: String, message: String },

    /// API returned an error response
    #[error("[{provider}] API error ({code}): {message}")]
    Api {
        provider: String,
        code: u16,
        message: String,
    },

    /// Failed to build or parse a request/response body
    #[error("[{provider}] Parse error: {message}")]
    Parse { provider: String, message: String },

    /// No response within the configured timeout
    #[error("Request timed out after {0}ms")]
    Timeout(u64),

    /// Request was cancelled
    #[error("Request cancelled")]
    Cancelled,
}

/// Candidate text returned by a provider
#[derive(Debug, Clone, PartialEq)]
pub struct Generated {
    pub text: String,
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone)]
pub enum GenerationProvider {
    Anthropic(AnthropicClient),
    OpenAi(OpenAiClient),
    Endpoint(EndpointClient),
}

impl GenerationProvider {
    /// Returns the display name of the provider
    pub fn provider_name(&self) -> &'static str {
        match self {
            GenerationProvider::Anthropic(_) => "Anthropic",
            GenerationProvider::OpenAi(_) => "OpenAI",
            GenerationProvider::Endpoint(_) => "Endpoint",
        }
    }

    /// Create a provider from configuration
    ///
    /// Credentials are not read here; they travel with each request.
    pub fn from_config(config: &AssistConfig) -> Result<Self, GenerationError> {
        let Some(provider) = config.provider else {
            return Err(GenerationError::NotConfigured {
                provider: "None".to_string(),
                message: "No provider configured. Set provider = \"anthropic\", \"openai\" or \"endpoint\" in the [assist] section.".to_string(),
            });
        };

        let provider_name = match provider {
            ProviderType::Anthropic => "Anthropic",
            ProviderType::OpenAi => "OpenAI",
            ProviderType::Endpoint => "Endpoint",
        };

        if !config.enabled {
            return Err(GenerationError::NotConfigured {
                provider: provider_name.to_string(),
                message: "Assistant is disabled. Set 'enabled = true' in the [assist] section."
                    .to_string(),
            });
        }

        match provider {
            ProviderType::Anthropic => {
                let model = non_blank(&config.anthropic.model).ok_or_else(|| {
                    GenerationError::NotConfigured {
                        provider: provider_name.to_string(),
                        message: "Missing model. Add 'model' in [assist.anthropic] section (e.g., 'claude-haiku-4-5-20251001').".to_string(),
                    }
                })?;
                Ok(GenerationProvider::Anthropic(AnthropicClient::new(
                    model,
                    config.anthropic.max_tokens,
                )))
            }
            ProviderType::OpenAi => {
                let model = non_blank(&config.openai.model).ok_or_else(|| {
                    GenerationError::NotConfigured {
                        provider: provider_name.to_string(),
                        message: "Missing model. Add 'model' in [assist.openai] section (e.g., 'gpt-4o-mini').".to_string(),
                    }
                })?;
                Ok(GenerationProvider::OpenAi(OpenAiClient::new(model)))
            }
            ProviderType::Endpoint => {
                let url = non_blank(&config.endpoint.url).ok_or_else(|| {
                    GenerationError::NotConfigured {
                        provider: provider_name.to_string(),
                        message: "Missing url. Add 'url' in [assist.endpoint] section."
                            .to_string(),
                    }
                })?;
                Ok(GenerationProvider::Endpoint(EndpointClient::new(url)))
            }
        }
    }

    /// Generate a suggestion for `prompt`, aborting if `cancel_token` fires
    ///
    /// # Returns
    /// * `Ok(Generated)` - Candidate text
    /// * `Err(GenerationError::Cancelled)` - Request was cancelled
    /// * `Err(GenerationError::*)` - Other errors
    pub async fn generate(
        &self,
        prompt: &str,
        credential: Option<&Credential>,
        cancel_token: CancellationToken,
    ) -> Result<Generated, GenerationError> {
        if cancel_token.is_cancelled() {
            return Err(GenerationError::Cancelled);
        }

        match self {
            GenerationProvider::Anthropic(client) => {
                client.generate(prompt, credential, cancel_token).await
            }
            GenerationProvider::OpenAi(client) => {
                client.generate(prompt, credential, cancel_token).await
            }
            GenerationProvider::Endpoint(client) => {
                client.generate(prompt, credential, cancel_token).await
            }
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

/// Credential required by providers that cannot work anonymously
fn require_credential<'a>(
    provider: &str,
    credential: Option<&'a Credential>,
) -> Result<&'a Credential, GenerationError> {
    credential.ok_or_else(|| GenerationError::NotConfigured {
        provider: provider.to_string(),
        message: "Missing API key. Add 'api_key' to the provider section or set DRAFTPILOT_API_KEY."
            .to_string(),
    })
}

/// Send a prepared request, racing it against cancellation
async fn send_with_cancel(
    provider: &str,
    request: reqwest::RequestBuilder,
    cancel_token: &CancellationToken,
) -> Result<String, GenerationError> {
    let exchange = async {
        let response = request.send().await.map_err(|e| GenerationError::Network {
            provider: provider.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| GenerationError::Network {
            provider: provider.to_string(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            return Err(GenerationError::Api {
                provider: provider.to_string(),
                code: status.as_u16(),
                message: body,
            });
        }
        Ok(body)
    };

    tokio::select! {
        biased;

        _ = cancel_token.cancelled() => Err(GenerationError::Cancelled),
        result = exchange => result,
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod provider_tests;
