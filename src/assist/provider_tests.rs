//! Tests for generation provider abstraction

use super::*;
use crate::config::assist_types::{AnthropicConfig, EndpointConfig, OpenAiConfig};
use proptest::prelude::*;

/// Helper to run async tests with a tokio runtime
fn run_async<F: std::future::Future>(f: F) -> F::Output {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create tokio runtime");
    rt.block_on(f)
}

fn enabled_config(provider: ProviderType) -> AssistConfig {
    AssistConfig {
        enabled: true,
        provider: Some(provider),
        anthropic: AnthropicConfig {
            api_key: None,
            model: Some("claude-haiku-4-5".to_string()),
            max_tokens: 256,
        },
        openai: OpenAiConfig {
            api_key: None,
            model: Some("gpt-4o-mini".to_string()),
        },
        endpoint: EndpointConfig {
            url: Some("http://127.0.0.1:9/generate".to_string()),
            api_key: None,
        },
        ..AssistConfig::default()
    }
}

#[test]
fn test_from_config_without_provider_is_not_configured() {
    let config = AssistConfig {
        enabled: true,
        ..AssistConfig::default()
    };

    match GenerationProvider::from_config(&config) {
        Err(GenerationError::NotConfigured { provider, message }) => {
            assert_eq!(provider, "None");
            assert!(message.contains("No provider configured"));
        }
        other => panic!("Expected NotConfigured error, got {:?}", other),
    }
}

#[test]
fn test_from_config_disabled_is_not_configured() {
    let mut config = enabled_config(ProviderType::Anthropic);
    config.enabled = false;

    let err = GenerationProvider::from_config(&config).unwrap_err();
    assert!(err.to_string().contains("disabled"));
}

#[test]
fn test_from_config_builds_each_provider() {
    for (provider, name) in [
        (ProviderType::Anthropic, "Anthropic"),
        (ProviderType::OpenAi, "OpenAI"),
        (ProviderType::Endpoint, "Endpoint"),
    ] {
        let built = GenerationProvider::from_config(&enabled_config(provider)).unwrap();
        assert_eq!(built.provider_name(), name);
    }
}

#[test]
fn test_endpoint_requires_url() {
    let mut config = enabled_config(ProviderType::Endpoint);
    config.endpoint.url = Some("  ".to_string());

    let err = GenerationProvider::from_config(&config).unwrap_err();
    assert!(err.to_string().contains("Missing url"));
}

#[test]
fn test_pre_cancelled_request_returns_cancelled() {
    let provider = GenerationProvider::from_config(&enabled_config(ProviderType::Endpoint)).unwrap();
    let token = CancellationToken::new();
    token.cancel();

    let result = run_async(provider.generate("prompt", None, token));
    assert!(matches!(result, Err(GenerationError::Cancelled)));
}

#[test]
fn test_anthropic_without_credential_is_not_configured() {
    let provider =
        GenerationProvider::from_config(&enabled_config(ProviderType::Anthropic)).unwrap();

    let result = run_async(provider.generate("prompt", None, CancellationToken::new()));
    match result {
        Err(GenerationError::NotConfigured { message, .. }) => {
            assert!(message.contains("API key"));
        }
        other => panic!("Expected NotConfigured error, got {:?}", other),
    }
}

#[test]
fn test_error_display_includes_provider() {
    let err = GenerationError::Api {
        provider: "OpenAI".to_string(),
        code: 429,
        message: "slow down".to_string(),
    };
    assert_eq!(err.to_string(), "[OpenAI] API error (429): slow down");
    assert_eq!(
        GenerationError::Timeout(1500).to_string(),
        "Request timed out after 1500ms"
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_blank_model_is_rejected(blank in "[ \t]*") {
        let mut config = enabled_config(ProviderType::OpenAi);
        config.openai.model = Some(blank);

        let result = GenerationProvider::from_config(&config);
        prop_assert!(
            matches!(result, Err(GenerationError::NotConfigured { .. })),
            "blank model should be rejected"
        );
    }
}
