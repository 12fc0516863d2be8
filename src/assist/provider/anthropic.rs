//! Anthropic Messages API client
//!
//! Non-streaming: a suggestion is short, so the full message is awaited and
//! the text blocks are concatenated.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{GenerationError, Generated, require_credential, send_with_cancel};
use crate::assist::credential::Credential;

/// Anthropic API endpoint
const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";

/// Anthropic API version header
const ANTHROPIC_VERSION: &str = "2023-06-01";

const PROVIDER: &str = "Anthropic";

#[derive(Debug, Clone)]
pub struct AnthropicClient {
    client: Client,
    model: String,
    max_tokens: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct RequestBody<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct ResponseBody {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

impl AnthropicClient {
    pub fn new(model: String, max_tokens: u32) -> Self {
        Self {
            client: Client::new(),
            model,
            max_tokens,
        }
    }

    fn build_request_body(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = RequestBody {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        serde_json::to_string(&body).map_err(|e| GenerationError::Parse {
            provider: PROVIDER.to_string(),
            message: format!("Failed to serialize request body: {}", e),
        })
    }

    pub async fn generate(
        &self,
        prompt: &str,
        credential: Option<&Credential>,
        cancel_token: CancellationToken,
    ) -> Result<Generated, GenerationError> {
        let credential = require_credential(PROVIDER, credential)?;
        let body = self.build_request_body(prompt)?;

        let request = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", credential.token())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .body(body);

        let response = send_with_cancel(PROVIDER, request, &cancel_token).await?;
        parse_response(&response)
    }
}

/// Extract the concatenated text blocks of a Messages API response
fn parse_response(body: &str) -> Result<Generated, GenerationError> {
    let parsed: ResponseBody = serde_json::from_str(body).map_err(|e| GenerationError::Parse {
        provider: PROVIDER.to_string(),
        message: e.to_string(),
    })?;

    let text = parsed
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .map(|block| block.text)
        .collect::<String>();

    Ok(Generated {
        text,
        confidence: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_shape() {
        let client = AnthropicClient::new("claude-haiku".to_string(), 128);
        let body = client.build_request_body("continue this").unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["model"], "claude-haiku");
        assert_eq!(json["max_tokens"], 128);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "continue this");
    }

    #[test]
    fn test_parse_response_joins_text_blocks() {
        let body = r#"{
            "id": "msg_1",
            "content": [
                {"type": "text", "text": "and the rain"},
                {"type": "tool_use", "id": "x", "name": "y", "input": {}},
                {"type": "text", "text": " stopped."}
            ]
        }"#;
        let generated = parse_response(body).unwrap();
        assert_eq!(generated.text, "and the rain stopped.");
        assert_eq!(generated.confidence, None);
    }

    #[test]
    fn test_parse_response_rejects_garbage() {
        let err = parse_response("not json").unwrap_err();
        assert!(matches!(err, GenerationError::Parse { .. }));
    }
}
