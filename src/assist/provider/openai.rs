//! OpenAI Chat Completions API client

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{GenerationError, Generated, require_credential, send_with_cancel};
use crate::assist::credential::Credential;

/// OpenAI API endpoint
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

const PROVIDER: &str = "OpenAI";

#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    model: String,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct RequestBody<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct ResponseBody {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(model: String) -> Self {
        Self {
            client: Client::new(),
            model,
        }
    }

    /// Build the request body JSON for the Chat Completions API
    ///
    /// Does not set max_tokens, allowing OpenAI to use its default.
    fn build_request_body(&self, prompt: &str) -> Result<String, GenerationError> {
        let body = RequestBody {
            model: &self.model,
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
            .post(OPENAI_API_URL)
            .header("Authorization", format!("Bearer {}", credential.token()))
            .header("Content-Type", "application/json")
            .body(body);

        let response = send_with_cancel(PROVIDER, request, &cancel_token).await?;
        parse_response(&response)
    }
}

/// Text of the first choice
fn parse_response(body: &str) -> Result<Generated, GenerationError> {
    let parsed: ResponseBody = serde_json::from_str(body).map_err(|e| GenerationError::Parse {
        provider: PROVIDER.to_string(),
        message: e.to_string(),
    })?;

    let text = parsed
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| GenerationError::Parse {
            provider: PROVIDER.to_string(),
            message: "Response has no choices".to_string(),
        })?;

    Ok(Generated {
        text,
        confidence: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_body_has_no_max_tokens() {
        let client = OpenAiClient::new("gpt-4o-mini".to_string());
        let body = client.build_request_body("hi").unwrap();
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["messages"][0]["content"], "hi");
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn test_parse_first_choice() {
        let body = r#"{"choices": [
            {"index": 0, "message": {"role": "assistant", "content": "first"}},
            {"index": 1, "message": {"role": "assistant", "content": "second"}}
        ]}"#;
        assert_eq!(parse_response(body).unwrap().text, "first");
    }

    #[test]
    fn test_parse_empty_choices_is_error() {
        let err = parse_response(r#"{"choices": []}"#).unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }
}
