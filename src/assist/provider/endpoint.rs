//! Generic JSON generation endpoint
//!
//! Posts `{"prompt": ...}` and expects `{"text": ..., "confidence": ...}`,
//! the shape a CMS backend typically exposes in front of its model provider.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use super::{GenerationError, Generated, send_with_cancel};
use crate::assist::credential::Credential;

const PROVIDER: &str = "Endpoint";

#[derive(Debug, Clone)]
pub struct EndpointClient {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct RequestBody<'a> {
    prompt: &'a str,
}

#[derive(Deserialize)]
struct ResponseBody {
    text: String,
    #[serde(default)]
    confidence: Option<f32>,
}

impl EndpointClient {
    pub fn new(url: String) -> Self {
        Self {
            client: Client::new(),
            url,
        }
    }

    pub async fn generate(
        &self,
        prompt: &str,
        credential: Option<&Credential>,
        cancel_token: CancellationToken,
    ) -> Result<Generated, GenerationError> {
        let mut request = self.client.post(&self.url).json(&RequestBody { prompt });
        if let Some(credential) = credential {
            request = request.bearer_auth(credential.token());
        }

        let response = send_with_cancel(PROVIDER, request, &cancel_token).await?;
        parse_response(&response)
    }
}

fn parse_response(body: &str) -> Result<Generated, GenerationError> {
    let parsed: ResponseBody = serde_json::from_str(body).map_err(|e| GenerationError::Parse {
        provider: PROVIDER.to_string(),
        message: e.to_string(),
    })?;

    Ok(Generated {
        text: parsed.text,
        confidence: parsed.confidence.map(|c| c.clamp(0.0, 1.0)),
    })
}
