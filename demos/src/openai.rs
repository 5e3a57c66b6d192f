//! A `ChatEndpoint` for OpenAI-compatible `/chat/completions` APIs.

use async_trait::async_trait;
use fnclient::{ChatEndpoint, ChatRequest, ChatResponse, Message, RemoteError};
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiEndpoint {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize)]
struct Completion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: Message,
}

impl OpenAiEndpoint {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
        }
    }

    /// Reads `OPENAI_API_KEY` and, optionally, `OPENAI_BASE_URL`.
    pub fn from_env() -> Result<Self, std::env::VarError> {
        let api_key = std::env::var("OPENAI_API_KEY")?;
        let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        Ok(Self::with_base_url(base_url, api_key))
    }
}

#[async_trait]
impl ChatEndpoint for OpenAiEndpoint {
    async fn send_chat(&self, request: ChatRequest) -> Result<ChatResponse, RemoteError> {
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        let completion: Completion = serde_json::from_slice(&bytes)
            .map_err(|e| RemoteError::InvalidResponse(e.to_string()))?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| ChatResponse::from(choice.message))
            .ok_or_else(|| RemoteError::InvalidResponse("response has no choices".into()))
    }
}
