use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::run::ChatCompletion;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Chat completion request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Chat completion API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Chat completion returned no choices")]
    EmptyResponse,
}

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Low sampling temperature to favor deterministic, terse review output.
const TEMPERATURE: f32 = 0.3;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    content: String,
}

/// Client for the OpenAI chat-completion endpoint. One system/user exchange
/// per call, bounded output tokens, no retry.
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, max_tokens: u32) -> Self {
        OpenAiClient {
            http: reqwest::Client::new(),
            api_key,
            model,
            max_tokens,
            url: OPENAI_URL.to_string(),
        }
    }

    fn build_request(&self, system: &str, user: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            max_tokens: self.max_tokens,
            temperature: TEMPERATURE,
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError> {
        debug!(model = %self.model, prompt_bytes = user.len(), "sending chat completion request");
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&self.build_request(system, user))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(ModelError::EmptyResponse)?;
        debug!(reply_bytes = content.len(), "received chat completion");
        Ok(content)
    }
}
