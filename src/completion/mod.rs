use crate::conversation::Message;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionPayload {
    pub model: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("completion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("completion response was not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The body parsed but `choices[0].message.content` was absent or blank.
    #[error("completion response carried no reply text")]
    MissingReply,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, payload: &CompletionPayload) -> Result<String, CompletionError>;
}

/// Posts the transcript to a chat-completions style endpoint.
#[derive(Debug, Clone)]
pub struct HttpCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpCompletionClient {
    pub fn new(http: reqwest::Client, endpoint: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http,
            endpoint: endpoint.into(),
            timeout,
        }
    }
}

#[async_trait]
impl CompletionClient for HttpCompletionClient {
    async fn complete(&self, payload: &CompletionPayload) -> Result<String, CompletionError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            messages = payload.messages.len(),
            max_tokens = payload.max_tokens,
            "sending completion request"
        );
        let body = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(payload)
            .send()
            .await?
            .bytes()
            .await?;

        let value: Value = serde_json::from_slice(&body)?;
        extract_reply(&value)
    }
}

/// Pulls `choices[0].message.content`, trimmed. Blank text counts as missing.
pub fn extract_reply(response: &Value) -> Result<String, CompletionError> {
    let content = response
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str)
        .map(str::trim)
        .ok_or(CompletionError::MissingReply)?;

    if content.is_empty() {
        return Err(CompletionError::MissingReply);
    }
    Ok(content.to_string())
}
