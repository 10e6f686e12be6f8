//! Summary prompt construction and the completion collaborator

use crate::error::CompressError;
use async_trait::async_trait;
use condenser_core::{CompletionConfig, Message};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Per-message character cap inside the summary transcript
pub const TRANSCRIPT_MESSAGE_CHARS: usize = 500;

const SUMMARY_INSTRUCTIONS: &str = "\
You are compressing the middle of a long conversation so it can continue \
within a limited context window. Write a summary that replaces the messages \
below.

Requirements:
- Keep it structured and dense. Remove greetings, repetition and filler.
- Preserve every decision, open question, constraint and user preference.
- Keep the details and reasoning of multi-turn exchanges, not just their outcome.
- Write in the same language as the conversation.
- Copy code, commands, file paths, identifiers and parameter values verbatim.
- Do not add commentary about the summary itself.
- Stay under {max_tokens} tokens.

Suggested sections: Goals, Key facts and decisions, Code and commands, \
Open items.";

/// Identity of the end user, forwarded to the completion endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

/// Render messages as `[i] Role: text` blocks separated by blank lines
pub fn format_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .enumerate()
        .map(|(i, message)| {
            let text = message.joined_text(" ");
            format!(
                "[{}] {}: {}",
                i + 1,
                message.role.label(),
                truncate_chars(&text, TRANSCRIPT_MESSAGE_CHARS)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

pub fn build_summary_prompt(messages: &[Message], max_summary_tokens: u32) -> String {
    format!(
        "{}\n\n--- Conversation ---\n\n{}",
        SUMMARY_INSTRUCTIONS.replace("{max_tokens}", &max_summary_tokens.to_string()),
        format_transcript(messages)
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Non-streaming text completion
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(
        &self,
        request: &CompletionRequest,
        user: Option<&UserInfo>,
    ) -> Result<String, CompressError>;
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint
#[derive(Debug, Clone)]
pub struct OpenAiCompatClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiCompatClient {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, CompressError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        })
    }

    /// Build from config, reading the key from `api_key_env` when set
    pub fn from_config(config: &CompletionConfig) -> Result<Self, CompressError> {
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.trim().is_empty());
        Self::new(
            &config.base_url,
            api_key,
            Duration::from_secs(config.timeout_secs),
        )
    }

    fn request_body(request: &CompletionRequest, user: Option<&UserInfo>) -> Value {
        let mut body = json!({
            "model": request.model,
            "messages": [{ "role": "user", "content": request.prompt }],
            "stream": false,
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });
        if let Some(user) = user.filter(|u| !u.id.is_empty()) {
            body["user"] = Value::String(user.id.clone());
        }
        body
    }
}

#[async_trait]
impl CompletionClient for OpenAiCompatClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
        user: Option<&UserInfo>,
    ) -> Result<String, CompressError> {
        tracing::debug!(
            model = %request.model,
            prompt_chars = request.prompt.len(),
            max_tokens = request.max_tokens,
            "sending summary request"
        );

        let mut builder = self
            .client
            .post(&self.endpoint)
            .json(&Self::request_body(request, user));
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CompressError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|_| CompressError::MalformedResponse)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or(CompressError::MalformedResponse)?;

        Ok(content.trim().to_string())
    }
}
