//! Minimal OpenAI-compatible client: the evaluation service boundary.
//!
//! We only call chat.completions and request a strict JSON object back.
//! Calls are instrumented and log model names, latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short to avoid PII leaks.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use crate::error::LlmError;
use crate::util::trunc_for_log;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  System,
  User,
}

/// One role-tagged prompt message.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ChatMessage {
  pub role: Role,
  pub content: String,
}

impl ChatMessage {
  pub fn system(content: impl Into<String>) -> Self { Self { role: Role::System, content: content.into() } }
  pub fn user(content: impl Into<String>) -> Self { Self { role: Role::User, content: content.into() } }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GenerationOptions {
  pub temperature: f32,
  pub max_tokens: u32,
}

/// Anything that turns role-tagged prompts into a parsed JSON reply.
#[async_trait]
pub trait TextGenerator: Send + Sync {
  async fn generate_json(&self, messages: &[ChatMessage], options: GenerationOptions) -> Result<Value, LlmError>;

  /// Model name for logs.
  fn model(&self) -> &str;
}

#[derive(Clone)]
pub struct OpenAI {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub model: String,
}

impl OpenAI {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url =
      std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o".into());

    // No timeout unless asked for: a slow call just keeps the caller waiting.
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = std::env::var("OPENAI_TIMEOUT_SECS").ok().and_then(|s| s.parse::<u64>().ok()) {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    let client = match builder.build() {
      Ok(c) => c,
      Err(e) => {
        error!(target: "course_wizard", error = %e, "Failed to build HTTP client; OpenAI disabled");
        return None;
      }
    };

    Some(Self { client, api_key, base_url: base_url.trim_end_matches('/').to_string(), model })
  }
}

#[async_trait]
impl TextGenerator for OpenAI {
  /// JSON-object chat completion. The reply text must itself be a JSON document.
  #[instrument(level = "info", skip(self, messages), fields(model = %self.model, messages = messages.len(), max_tokens = options.max_tokens))]
  async fn generate_json(&self, messages: &[ChatMessage], options: GenerationOptions) -> Result<Value, LlmError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: &self.model,
      messages,
      temperature: options.temperature,
      response_format: Some(ResponseFormat { r#type: "json_object" }),
      max_tokens: Some(options.max_tokens),
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "course-wizard-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or_else(|| trunc_for_log(&body, 200));
      error!(elapsed = ?start.elapsed(), %status, "OpenAI call failed");
      return Err(LlmError::Upstream { status: status.as_u16(), message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    if let Some(usage) = &body.usage {
      info!(prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    }
    let choice = body.choices.into_iter().next();
    if let Some(reason) = choice.as_ref().and_then(|c| c.finish_reason.as_deref()) {
      if reason == "length" {
        warn!("OpenAI reply hit the token cap; JSON is likely truncated");
      }
    }
    let text = choice.and_then(|c| c.message.content).unwrap_or_default();
    info!(elapsed = ?start.elapsed(), reply_len = text.len(), "OpenAI reply received");

    parse_json_reply(&text)
  }

  fn model(&self) -> &str { &self.model }
}

/// Parse the model's reply text as one JSON document.
pub fn parse_json_reply(text: &str) -> Result<Value, LlmError> {
  let trimmed = text.trim();
  if trimmed.is_empty() {
    return Err(LlmError::MalformedResponse("empty reply".into()));
  }
  serde_json::from_str::<Value>(trimmed).map_err(|e| {
    warn!(preview = %trunc_for_log(trimmed, 120), "Reply is not valid JSON");
    LlmError::MalformedResponse(format!("JSON parse error: {}", e))
  })
}

// --- Chat DTOs ---

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
  model: &'a str,
  messages: &'a [ChatMessage],
  temperature: f32,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_format: Option<ResponseFormat>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_tokens: Option<u32>,
}
#[derive(Serialize)]
struct ResponseFormat { #[serde(rename = "type")] r#type: &'static str }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice {
  message: ChatMessageResp,
  #[serde(default)] finish_reason: Option<String>,
}
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
