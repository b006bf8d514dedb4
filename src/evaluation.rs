//! Evaluation client: one request/response exchange with the evaluation service.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::LlmError;
use crate::normalize::criteria_list;
use crate::openai::{ChatMessage, GenerationOptions, TextGenerator};
use crate::prompts::PromptPair;

/// Low temperature and a bounded reply keep the evaluator on-schema.
pub const EVALUATION_OPTIONS: GenerationOptions = GenerationOptions { temperature: 0.3, max_tokens: 2000 };

/// Send the prompt pair and return the parsed reply.
///
/// No retry, no streaming. Fails with `MalformedResponse` when the reply is not
/// JSON or lacks the criteria list.
#[instrument(level = "info", skip_all, fields(model = %generator.model(), system_len = prompts.system.len(), user_len = prompts.user.len()))]
pub async fn evaluate(generator: &dyn TextGenerator, prompts: &PromptPair) -> Result<Value, LlmError> {
  let messages = [ChatMessage::system(prompts.system.as_str()), ChatMessage::user(prompts.user.as_str())];
  let reply = generator.generate_json(&messages, EVALUATION_OPTIONS).await?;
  let criteria = criteria_list(&reply)?.len();
  debug!(target: "checkpoint", criteria, "Evaluation reply received");
  Ok(reply)
}
