//! Completion-backed chat and intent classification. Callers fall back to
//! `chat::rules` on any error returned here.

use serde::Deserialize;

use crate::chat::prompts::{ASSISTANT_SYSTEM, INTENT_PROMPT};
use crate::chat::rules::known_intents;
use crate::llm_client::prompts::{fill_template, JSON_ONLY_SYSTEM};
use crate::llm_client::{ChatMessage, LlmClient, LlmError};

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub intent: String,
    pub confidence: f32,
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    intent: String,
    confidence: Option<f32>,
}

/// Builds the conversation sent to the model: system prompt, prior turns, new message.
pub fn conversation(history: &[ChatMessage], message: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(ASSISTANT_SYSTEM));
    messages.extend(history.iter().filter(|m| m.role != "system").cloned());
    messages.push(ChatMessage::user(message));
    messages
}

pub async fn reply(
    llm: &LlmClient,
    history: &[ChatMessage],
    message: &str,
) -> Result<String, LlmError> {
    let response = llm.complete(&conversation(history, message)).await?;
    match response.text().map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(LlmError::EmptyContent),
    }
}

pub async fn classify(llm: &LlmClient, message: &str) -> Result<Classification, LlmError> {
    let intents: Vec<&str> = known_intents().collect();
    let prompt = fill_template(
        INTENT_PROMPT,
        &[("intents", &intents.join(", ")), ("message", message)],
    );
    let raw: RawClassification = llm.call_json(&prompt, JSON_ONLY_SYSTEM).await?;
    validate_classification(raw)
}

fn validate_classification(raw: RawClassification) -> Result<Classification, LlmError> {
    let intent = raw.intent.trim().to_lowercase();
    if !known_intents().any(|known| known == intent) {
        return Err(LlmError::Malformed(format!("unknown intent '{intent}'")));
    }
    let confidence = raw.confidence.unwrap_or(0.5);
    if !confidence.is_finite() {
        return Err(LlmError::Malformed("confidence is not a number".to_string()));
    }
    Ok(Classification {
        intent,
        confidence: confidence.clamp(0.0, 1.0),
    })
}
