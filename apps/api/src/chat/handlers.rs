use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::chat::assistant;
use crate::chat::rules;
use crate::chat::suggest::{rank, search_terms, Suggestion};
use crate::errors::AppError;
use crate::llm_client::ChatMessage;
use crate::opportunities::discovery::ListQuery;
use crate::opportunities::store as opportunity_store;
use crate::state::AppState;

const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySource {
    Llm,
    Rules,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: Option<Uuid>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub session_id: Uuid,
    pub reply: String,
    pub source: ReplySource,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Deserialize)]
pub struct IntentRequest {
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub intent: String,
    pub confidence: f32,
    pub source: ReplySource,
}

fn require_message(message: Option<String>) -> Result<String, AppError> {
    let message = message.map(|m| m.trim().to_string()).unwrap_or_default();
    if message.is_empty() {
        return Err(AppError::Validation("message is required".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "message must be at most {MAX_MESSAGE_CHARS} characters"
        )));
    }
    Ok(message)
}

/// POST /api/chat
/// Answers with the completion API when available, otherwise with the rule table.
pub async fn handle_chat(
    State(state): State<AppState>,
    _session: AuthSession,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError> {
    let Json(req) = payload?;
    let message = require_message(req.message)?;
    let session_id = req.session_id.unwrap_or_else(Uuid::new_v4);

    let history = state.chat_history.load(session_id).await.unwrap_or_else(|e| {
        warn!("Chat history unavailable for {session_id}: {e}");
        Vec::new()
    });

    let rule = rules::respond(&message);
    let (reply, source) = match assistant::reply(&state.llm, &history, &message).await {
        Ok(text) => (text, ReplySource::Llm),
        Err(e) => {
            warn!("Chat completion failed, answering from rules: {e}");
            (rule.response.to_string(), ReplySource::Rules)
        }
    };

    let opportunities = opportunity_store::list_opportunities(&state.db, &ListQuery::default()).await?;
    let suggestions = rank(
        &opportunities,
        &search_terms(&message, rule.keywords),
        rule.opportunity_type,
    );

    let turn = [ChatMessage::user(&message), ChatMessage::assistant(&reply)];
    if let Err(e) = state.chat_history.append(session_id, &turn).await {
        warn!("Failed to store chat history for {session_id}: {e}");
    }

    info!(
        "Chat reply for session {session_id} from {source:?} with {} suggestions",
        suggestions.len()
    );
    Ok(Json(ChatResponse {
        session_id,
        reply,
        source,
        suggestions,
    }))
}

/// POST /api/chat/intent
pub async fn handle_intent(
    State(state): State<AppState>,
    _session: AuthSession,
    payload: Result<Json<IntentRequest>, JsonRejection>,
) -> Result<Json<IntentResponse>, AppError> {
    let Json(req) = payload?;
    let message = require_message(req.message)?;

    let response = match assistant::classify(&state.llm, &message).await {
        Ok(c) => IntentResponse {
            intent: c.intent,
            confidence: c.confidence,
            source: ReplySource::Llm,
        },
        Err(e) => {
            warn!("Intent classification failed, using rules: {e}");
            let rule = rules::respond(&message);
            IntentResponse {
                intent: rule.intent.to_string(),
                confidence: rule.confidence,
                source: ReplySource::Rules,
            }
        }
    };
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_message() {
        assert_eq!(require_message(Some("  hi  ".into())).unwrap(), "hi");
        assert!(matches!(require_message(None), Err(AppError::Validation(_))));
        assert!(matches!(
            require_message(Some("   ".into())),
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            require_message(Some("x".repeat(MAX_MESSAGE_CHARS + 1))),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_source_serializes_lowercase() {
        assert_eq!(serde_json::to_value(ReplySource::Llm).unwrap(), "llm");
        assert_eq!(serde_json::to_value(ReplySource::Rules).unwrap(), "rules");
    }
}
