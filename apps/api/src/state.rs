use sqlx::PgPool;

use crate::auth::firebase::FirebaseVerifier;
use crate::chat::history::ChatHistory;
use crate::config::Config;
use crate::llm_client::LlmClient;
use crate::readiness::evaluator::ResilientEvaluator;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub llm: LlmClient,
    pub config: Config,
    pub firebase: FirebaseVerifier,
    /// Readiness scorer. Never fails: falls back to default scores on LLM errors.
    pub evaluator: ResilientEvaluator,
    /// Redis-backed chat transcripts, keyed by session id.
    pub chat_history: ChatHistory,
}
