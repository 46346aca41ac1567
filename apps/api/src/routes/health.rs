use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health
/// Returns service status, version and whether the LLM-backed paths are enabled.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": "astra-api",
        "llmConfigured": state.llm.is_configured(),
        "firebaseProject": state.config.firebase_project_id,
    }))
}
