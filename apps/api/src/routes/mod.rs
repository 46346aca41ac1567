pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::state::AppState;
use crate::{applications, chat, opportunities, readiness, users};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Identity
        .route("/api/users/me", get(users::handlers::handle_get_me))
        .route(
            "/api/users/me/role",
            put(users::handlers::handle_switch_role),
        )
        .route("/api/users/me/kyc", post(users::handlers::handle_submit_kyc))
        // Opportunities
        .route(
            "/api/opportunities",
            get(opportunities::handlers::handle_list).post(opportunities::handlers::handle_create),
        )
        .route(
            "/api/opportunities/:id",
            get(opportunities::handlers::handle_get)
                .put(opportunities::handlers::handle_update)
                .delete(opportunities::handlers::handle_delete),
        )
        // Applications
        .route(
            "/api/applications",
            get(applications::handlers::handle_list).post(applications::handlers::handle_apply),
        )
        .route(
            "/api/applications/:id",
            get(applications::handlers::handle_get)
                .put(applications::handlers::handle_update)
                .delete(applications::handlers::handle_withdraw),
        )
        // Readiness assessment
        .route(
            "/api/readiness-assessment",
            get(readiness::handlers::handle_get_for_opportunity)
                .post(readiness::handlers::handle_create),
        )
        .route(
            "/api/readiness-assessment/mock-application",
            post(readiness::handlers::handle_mock_application),
        )
        .route(
            "/api/readiness-assessment/mock-interview",
            post(readiness::handlers::handle_mock_interview),
        )
        .route(
            "/api/readiness-assessment/:id",
            get(readiness::handlers::handle_get),
        )
        .route(
            "/api/readiness-assessment/:id/interview-questions",
            get(readiness::handlers::handle_interview_questions),
        )
        // Assistants
        .route("/api/chat", post(chat::handlers::handle_chat))
        .route("/api/chat/intent", post(chat::handlers::handle_intent))
        .with_state(state)
}
