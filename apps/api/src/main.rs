mod applications;
mod auth;
mod chat;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod opportunities;
mod readiness;
mod routes;
mod state;
mod users;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::firebase::FirebaseVerifier;
use crate::chat::history::ChatHistory;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::readiness::evaluator::{LlmEvaluator, ResilientEvaluator};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Astra API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL (runs migrations)
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let chat_history = ChatHistory::new(redis, config.chat_history_ttl_secs);
    info!("Redis client initialized");

    // Initialize LLM client
    let llm = LlmClient::new(
        config.openai_api_key.clone(),
        Duration::from_secs(config.llm_timeout_secs),
    )?;
    if llm.is_configured() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
    } else {
        warn!("OPENAI_API_KEY not set; assessments and chat run on fallbacks only");
    }

    // Firebase signing keys
    let firebase = FirebaseVerifier::new(config.firebase_project_id.clone());
    firebase.warm_up().await;

    let evaluator = ResilientEvaluator::new(
        Arc::new(LlmEvaluator(llm.clone())),
        Duration::from_secs(config.llm_timeout_secs),
    );

    let state = AppState {
        db,
        llm,
        config: config.clone(),
        firebase,
        evaluator,
        chat_history,
    };

    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()), // TODO: restrict origins once the web client's domain is fixed
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
