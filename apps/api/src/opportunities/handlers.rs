use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::models::opportunity::Opportunity;
use crate::opportunities::discovery::{arrange, ListQuery};
use crate::opportunities::store;
use crate::opportunities::validation::{apply_update, ensure_owner, validate_new, OpportunityInput};
use crate::state::AppState;

async fn load(state: &AppState, id: Uuid) -> Result<Opportunity, AppError> {
    store::get_opportunity(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Opportunity {id} not found")))
}

/// GET /api/opportunities
pub async fn handle_list(
    State(state): State<AppState>,
    _session: AuthSession,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Opportunity>>, AppError> {
    let rows = store::list_opportunities(&state.db, &query).await?;
    let rows = arrange(rows, &query, &mut rand::thread_rng());
    Ok(Json(rows))
}

/// POST /api/opportunities
pub async fn handle_create(
    State(state): State<AppState>,
    session: AuthSession,
    payload: Result<Json<OpportunityInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Opportunity>), AppError> {
    let Json(input) = payload?;
    let fields = validate_new(input, &session.user)?;
    let opportunity = store::insert_opportunity(&state.db, session.uid(), &fields).await?;
    Ok((StatusCode::CREATED, Json(opportunity)))
}

/// GET /api/opportunities/:id
pub async fn handle_get(
    State(state): State<AppState>,
    _session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Opportunity>, AppError> {
    Ok(Json(load(&state, id).await?))
}

/// PUT /api/opportunities/:id
pub async fn handle_update(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
    payload: Result<Json<OpportunityInput>, JsonRejection>,
) -> Result<Json<Opportunity>, AppError> {
    let Json(input) = payload?;
    let existing = load(&state, id).await?;
    ensure_owner(&existing.user_id, session.uid())?;

    let fields = apply_update(&existing, input, &session.user)?;
    let updated = store::update_opportunity(&state.db, id, &fields).await?;
    Ok(Json(updated))
}

/// DELETE /api/opportunities/:id
pub async fn handle_delete(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let existing = load(&state, id).await?;
    ensure_owner(&existing.user_id, session.uid())?;

    if !store::delete_opportunity(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Opportunity {id} not found")));
    }
    tracing::info!("Opportunity {id} deleted by {}", session.uid());
    Ok(Json(json!({ "id": id, "deleted": true })))
}
