use std::collections::BTreeMap;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::applications::access::{
    authorize_update, ensure_not_own_opportunity, party_for, ApplicationUpdate,
    Party,
};
use crate::applications::store::{self, ApplyOutcome};
use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::models::application::Application;
use crate::models::opportunity::Opportunity;
use crate::opportunities::fields::validate_responses;
use crate::opportunities::store::get_opportunity;
use crate::opportunities::validation::ensure_owner;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListQuery {
    pub opportunity_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyRequest {
    pub opportunity_id: Option<Uuid>,
    #[serde(default)]
    pub responses: BTreeMap<String, String>,
}

async fn load_opportunity(state: &AppState, id: Uuid) -> Result<Opportunity, AppError> {
    get_opportunity(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Opportunity {id} not found")))
}

/// Loads an application and the caller's relationship to it.
async fn load_with_party(
    state: &AppState,
    id: Uuid,
    caller_id: &str,
) -> Result<(Application, Party), AppError> {
    let application = store::get_application(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;
    let opportunity = load_opportunity(state, application.opportunity_id).await?;
    let party = party_for(&application, &opportunity.user_id, caller_id)?;
    Ok((application, party))
}

/// GET /api/applications
pub async fn handle_list(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<ApplicationListQuery>,
) -> Result<Json<Vec<Application>>, AppError> {
    let rows = match query.opportunity_id {
        Some(opportunity_id) => {
            let opportunity = load_opportunity(&state, opportunity_id).await?;
            ensure_owner(&opportunity.user_id, session.uid())?;
            store::list_for_opportunity(&state.db, opportunity_id).await?
        }
        None => store::list_for_applicant(&state.db, session.uid()).await?,
    };
    Ok(Json(rows))
}

/// POST /api/applications
///
/// Idempotent per (opportunity, applicant): a repeat returns the original with 200.
pub async fn handle_apply(
    State(state): State<AppState>,
    session: AuthSession,
    payload: Result<Json<ApplyRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Application>), AppError> {
    let Json(req) = payload?;
    let opportunity_id = req
        .opportunity_id
        .ok_or_else(|| AppError::Validation("opportunityId is required".to_string()))?;

    let opportunity = load_opportunity(&state, opportunity_id).await?;
    ensure_not_own_opportunity(&opportunity.user_id, session.uid())?;
    let responses = validate_responses(&opportunity.custom_fields, &req.responses)?;

    match store::apply(&state.db, opportunity_id, session.uid(), responses).await? {
        ApplyOutcome::Created(application) => Ok((StatusCode::CREATED, Json(application))),
        ApplyOutcome::Existing(application) => Ok((StatusCode::OK, Json(application))),
    }
}

/// GET /api/applications/:id
pub async fn handle_get(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Application>, AppError> {
    let (application, _) = load_with_party(&state, id, session.uid()).await?;
    Ok(Json(application))
}

/// PUT /api/applications/:id
pub async fn handle_update(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
    payload: Result<Json<ApplicationUpdate>, JsonRejection>,
) -> Result<Json<Application>, AppError> {
    let Json(update) = payload?;
    let (application, party) = load_with_party(&state, id, session.uid()).await?;
    authorize_update(party, &update)?;

    let updated = store::update_application(&state.db, &application, &update).await?;
    Ok(Json(updated))
}

/// DELETE /api/applications/:id (applicant withdraws)
pub async fn handle_withdraw(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let (_, party) = load_with_party(&state, id, session.uid()).await?;
    if party != Party::Applicant {
        return Err(AppError::Forbidden(
            "Only the applicant can withdraw an application".to_string(),
        ));
    }
    if !store::delete_application(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Application {id} not found")));
    }
    Ok(Json(json!({ "id": id, "deleted": true })))
}
