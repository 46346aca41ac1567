use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;

use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::models::user::{Role, User};
use crate::state::AppState;
use crate::users::store;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRoleRequest {
    pub active_role: Role,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KycRequest {
    pub organization_name: Option<String>,
    pub organization_type: Option<String>,
}

/// GET /api/users/me
pub async fn handle_get_me(session: AuthSession) -> Json<User> {
    Json(session.user)
}

/// PUT /api/users/me/role
pub async fn handle_switch_role(
    State(state): State<AppState>,
    session: AuthSession,
    payload: Result<Json<SwitchRoleRequest>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Json(req) = payload?;
    let user = store::set_active_role(&state.db, session.uid(), req.active_role).await?;
    Ok(Json(user))
}

/// POST /api/users/me/kyc
pub async fn handle_submit_kyc(
    State(state): State<AppState>,
    session: AuthSession,
    payload: Result<Json<KycRequest>, JsonRejection>,
) -> Result<Json<User>, AppError> {
    let Json(req) = payload?;
    let (name, kind) = validate_kyc(&req)?;
    let user = store::submit_kyc(&state.db, session.uid(), name, kind).await?;
    Ok(Json(user))
}

fn validate_kyc(req: &KycRequest) -> Result<(&str, &str), AppError> {
    let name = req
        .organization_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("organizationName is required".to_string()))?;
    let kind = req
        .organization_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("organizationType is required".to_string()))?;
    Ok((name, kind))
}
