//! Request authentication. Handlers receive an explicit `AuthSession` value;
//! there is no ambient "current user".

pub mod firebase;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::auth::firebase::AuthError;
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;
use crate::users::store::get_or_create_user;

/// The authenticated caller for one request, with their user record.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
}

impl AuthSession {
    pub fn uid(&self) -> &str {
        &self.user.id
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedHeader)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let token = bearer_token(header).map_err(|e| {
            warn!("Rejected request: {e}");
            AppError::Unauthorized(e.to_string())
        })?;

        let claims = state.firebase.verify(token).await.map_err(|e| {
            warn!("Token verification failed: {e}");
            AppError::Unauthorized("Token verification failed".to_string())
        })?;

        let email = claims.email.unwrap_or_default();
        let user = get_or_create_user(&state.db, &claims.sub, &email).await?;

        Ok(AuthSession { user })
    }
}
