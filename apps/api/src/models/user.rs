use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The side of the marketplace a user acts as. Also used as an opportunity's `creatorType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum Role {
    Individual,
    Organization,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Individual => "individual",
            Role::Organization => "organization",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Firebase uid.
    pub id: String,
    pub email: String,
    pub role: Role,
    pub active_role: Role,
    pub kyc_verified: bool,
    pub kyc_submitted: bool,
    pub organization_name: Option<String>,
    pub organization_type: Option<String>,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
}
