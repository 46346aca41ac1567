use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Reviewing,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Pending => "pending",
            ApplicationStatus::Reviewing => "reviewing",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
    pub opportunity_id: Uuid,
    pub applicant_id: String,
    pub status: ApplicationStatus,
    pub current_stage: Option<String>,
    pub notes: Option<String>,
    pub feedback: Option<String>,
    /// Answers to the opportunity's custom fields, keyed by field id.
    pub responses: Json<BTreeMap<String, String>>,
    pub is_qualified: bool,
    pub in_interview_queue: bool,
    pub queue_position: Option<i32>,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
}
