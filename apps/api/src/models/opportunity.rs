use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::user::Role;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum OpportunityType {
    Job,
    Grant,
    Scholarship,
}

impl OpportunityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OpportunityType::Job => "job",
            OpportunityType::Grant => "grant",
            OpportunityType::Scholarship => "scholarship",
        }
    }
}

/// Input type of an owner-defined application form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Textarea,
    Number,
    Date,
    Url,
    Select { options: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Opportunity {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub provider: String,
    pub creator_type: Role,
    #[serde(rename = "type")]
    pub opportunity_type: OpportunityType,
    pub tags: Vec<String>,
    pub deadline: Option<String>,
    pub location: Option<String>,
    pub eligibility: Option<String>,
    pub funding: Option<String>,
    pub url: Option<String>,
    pub custom_fields: Json<Vec<CustomField>>,
    /// Owner uid. Never changes after creation.
    pub user_id: String,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
}
