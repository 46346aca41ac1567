use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "text", rename_all = "snake_case")]
pub enum AssessmentStatus {
    InProgress,
    Completed,
    Failed,
}

impl AssessmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentStatus::InProgress => "in_progress",
            AssessmentStatus::Completed => "completed",
            AssessmentStatus::Failed => "failed",
        }
    }
}

/// Stored readiness assessment. The workflow stage is derived from these fields,
/// see `readiness::stage`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessAssessment {
    pub id: Uuid,
    pub applicant_id: String,
    pub opportunity_id: Uuid,
    pub status: AssessmentStatus,
    pub eligibility_score: Option<i32>,
    pub eligibility_feedback: Option<String>,
    pub mock_application_completed: bool,
    pub mock_application_score: Option<i32>,
    pub mock_application_feedback: Option<String>,
    pub mock_interview_completed: bool,
    pub mock_interview_score: Option<i32>,
    pub mock_interview_feedback: Option<String>,
    pub final_readiness_score: Option<i32>,
    pub recommended_training: Vec<String>,
    /// Bumped on every write; writers compare-and-set on it.
    pub revision: i32,
    #[serde(with = "crate::models::timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "crate::models::timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
impl ReadinessAssessment {
    /// Fresh record as created by create-or-fetch, for unit tests.
    pub fn fresh(applicant_id: &str, opportunity_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            applicant_id: applicant_id.to_string(),
            opportunity_id,
            status: AssessmentStatus::InProgress,
            eligibility_score: None,
            eligibility_feedback: None,
            mock_application_completed: false,
            mock_application_score: None,
            mock_application_feedback: None,
            mock_interview_completed: false,
            mock_interview_score: None,
            mock_interview_feedback: None,
            final_readiness_score: None,
            recommended_training: Vec::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }
}
