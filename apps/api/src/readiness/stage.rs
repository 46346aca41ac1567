//! Readiness assessment state machine.
//!
//! The stage is derived from the stored score fields; every write goes through one of
//! the `record_*` transitions below, which refuse out-of-order or repeated stages.
//! Stages only move forward.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::assessment::{AssessmentStatus, ReadinessAssessment};
use crate::readiness::evaluator::Evaluation;

/// Minimum final score for a passing assessment.
pub const PASSING_SCORE: i32 = 70;

/// Eligibility scoring that has not landed after this long is started again.
pub const ELIGIBILITY_STALE_AFTER_SECS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Eligibility,
    Application,
    Interview,
    Results,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    ScoreEligibility,
    SubmitMockApplication,
    SubmitMockInterview,
}

impl Transition {
    /// The stage a record must be in for this transition to apply.
    pub fn from_stage(self) -> Stage {
        match self {
            Transition::ScoreEligibility => Stage::Eligibility,
            Transition::SubmitMockApplication => Stage::Application,
            Transition::SubmitMockInterview => Stage::Interview,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Transition::ScoreEligibility => "eligibility scoring",
            Transition::SubmitMockApplication => "mock application",
            Transition::SubmitMockInterview => "mock interview",
        }
    }
}

/// Derives the workflow stage from the stored fields.
pub fn stage_of(eligibility_scored: bool, application_done: bool, interview_done: bool) -> Stage {
    match (eligibility_scored, application_done, interview_done) {
        (false, _, _) => Stage::Eligibility,
        (true, false, _) => Stage::Application,
        (true, true, false) => Stage::Interview,
        (true, true, true) => Stage::Results,
    }
}

pub fn current_stage(assessment: &ReadinessAssessment) -> Stage {
    stage_of(
        assessment.eligibility_score.is_some(),
        assessment.mock_application_completed,
        assessment.mock_interview_completed,
    )
}

pub fn ensure_transition(stage: Stage, transition: Transition) -> Result<(), AppError> {
    if stage == transition.from_stage() {
        return Ok(());
    }
    let detail = match stage {
        Stage::Eligibility => "eligibility scoring has not finished yet",
        Stage::Application => "the mock application has not been submitted yet",
        Stage::Interview => "the mock application was already submitted",
        Stage::Results => "the assessment is already complete",
    };
    Err(AppError::Conflict(format!(
        "Cannot accept {}: {detail}",
        transition.label()
    )))
}

/// Final score is the rounded mean of the two mock stages; pass at `PASSING_SCORE`.
pub fn final_outcome(application_score: i32, interview_score: i32) -> (i32, AssessmentStatus) {
    let final_score = ((application_score + interview_score) as f64 / 2.0).round() as i32;
    let status = if final_score >= PASSING_SCORE {
        AssessmentStatus::Completed
    } else {
        AssessmentStatus::Failed
    };
    (final_score, status)
}

pub fn record_eligibility(
    assessment: &mut ReadinessAssessment,
    evaluation: Evaluation,
) -> Result<(), AppError> {
    ensure_transition(current_stage(assessment), Transition::ScoreEligibility)?;
    assessment.eligibility_score = Some(evaluation.score);
    assessment.eligibility_feedback = Some(evaluation.feedback);
    Ok(())
}

pub fn record_mock_application(
    assessment: &mut ReadinessAssessment,
    evaluation: Evaluation,
) -> Result<(), AppError> {
    ensure_transition(current_stage(assessment), Transition::SubmitMockApplication)?;
    assessment.mock_application_score = Some(evaluation.score);
    assessment.mock_application_feedback = Some(evaluation.feedback);
    assessment.mock_application_completed = true;
    Ok(())
}

/// Records the interview and, since it is the last input, finalizes the record.
pub fn record_mock_interview(
    assessment: &mut ReadinessAssessment,
    evaluation: Evaluation,
    recommended_training: Vec<String>,
) -> Result<(), AppError> {
    ensure_transition(current_stage(assessment), Transition::SubmitMockInterview)?;
    let application_score = assessment.mock_application_score.ok_or_else(|| {
        AppError::Internal(anyhow::anyhow!(
            "assessment {} completed its mock application without a score",
            assessment.id
        ))
    })?;

    let (final_score, status) = final_outcome(application_score, evaluation.score);
    assessment.mock_interview_score = Some(evaluation.score);
    assessment.mock_interview_feedback = Some(evaluation.feedback);
    assessment.mock_interview_completed = true;
    assessment.final_readiness_score = Some(final_score);
    assessment.status = status;
    assessment.recommended_training = recommended_training;
    Ok(())
}

/// Whether background eligibility scoring should be started (again).
pub fn eligibility_stalled(assessment: &ReadinessAssessment, now: DateTime<Utc>) -> bool {
    assessment.eligibility_score.is_none()
        && now - assessment.updated_at > Duration::seconds(ELIGIBILITY_STALE_AFTER_SECS)
}
