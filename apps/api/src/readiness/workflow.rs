//! Readiness workflow. Orchestrates evaluation and persistence for each stage.
//!
//! Flow per submission: check the stage → evaluate (never fails) → apply the
//! transition to a copy → compare-and-set write on `revision`.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::assessment::ReadinessAssessment;
use crate::models::opportunity::Opportunity;
use crate::readiness::evaluator::{
    InterviewExchange, MockApplicationAnswers, OpportunityBrief, ResilientEvaluator,
    DEFAULT_INTERVIEW_QUESTIONS, INTERVIEW_QUESTION_COUNT,
};
use crate::readiness::stage::{
    current_stage, eligibility_stalled, ensure_transition, record_eligibility,
    record_mock_application, record_mock_interview, Stage, Transition,
    ELIGIBILITY_STALE_AFTER_SECS, PASSING_SCORE,
};
use crate::readiness::store;

/// An assessment as returned to clients, with its derived stage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentView {
    #[serde(flatten)]
    pub assessment: ReadinessAssessment,
    pub stage: Stage,
    /// Set once a final score exists.
    pub passed: Option<bool>,
}

impl From<ReadinessAssessment> for AssessmentView {
    fn from(assessment: ReadinessAssessment) -> Self {
        let stage = current_stage(&assessment);
        let passed = assessment
            .final_readiness_score
            .map(|score| score >= PASSING_SCORE);
        Self {
            assessment,
            stage,
            passed,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockInterviewSubmission {
    pub answers: Vec<String>,
    /// The questions that were shown; the default set when absent.
    pub questions: Option<Vec<String>>,
}

/// Returns the caller's assessment for an opportunity, creating it on first visit.
/// Creation starts eligibility scoring in the background.
pub async fn create_or_fetch(
    pool: &PgPool,
    evaluator: &ResilientEvaluator,
    opportunity: &Opportunity,
    applicant_id: &str,
    profile: Option<String>,
) -> Result<(ReadinessAssessment, bool), AppError> {
    let (assessment, created) = store::create_or_fetch(pool, applicant_id, opportunity.id).await?;
    let profile = profile.unwrap_or_default();

    if created {
        spawn_eligibility_scoring(pool, evaluator, opportunity, &assessment, profile);
    } else {
        resume_stalled_eligibility(pool, evaluator, opportunity, &assessment, profile).await?;
    }
    Ok((assessment, created))
}

/// Restarts eligibility scoring for a record whose background run never landed.
pub async fn resume_stalled_eligibility(
    pool: &PgPool,
    evaluator: &ResilientEvaluator,
    opportunity: &Opportunity,
    assessment: &ReadinessAssessment,
    profile: String,
) -> Result<(), AppError> {
    if !eligibility_stalled(assessment, Utc::now()) {
        return Ok(());
    }
    let claimed = store::touch_pending_eligibility(
        pool,
        assessment.id,
        assessment.revision,
        ELIGIBILITY_STALE_AFTER_SECS,
    )
    .await?;
    if claimed {
        warn!("Eligibility scoring for assessment {} stalled; restarting", assessment.id);
        spawn_eligibility_scoring(pool, evaluator, opportunity, assessment, profile);
    }
    Ok(())
}

fn spawn_eligibility_scoring(
    pool: &PgPool,
    evaluator: &ResilientEvaluator,
    opportunity: &Opportunity,
    assessment: &ReadinessAssessment,
    profile: String,
) {
    let pool = pool.clone();
    let evaluator = evaluator.clone();
    let brief = OpportunityBrief::from(opportunity);
    let mut updated = assessment.clone();
    let expected = assessment.revision;

    tokio::spawn(async move {
        let evaluation = evaluator.eligibility(&brief, &profile).await;
        if let Err(e) = record_eligibility(&mut updated, evaluation) {
            warn!("Skipping eligibility result for {}: {e}", updated.id);
            return;
        }
        match store::save_progress(&pool, &updated, expected).await {
            Ok(Some(saved)) => info!(
                "Eligibility scored {:?} for assessment {}",
                saved.eligibility_score, saved.id
            ),
            Ok(None) => warn!(
                "Assessment {} changed during eligibility scoring; result dropped",
                updated.id
            ),
            Err(e) => error!("Failed to store eligibility for {}: {e}", updated.id),
        }
    });
}

pub async fn interview_questions(
    evaluator: &ResilientEvaluator,
    opportunity: &Opportunity,
) -> Vec<String> {
    evaluator
        .interview_questions(&OpportunityBrief::from(opportunity))
        .await
}

pub async fn submit_mock_application(
    pool: &PgPool,
    evaluator: &ResilientEvaluator,
    assessment: ReadinessAssessment,
    opportunity: &Opportunity,
    answers: MockApplicationAnswers,
) -> Result<ReadinessAssessment, AppError> {
    ensure_transition(current_stage(&assessment), Transition::SubmitMockApplication)?;
    validate_application_answers(&answers)?;

    let brief = OpportunityBrief::from(opportunity);
    let evaluation = evaluator.mock_application(&brief, &answers).await;
    info!(
        "Mock application for assessment {} scored {}",
        assessment.id, evaluation.score
    );

    let expected = assessment.revision;
    let mut updated = assessment;
    record_mock_application(&mut updated, evaluation)?;
    persist(pool, &updated, expected).await
}

pub async fn submit_mock_interview(
    pool: &PgPool,
    evaluator: &ResilientEvaluator,
    assessment: ReadinessAssessment,
    opportunity: &Opportunity,
    submission: MockInterviewSubmission,
) -> Result<ReadinessAssessment, AppError> {
    ensure_transition(current_stage(&assessment), Transition::SubmitMockInterview)?;
    let exchanges = build_exchanges(submission)?;

    let brief = OpportunityBrief::from(opportunity);
    let interview = evaluator.mock_interview(&brief, &exchanges).await;
    let application = crate::readiness::evaluator::Evaluation {
        score: assessment.mock_application_score.unwrap_or_default(),
        feedback: assessment
            .mock_application_feedback
            .clone()
            .unwrap_or_default(),
    };
    let training = evaluator.training(&brief, &application, &interview).await;

    let expected = assessment.revision;
    let mut updated = assessment;
    record_mock_interview(&mut updated, interview, training)?;
    let saved = persist(pool, &updated, expected).await?;
    info!(
        "Assessment {} finished: final score {:?}, status {:?}",
        saved.id, saved.final_readiness_score, saved.status
    );
    Ok(saved)
}

async fn persist(
    pool: &PgPool,
    assessment: &ReadinessAssessment,
    expected_revision: i32,
) -> Result<ReadinessAssessment, AppError> {
    store::save_progress(pool, assessment, expected_revision)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(
                "The assessment changed while this submission was being scored; reload and try again"
                    .to_string(),
            )
        })
}

fn validate_application_answers(answers: &MockApplicationAnswers) -> Result<(), AppError> {
    let fields = [
        ("personalStatement", &answers.personal_statement),
        ("experience", &answers.experience),
        ("motivation", &answers.motivation),
        ("goals", &answers.goals),
    ];
    for (name, value) in fields {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{name} is required")));
        }
    }
    Ok(())
}

/// Pairs each answer with its question; exactly three non-empty answers are required.
fn build_exchanges(submission: MockInterviewSubmission) -> Result<Vec<InterviewExchange>, AppError> {
    if submission.answers.len() != INTERVIEW_QUESTION_COUNT
        || submission.answers.iter().any(|a| a.trim().is_empty())
    {
        return Err(AppError::Validation(format!(
            "answers must contain {INTERVIEW_QUESTION_COUNT} non-empty responses"
        )));
    }

    let questions = match submission.questions {
        Some(q) if q.len() == INTERVIEW_QUESTION_COUNT => q,
        Some(_) => {
            return Err(AppError::Validation(format!(
                "questions must contain {INTERVIEW_QUESTION_COUNT} entries"
            )))
        }
        None => DEFAULT_INTERVIEW_QUESTIONS
            .iter()
            .map(|q| q.to_string())
            .collect(),
    };

    Ok(questions
        .into_iter()
        .zip(submission.answers)
        .map(|(question, answer)| InterviewExchange {
            question,
            answer: answer.trim().to_string(),
        })
        .collect())
}
