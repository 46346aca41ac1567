use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthSession;
use crate::errors::AppError;
use crate::models::assessment::ReadinessAssessment;
use crate::models::opportunity::Opportunity;
use crate::opportunities::store as opportunity_store;
use crate::readiness::evaluator::MockApplicationAnswers;
use crate::readiness::store;
use crate::readiness::workflow::{self, AssessmentView, MockInterviewSubmission};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssessmentRequest {
    pub opportunity_id: Option<Uuid>,
    /// Free-text applicant background used for eligibility scoring.
    pub profile: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentQuery {
    pub opportunity_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockApplicationRequest {
    pub assessment_id: Option<Uuid>,
    #[serde(flatten)]
    pub answers: MockApplicationAnswers,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockInterviewRequest {
    pub assessment_id: Option<Uuid>,
    #[serde(flatten)]
    pub submission: MockInterviewSubmission,
}

async fn load_opportunity(state: &AppState, id: Uuid) -> Result<Opportunity, AppError> {
    opportunity_store::get_opportunity(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Opportunity {id} not found")))
}

/// Loads an assessment the caller owns, plus its opportunity.
async fn load_own(
    state: &AppState,
    session: &AuthSession,
    id: Option<Uuid>,
) -> Result<(ReadinessAssessment, Opportunity), AppError> {
    let id = id.ok_or_else(|| AppError::Validation("assessmentId is required".to_string()))?;
    let assessment = store::get_assessment(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assessment {id} not found")))?;
    if assessment.applicant_id != session.uid() {
        return Err(AppError::Forbidden(
            "Only the applicant can access this assessment".to_string(),
        ));
    }
    let opportunity = load_opportunity(state, assessment.opportunity_id).await?;
    Ok((assessment, opportunity))
}

/// POST /api/readiness-assessment
/// Creates the caller's assessment for an opportunity, or returns the existing one.
pub async fn handle_create(
    State(state): State<AppState>,
    session: AuthSession,
    payload: Result<Json<CreateAssessmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AssessmentView>), AppError> {
    let Json(req) = payload?;
    let opportunity_id = req
        .opportunity_id
        .ok_or_else(|| AppError::Validation("opportunityId is required".to_string()))?;
    let opportunity = load_opportunity(&state, opportunity_id).await?;
    if opportunity.user_id == session.uid() {
        return Err(AppError::Forbidden(
            "You cannot take a readiness assessment for your own opportunity".to_string(),
        ));
    }

    let (assessment, created) = workflow::create_or_fetch(
        &state.db,
        &state.evaluator,
        &opportunity,
        session.uid(),
        req.profile,
    )
    .await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(AssessmentView::from(assessment))))
}

/// GET /api/readiness-assessment?opportunityId=
pub async fn handle_get_for_opportunity(
    State(state): State<AppState>,
    session: AuthSession,
    Query(query): Query<AssessmentQuery>,
) -> Result<Json<AssessmentView>, AppError> {
    let opportunity_id = query
        .opportunity_id
        .ok_or_else(|| AppError::Validation("opportunityId is required".to_string()))?;
    let assessment = store::find_assessment(&state.db, session.uid(), opportunity_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("No assessment for opportunity {opportunity_id}"))
        })?;
    let opportunity = load_opportunity(&state, assessment.opportunity_id).await?;
    workflow::resume_stalled_eligibility(
        &state.db,
        &state.evaluator,
        &opportunity,
        &assessment,
        String::new(),
    )
    .await?;
    Ok(Json(AssessmentView::from(assessment)))
}

/// GET /api/readiness-assessment/:id
pub async fn handle_get(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<AssessmentView>, AppError> {
    let (assessment, opportunity) = load_own(&state, &session, Some(id)).await?;
    workflow::resume_stalled_eligibility(
        &state.db,
        &state.evaluator,
        &opportunity,
        &assessment,
        String::new(),
    )
    .await?;
    Ok(Json(AssessmentView::from(assessment)))
}

/// GET /api/readiness-assessment/:id/interview-questions
pub async fn handle_interview_questions(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let (_, opportunity) = load_own(&state, &session, Some(id)).await?;
    let questions = workflow::interview_questions(&state.evaluator, &opportunity).await;
    Ok(Json(json!({ "assessmentId": id, "questions": questions })))
}

/// POST /api/readiness-assessment/mock-application
pub async fn handle_mock_application(
    State(state): State<AppState>,
    session: AuthSession,
    payload: Result<Json<MockApplicationRequest>, JsonRejection>,
) -> Result<Json<AssessmentView>, AppError> {
    let Json(req) = payload?;
    let (assessment, opportunity) = load_own(&state, &session, req.assessment_id).await?;
    let saved = workflow::submit_mock_application(
        &state.db,
        &state.evaluator,
        assessment,
        &opportunity,
        req.answers,
    )
    .await?;
    Ok(Json(AssessmentView::from(saved)))
}

/// POST /api/readiness-assessment/mock-interview
pub async fn handle_mock_interview(
    State(state): State<AppState>,
    session: AuthSession,
    payload: Result<Json<MockInterviewRequest>, JsonRejection>,
) -> Result<Json<AssessmentView>, AppError> {
    let Json(req) = payload?;
    let (assessment, opportunity) = load_own(&state, &session, req.assessment_id).await?;
    let saved = workflow::submit_mock_interview(
        &state.db,
        &state.evaluator,
        assessment,
        &opportunity,
        req.submission,
    )
    .await?;
    Ok(Json(AssessmentView::from(saved)))
}
