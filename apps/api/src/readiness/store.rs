use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::assessment::ReadinessAssessment;

pub async fn get_assessment(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<ReadinessAssessment>> {
    sqlx::query_as::<_, ReadinessAssessment>("SELECT * FROM readiness_assessments WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_assessment(
    pool: &PgPool,
    applicant_id: &str,
    opportunity_id: Uuid,
) -> sqlx::Result<Option<ReadinessAssessment>> {
    sqlx::query_as::<_, ReadinessAssessment>(
        "SELECT * FROM readiness_assessments WHERE applicant_id = $1 AND opportunity_id = $2",
    )
    .bind(applicant_id)
    .bind(opportunity_id)
    .fetch_optional(pool)
    .await
}

/// Returns the existing assessment for the pair or creates a blank one.
/// The boolean is true when this call created the record.
pub async fn create_or_fetch(
    pool: &PgPool,
    applicant_id: &str,
    opportunity_id: Uuid,
) -> sqlx::Result<(ReadinessAssessment, bool)> {
    let inserted = sqlx::query_as::<_, ReadinessAssessment>(
        r#"
        INSERT INTO readiness_assessments (id, applicant_id, opportunity_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (applicant_id, opportunity_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(applicant_id)
    .bind(opportunity_id)
    .fetch_optional(pool)
    .await?;

    if let Some(assessment) = inserted {
        info!(
            "Created readiness assessment {} for applicant {applicant_id} on {opportunity_id}",
            assessment.id
        );
        return Ok((assessment, true));
    }

    let existing = sqlx::query_as::<_, ReadinessAssessment>(
        "SELECT * FROM readiness_assessments WHERE applicant_id = $1 AND opportunity_id = $2",
    )
    .bind(applicant_id)
    .bind(opportunity_id)
    .fetch_one(pool)
    .await?;

    Ok((existing, false))
}

/// Writes every progress column if the stored revision still equals
/// `expected_revision`. Returns `None` when another writer got there first.
pub async fn save_progress(
    pool: &PgPool,
    assessment: &ReadinessAssessment,
    expected_revision: i32,
) -> sqlx::Result<Option<ReadinessAssessment>> {
    sqlx::query_as::<_, ReadinessAssessment>(
        r#"
        UPDATE readiness_assessments
        SET status = $3,
            eligibility_score = $4,
            eligibility_feedback = $5,
            mock_application_completed = $6,
            mock_application_score = $7,
            mock_application_feedback = $8,
            mock_interview_completed = $9,
            mock_interview_score = $10,
            mock_interview_feedback = $11,
            final_readiness_score = $12,
            recommended_training = $13,
            revision = revision + 1,
            updated_at = NOW()
        WHERE id = $1 AND revision = $2
        RETURNING *
        "#,
    )
    .bind(assessment.id)
    .bind(expected_revision)
    .bind(assessment.status.as_str())
    .bind(assessment.eligibility_score)
    .bind(&assessment.eligibility_feedback)
    .bind(assessment.mock_application_completed)
    .bind(assessment.mock_application_score)
    .bind(&assessment.mock_application_feedback)
    .bind(assessment.mock_interview_completed)
    .bind(assessment.mock_interview_score)
    .bind(&assessment.mock_interview_feedback)
    .bind(assessment.final_readiness_score)
    .bind(&assessment.recommended_training)
    .fetch_optional(pool)
    .await
}

/// Marks a pending eligibility run as restarted so concurrent readers do not
/// start another one.
pub async fn touch_pending_eligibility(
    pool: &PgPool,
    id: Uuid,
    expected_revision: i32,
    stale_after_secs: i64,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE readiness_assessments
        SET updated_at = NOW()
        WHERE id = $1 AND revision = $2 AND eligibility_score IS NULL
          AND updated_at < NOW() - make_interval(secs => $3)
        "#,
    )
    .bind(id)
    .bind(expected_revision)
    .bind(stale_after_secs as f64)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}
