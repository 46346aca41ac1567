use std::collections::BTreeMap;

use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::applications::access::{queue_change, ApplicationUpdate, QueueChange};
use crate::models::application::Application;

/// Outcome of an apply attempt. Applying twice yields the first record.
pub enum ApplyOutcome {
    Created(Application),
    Existing(Application),
}

pub async fn get_application(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Application>> {
    sqlx::query_as::<_, Application>("SELECT * FROM applications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_for_applicant(pool: &PgPool, applicant_id: &str) -> sqlx::Result<Vec<Application>> {
    sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE applicant_id = $1 ORDER BY created_at DESC",
    )
    .bind(applicant_id)
    .fetch_all(pool)
    .await
}

/// Queued applicants first in queue order, then everyone else oldest first.
pub async fn list_for_opportunity(pool: &PgPool, opportunity_id: Uuid) -> sqlx::Result<Vec<Application>> {
    sqlx::query_as::<_, Application>(
        r#"
        SELECT * FROM applications
        WHERE opportunity_id = $1
        ORDER BY queue_position ASC NULLS LAST, created_at ASC
        "#,
    )
    .bind(opportunity_id)
    .fetch_all(pool)
    .await
}

/// Inserts unless the (opportunity, applicant) pair already exists; the unique
/// index makes this safe under concurrent submissions.
pub async fn apply(
    pool: &PgPool,
    opportunity_id: Uuid,
    applicant_id: &str,
    responses: BTreeMap<String, String>,
) -> sqlx::Result<ApplyOutcome> {
    let inserted = sqlx::query_as::<_, Application>(
        r#"
        INSERT INTO applications (id, opportunity_id, applicant_id, responses)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (opportunity_id, applicant_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(opportunity_id)
    .bind(applicant_id)
    .bind(Json(responses))
    .fetch_optional(pool)
    .await?;

    if let Some(application) = inserted {
        info!("Applicant {applicant_id} applied to opportunity {opportunity_id}");
        return Ok(ApplyOutcome::Created(application));
    }

    let existing = sqlx::query_as::<_, Application>(
        "SELECT * FROM applications WHERE opportunity_id = $1 AND applicant_id = $2",
    )
    .bind(opportunity_id)
    .bind(applicant_id)
    .fetch_one(pool)
    .await?;

    Ok(ApplyOutcome::Existing(existing))
}

/// Applies an authorized update. Queue positions are assigned under a lock on the
/// parent opportunity so two reviewers cannot hand out the same slot.
pub async fn update_application(
    pool: &PgPool,
    application: &Application,
    update: &ApplicationUpdate,
) -> sqlx::Result<Application> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT id FROM opportunities WHERE id = $1 FOR UPDATE")
        .bind(application.opportunity_id)
        .execute(&mut *tx)
        .await?;

    // Queue membership is decided from the locked row, not the caller's earlier read.
    let currently_queued: bool =
        sqlx::query_scalar("SELECT in_interview_queue FROM applications WHERE id = $1 FOR UPDATE")
            .bind(application.id)
            .fetch_one(&mut *tx)
            .await?;

    // (touch queue columns, in queue, position)
    let queue = queue_change(currently_queued, update.in_interview_queue);
    let (touch_queue, in_queue, position) = match queue {
        QueueChange::Enter => {
            let max: Option<i32> = sqlx::query_scalar(
                "SELECT MAX(queue_position) FROM applications WHERE opportunity_id = $1",
            )
            .bind(application.opportunity_id)
            .fetch_one(&mut *tx)
            .await?;
            (true, true, Some(max.unwrap_or(0) + 1))
        }
        QueueChange::Leave => (true, false, None),
        QueueChange::Keep => (false, false, None),
    };

    let updated = sqlx::query_as::<_, Application>(
        r#"
        UPDATE applications
        SET status = COALESCE($2, status),
            current_stage = COALESCE($3, current_stage),
            feedback = COALESCE($4, feedback),
            is_qualified = COALESCE($5, is_qualified),
            notes = COALESCE($6, notes),
            in_interview_queue = CASE WHEN $9 THEN $7 ELSE in_interview_queue END,
            queue_position = CASE WHEN $9 THEN $8 ELSE queue_position END
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(application.id)
    .bind(update.status.map(|s| s.as_str()))
    .bind(&update.current_stage)
    .bind(&update.feedback)
    .bind(update.is_qualified)
    .bind(&update.notes)
    .bind(in_queue)
    .bind(position)
    .bind(touch_queue)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(updated)
}

pub async fn delete_application(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM applications WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
