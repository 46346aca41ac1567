use sqlx::types::Json;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::opportunity::Opportunity;
use crate::opportunities::discovery::ListQuery;
use crate::opportunities::validation::OpportunityFields;

pub async fn get_opportunity(pool: &PgPool, id: Uuid) -> sqlx::Result<Option<Opportunity>> {
    sqlx::query_as::<_, Opportunity>("SELECT * FROM opportunities WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Equality / array-contains filters only; newest first.
pub async fn list_opportunities(pool: &PgPool, query: &ListQuery) -> sqlx::Result<Vec<Opportunity>> {
    sqlx::query_as::<_, Opportunity>(
        r#"
        SELECT * FROM opportunities
        WHERE ($1::text IS NULL OR opportunity_type = $1)
          AND ($2::text IS NULL OR $2 = ANY(tags))
          AND ($3::text IS NULL OR user_id = $3)
          AND ($4::text IS NULL OR creator_type = $4)
        ORDER BY created_at DESC
        "#,
    )
    .bind(query.opportunity_type.map(|t| t.as_str()))
    .bind(query.tag.as_deref())
    .bind(query.user_id.as_deref())
    .bind(query.creator_type.map(|r| r.as_str()))
    .fetch_all(pool)
    .await
}

pub async fn insert_opportunity(
    pool: &PgPool,
    owner_id: &str,
    fields: &OpportunityFields,
) -> sqlx::Result<Opportunity> {
    let opportunity = sqlx::query_as::<_, Opportunity>(
        r#"
        INSERT INTO opportunities
            (id, title, description, provider, creator_type, opportunity_type, tags,
             deadline, location, eligibility, funding, url, custom_fields, user_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(&fields.provider)
    .bind(fields.creator_type.as_str())
    .bind(fields.opportunity_type.as_str())
    .bind(&fields.tags)
    .bind(&fields.deadline)
    .bind(&fields.location)
    .bind(&fields.eligibility)
    .bind(&fields.funding)
    .bind(&fields.url)
    .bind(Json(&fields.custom_fields))
    .bind(owner_id)
    .fetch_one(pool)
    .await?;

    info!("Created opportunity {} for owner {owner_id}", opportunity.id);
    Ok(opportunity)
}

/// Rewrites every mutable column. `user_id` is never touched.
pub async fn update_opportunity(
    pool: &PgPool,
    id: Uuid,
    fields: &OpportunityFields,
) -> sqlx::Result<Opportunity> {
    sqlx::query_as::<_, Opportunity>(
        r#"
        UPDATE opportunities
        SET title = $2, description = $3, provider = $4, creator_type = $5,
            opportunity_type = $6, tags = $7, deadline = $8, location = $9,
            eligibility = $10, funding = $11, url = $12, custom_fields = $13
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&fields.title)
    .bind(&fields.description)
    .bind(&fields.provider)
    .bind(fields.creator_type.as_str())
    .bind(fields.opportunity_type.as_str())
    .bind(&fields.tags)
    .bind(&fields.deadline)
    .bind(&fields.location)
    .bind(&fields.eligibility)
    .bind(&fields.funding)
    .bind(&fields.url)
    .bind(Json(&fields.custom_fields))
    .fetch_one(pool)
    .await
}

/// Deletes the opportunity; applications and assessments cascade.
pub async fn delete_opportunity(pool: &PgPool, id: Uuid) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM opportunities WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
