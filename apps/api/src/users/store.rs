use sqlx::PgPool;
use tracing::info;

use crate::models::user::{Role, User};

/// Returns the user record for a Firebase uid, creating it on first sign-in.
/// A non-empty email from the token refreshes the stored one.
pub async fn get_or_create_user(pool: &PgPool, uid: &str, email: &str) -> sqlx::Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email)
        VALUES ($1, $2)
        ON CONFLICT (id) DO UPDATE
            SET email = COALESCE(NULLIF(EXCLUDED.email, ''), users.email)
        RETURNING *
        "#,
    )
    .bind(uid)
    .bind(email)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

pub async fn set_active_role(pool: &PgPool, uid: &str, role: Role) -> sqlx::Result<User> {
    let user = sqlx::query_as::<_, User>(
        "UPDATE users SET active_role = $1 WHERE id = $2 RETURNING *",
    )
    .bind(role)
    .bind(uid)
    .fetch_one(pool)
    .await?;

    info!("User {uid} switched active role to {role:?}");
    Ok(user)
}

/// Records KYC metadata. Verification itself happens out-of-band.
pub async fn submit_kyc(
    pool: &PgPool,
    uid: &str,
    organization_name: &str,
    organization_type: &str,
) -> sqlx::Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET organization_name = $1,
            organization_type = $2,
            kyc_submitted = TRUE,
            role = 'organization'
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(organization_name)
    .bind(organization_type)
    .bind(uid)
    .fetch_one(pool)
    .await?;

    info!("User {uid} submitted KYC for organization '{organization_name}'");
    Ok(user)
}
