use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::PendingInvitation;

/// Mark any open invitation for the user as superseded.
pub async fn revoke_open_invitations<'e, E>(executor: E, user_id: Uuid) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE invitations
            SET expires_at = NOW()
            WHERE user_id = $1 AND accepted_at IS NULL AND expires_at > NOW()
        "#,
    )
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn insert_invitation<'e, E>(
    executor: E,
    user_id: Uuid,
    invited_by: Uuid,
    token_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<Uuid, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            INSERT INTO invitations (user_id, invited_by, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(invited_by)
    .bind(token_hash)
    .bind(expires_at)
    .fetch_one(executor)
    .await
}

/// Find an open, unexpired invitation and lock it for acceptance.
pub async fn find_pending_for_update<'e, E>(
    executor: E,
    token_hash: &str,
) -> Result<Option<PendingInvitation>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT i.id AS invitation_id, u.id AS user_id, u.email, u.display_name, u.role
            FROM invitations i
            JOIN users u ON u.id = i.user_id
            WHERE i.token_hash = $1
                AND i.accepted_at IS NULL
                AND i.expires_at > NOW()
                AND u.deleted_at IS NULL
            FOR UPDATE OF i
        "#,
    )
    .bind(token_hash)
    .fetch_optional(executor)
    .await
}

pub async fn mark_accepted<'e, E>(executor: E, invitation_id: Uuid) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE invitations
            SET accepted_at = NOW()
            WHERE id = $1
        "#,
    )
    .bind(invitation_id)
    .execute(executor)
    .await?;
    Ok(())
}

/// Delete invitations that expired without being accepted.
pub async fn delete_expired<'e, E>(executor: E) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM invitations
            WHERE accepted_at IS NULL AND expires_at < NOW()
        "#,
    )
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}
