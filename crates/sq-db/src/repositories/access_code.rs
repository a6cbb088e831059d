use chrono::{DateTime, Utc};
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{AccessCode, AccessCodeFilter};

/// Insert a code, returning `None` when the code string is already taken.
pub async fn try_insert<'e, E>(
    executor: E,
    code: &str,
    content_kind: &str,
    content_id: Uuid,
    label: Option<&str>,
    created_by: Uuid,
    expires_at: Option<DateTime<Utc>>,
) -> Result<Option<AccessCode>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO access_codes (code, content_kind, content_id, label, created_by, expires_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (code) DO NOTHING
            RETURNING id, code, content_kind, content_id, label, created_by,
                      expires_at, used_at, used_by_name, created_at
        "#,
    )
    .bind(code)
    .bind(content_kind)
    .bind(content_id)
    .bind(label)
    .bind(created_by)
    .bind(expires_at)
    .fetch_optional(executor)
    .await
}

pub async fn list<'e, E>(
    executor: E,
    filter: &AccessCodeFilter,
) -> Result<Vec<AccessCode>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, code, content_kind, content_id, label, created_by,
                   expires_at, used_at, used_by_name, created_at
            FROM access_codes
            WHERE deleted_at IS NULL
                AND ($1::uuid IS NULL OR created_by = $1)
                AND ($2::text IS NULL OR content_kind = $2)
                AND ($3::uuid IS NULL OR content_id = $3)
                AND (
                    $4::text IS NULL
                    OR ($4 = 'used' AND used_at IS NOT NULL)
                    OR ($4 = 'unused' AND used_at IS NULL
                        AND (expires_at IS NULL OR expires_at > NOW()))
                    OR ($4 = 'expired' AND used_at IS NULL AND expires_at <= NOW())
                )
            ORDER BY created_at DESC, code
            LIMIT $5 OFFSET $6
        "#,
    )
    .bind(filter.created_by)
    .bind(&filter.content_kind)
    .bind(filter.content_id)
    .bind(&filter.status)
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(executor)
    .await
}

pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<AccessCode>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, code, content_kind, content_id, label, created_by,
                   expires_at, used_at, used_by_name, created_at
            FROM access_codes
            WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Find a code that can still be redeemed: not revoked, not used, not expired.
pub async fn find_redeemable<'e, E>(
    executor: E,
    code: &str,
) -> Result<Option<AccessCode>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, code, content_kind, content_id, label, created_by,
                   expires_at, used_at, used_by_name, created_at
            FROM access_codes
            WHERE code = $1
                AND deleted_at IS NULL
                AND used_at IS NULL
                AND (expires_at IS NULL OR expires_at > NOW())
        "#,
    )
    .bind(code)
    .fetch_optional(executor)
    .await
}

/// Lock a code row for the quiz submission transaction.
pub async fn find_by_id_for_update<'e, E>(
    executor: E,
    id: Uuid,
) -> Result<Option<AccessCode>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, code, content_kind, content_id, label, created_by,
                   expires_at, used_at, used_by_name, created_at
            FROM access_codes
            WHERE id = $1 AND deleted_at IS NULL
            FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Consume a code. Returns `false` when it was no longer redeemable.
pub async fn mark_used<'e, E>(
    executor: E,
    id: Uuid,
    student_name: &str,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE access_codes
            SET used_at = NOW(), used_by_name = $2
            WHERE id = $1
                AND deleted_at IS NULL
                AND used_at IS NULL
                AND (expires_at IS NULL OR expires_at > NOW())
        "#,
    )
    .bind(id)
    .bind(student_name)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn soft_delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE access_codes
            SET deleted_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
