use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::Notification;

pub async fn insert<'e, E>(
    executor: E,
    user_id: Uuid,
    kind: &str,
    message: &str,
    link: Option<&str>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO notifications (user_id, kind, message, link)
            VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(user_id)
    .bind(kind)
    .bind(message)
    .bind(link)
    .execute(executor)
    .await?;
    Ok(())
}

/// Fan the same notification out to several users.
pub async fn insert_many<'e, E>(
    executor: E,
    user_ids: &[Uuid],
    kind: &str,
    message: &str,
    link: Option<&str>,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO notifications (user_id, kind, message, link)
            SELECT u, $2, $3, $4 FROM UNNEST($1::uuid[]) AS u
        "#,
    )
    .bind(user_ids)
    .bind(kind)
    .bind(message)
    .bind(link)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn list<'e, E>(
    executor: E,
    user_id: Uuid,
    unread_only: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Notification>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, user_id, kind, message, link, read_at, created_at
            FROM notifications
            WHERE user_id = $1
                AND deleted_at IS NULL
                AND (NOT $2 OR read_at IS NULL)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
        "#,
    )
    .bind(user_id)
    .bind(unread_only)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn unread_count<'e, E>(executor: E, user_id: Uuid) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT COUNT(*) FROM notifications
            WHERE user_id = $1 AND read_at IS NULL AND deleted_at IS NULL
        "#,
    )
    .bind(user_id)
    .fetch_one(executor)
    .await
}

pub async fn mark_read<'e, E>(executor: E, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE notifications
            SET read_at = COALESCE(read_at, NOW())
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn mark_all_read<'e, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE notifications
            SET read_at = NOW()
            WHERE user_id = $1 AND read_at IS NULL AND deleted_at IS NULL
        "#,
    )
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn soft_delete<'e, E>(executor: E, user_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE notifications
            SET deleted_at = NOW()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
