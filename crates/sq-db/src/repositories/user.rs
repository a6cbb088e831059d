use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{User, UserCredentials};

pub async fn find_by_id<'e, E>(executor: E, user_id: Uuid) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, email, display_name, role, avatar_url,
                   password_hash IS NOT NULL AS active, created_at
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn find_credentials_by_email<'e, E>(
    executor: E,
    email: &str,
) -> Result<Option<UserCredentials>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, email, display_name, role, password_hash
            FROM users
            WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL
        "#,
    )
    .bind(email)
    .fetch_optional(executor)
    .await
}

pub async fn find_password_hash<'e, E>(
    executor: E,
    user_id: Uuid,
) -> Result<Option<String>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let hash: Option<Option<String>> = sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT password_hash
            FROM users
            WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?;
    Ok(hash.flatten())
}

pub async fn email_exists<'e, E>(executor: E, email: &str) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT EXISTS(
                SELECT 1 FROM users
                WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL
            )
        "#,
    )
    .bind(email)
    .fetch_one(executor)
    .await
}

/// Insert a user. `password_hash` is `None` for invited users.
pub async fn create_user<'e, E>(
    executor: E,
    email: &str,
    display_name: &str,
    role: &str,
    password_hash: Option<&str>,
) -> Result<Uuid, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            INSERT INTO users (email, display_name, role, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id
        "#,
    )
    .bind(email)
    .bind(display_name)
    .bind(role)
    .bind(password_hash)
    .fetch_one(executor)
    .await
}

pub async fn list_users<'e, E>(
    executor: E,
    limit: i64,
    offset: i64,
) -> Result<Vec<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, email, display_name, role, avatar_url,
                   password_hash IS NOT NULL AS active, created_at
            FROM users
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn active_admin_ids<'e, E>(executor: E) -> Result<Vec<Uuid>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar(
        // language=PostgreSQL
        r#"
            SELECT id FROM users
            WHERE role = 'admin' AND deleted_at IS NULL AND password_hash IS NOT NULL
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn update_role<'e, E>(
    executor: E,
    user_id: Uuid,
    role: &str,
) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE users
            SET role = $1, updated_at = NOW()
            WHERE id = $2 AND deleted_at IS NULL
            RETURNING id, email, display_name, role, avatar_url,
                      password_hash IS NOT NULL AS active, created_at
        "#,
    )
    .bind(role)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn update_profile<'e, E>(
    executor: E,
    user_id: Uuid,
    display_name: &str,
    avatar_url: Option<&str>,
) -> Result<Option<User>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE users
            SET display_name = $1, avatar_url = $2, updated_at = NOW()
            WHERE id = $3 AND deleted_at IS NULL
            RETURNING id, email, display_name, role, avatar_url,
                      password_hash IS NOT NULL AS active, created_at
        "#,
    )
    .bind(display_name)
    .bind(avatar_url)
    .bind(user_id)
    .fetch_optional(executor)
    .await
}

pub async fn set_password<'e, E>(
    executor: E,
    user_id: Uuid,
    password_hash: &str,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE users
            SET password_hash = $1, updated_at = NOW()
            WHERE id = $2 AND deleted_at IS NULL
        "#,
    )
    .bind(password_hash)
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn soft_delete<'e, E>(executor: E, user_id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE users
            SET deleted_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(user_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
