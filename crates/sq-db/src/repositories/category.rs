use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::Category;

pub async fn list<'e, E>(executor: E) -> Result<Vec<Category>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, name, description, created_at, updated_at
            FROM categories
            WHERE deleted_at IS NULL
            ORDER BY name
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Category>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, name, description, created_at, updated_at
            FROM categories
            WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e, E>(
    executor: E,
    name: &str,
    description: Option<&str>,
    created_by: Uuid,
) -> Result<Category, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO categories (name, description, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, name, description, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(created_by)
    .fetch_one(executor)
    .await
}

pub async fn update<'e, E>(
    executor: E,
    id: Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<Option<Category>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE categories
            SET name = $1, description = $2, updated_at = NOW()
            WHERE id = $3 AND deleted_at IS NULL
            RETURNING id, name, description, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn soft_delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE categories
            SET deleted_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
