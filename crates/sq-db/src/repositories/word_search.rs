use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::WordSearchGame;

pub async fn list<'e, E>(
    executor: E,
    created_by: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<WordSearchGame>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, category_id, words, created_by, created_at, updated_at
            FROM word_search_games
            WHERE deleted_at IS NULL
                AND ($1::uuid IS NULL OR created_by = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
        "#,
    )
    .bind(created_by)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn find_by_id<'e, E>(
    executor: E,
    id: Uuid,
) -> Result<Option<WordSearchGame>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, category_id, words, created_by, created_at, updated_at
            FROM word_search_games
            WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e, E>(
    executor: E,
    title: &str,
    category_id: Option<Uuid>,
    words: &[String],
    created_by: Uuid,
) -> Result<WordSearchGame, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO word_search_games (title, category_id, words, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, category_id, words, created_by, created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(category_id)
    .bind(words)
    .bind(created_by)
    .fetch_one(executor)
    .await
}

pub async fn update<'e, E>(
    executor: E,
    id: Uuid,
    title: &str,
    category_id: Option<Uuid>,
    words: &[String],
) -> Result<Option<WordSearchGame>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE word_search_games
            SET title = $1, category_id = $2, words = $3, updated_at = NOW()
            WHERE id = $4 AND deleted_at IS NULL
            RETURNING id, title, category_id, words, created_by, created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(category_id)
    .bind(words)
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
            UPDATE word_search_games
            SET deleted_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
