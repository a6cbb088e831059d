use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{MysteryBoxGame, MysteryBoxItem, MysteryBoxItemInsert};

pub async fn list<'e, E>(
    executor: E,
    created_by: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<MysteryBoxGame>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, category_id, created_by, created_at, updated_at
            FROM mystery_box_games
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
) -> Result<Option<MysteryBoxGame>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, category_id, created_by, created_at, updated_at
            FROM mystery_box_games
            WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn list_items<'e, E>(
    executor: E,
    game_id: Uuid,
) -> Result<Vec<MysteryBoxItem>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, game_id, position, word, hint, image_url
            FROM mystery_box_items
            WHERE game_id = $1 AND deleted_at IS NULL
            ORDER BY position, created_at
        "#,
    )
    .bind(game_id)
    .fetch_all(executor)
    .await
}

pub async fn create<'e, E>(
    executor: E,
    title: &str,
    category_id: Option<Uuid>,
    created_by: Uuid,
) -> Result<MysteryBoxGame, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO mystery_box_games (title, category_id, created_by)
            VALUES ($1, $2, $3)
            RETURNING id, title, category_id, created_by, created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(category_id)
    .bind(created_by)
    .fetch_one(executor)
    .await
}

pub async fn update<'e, E>(
    executor: E,
    id: Uuid,
    title: &str,
    category_id: Option<Uuid>,
) -> Result<Option<MysteryBoxGame>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE mystery_box_games
            SET title = $1, category_id = $2, updated_at = NOW()
            WHERE id = $3 AND deleted_at IS NULL
            RETURNING id, title, category_id, created_by, created_at, updated_at
        "#,
    )
    .bind(title)
    .bind(category_id)
    .bind(id)
    .fetch_optional(executor)
    .await
}

/// Soft-delete the game's current boxes before a replacement set is inserted.
pub async fn retire_items<'e, E>(executor: E, game_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE mystery_box_items
            SET deleted_at = NOW()
            WHERE game_id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(game_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn insert_item<'e, E>(
    executor: E,
    game_id: Uuid,
    item: &MysteryBoxItemInsert,
) -> Result<MysteryBoxItem, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO mystery_box_items (game_id, position, word, hint, image_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, game_id, position, word, hint, image_url
        "#,
    )
    .bind(game_id)
    .bind(item.position)
    .bind(&item.word)
    .bind(&item.hint)
    .bind(&item.image_url)
    .fetch_one(executor)
    .await
}

pub async fn soft_delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE mystery_box_games
            SET deleted_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
