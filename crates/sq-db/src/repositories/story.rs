use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{Story, StoryInput, StoryListItem};

/// List active stories, newest first.
///
/// `author_id` restricts the list to one author; `None` lists every story.
pub async fn list<'e, E>(
    executor: E,
    category_id: Option<Uuid>,
    author_id: Option<Uuid>,
    limit: i64,
    offset: i64,
) -> Result<Vec<StoryListItem>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT s.id, s.title, s.summary, s.category_id, c.name AS category_name,
                   s.cover_image_url, s.author_id, u.display_name AS author_name,
                   s.published,
                   (SELECT COUNT(*) FROM quiz_questions q
                    WHERE q.story_id = s.id AND q.deleted_at IS NULL) AS question_count,
                   s.created_at
            FROM stories s
            LEFT JOIN categories c ON c.id = s.category_id AND c.deleted_at IS NULL
            LEFT JOIN users u ON u.id = s.author_id
            WHERE s.deleted_at IS NULL
                AND ($1::uuid IS NULL OR s.category_id = $1)
                AND ($2::uuid IS NULL OR s.author_id = $2)
            ORDER BY s.created_at DESC
            LIMIT $3 OFFSET $4
        "#,
    )
    .bind(category_id)
    .bind(author_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Story>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, title, summary, body, category_id, cover_image_url, video_url,
                   author_id, published, created_at, updated_at
            FROM stories
            WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await
}

pub async fn create<'e, E>(
    executor: E,
    author_id: Uuid,
    input: &StoryInput,
) -> Result<Story, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO stories (title, summary, body, category_id, cover_image_url, video_url, author_id, published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, title, summary, body, category_id, cover_image_url, video_url,
                      author_id, published, created_at, updated_at
        "#,
    )
    .bind(&input.title)
    .bind(&input.summary)
    .bind(&input.body)
    .bind(input.category_id)
    .bind(&input.cover_image_url)
    .bind(&input.video_url)
    .bind(author_id)
    .bind(input.published)
    .fetch_one(executor)
    .await
}

pub async fn update<'e, E>(
    executor: E,
    id: Uuid,
    input: &StoryInput,
) -> Result<Option<Story>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            UPDATE stories
            SET title = $1, summary = $2, body = $3, category_id = $4,
                cover_image_url = $5, video_url = $6, published = $7, updated_at = NOW()
            WHERE id = $8 AND deleted_at IS NULL
            RETURNING id, title, summary, body, category_id, cover_image_url, video_url,
                      author_id, published, created_at, updated_at
        "#,
    )
    .bind(&input.title)
    .bind(&input.summary)
    .bind(&input.body)
    .bind(input.category_id)
    .bind(&input.cover_image_url)
    .bind(&input.video_url)
    .bind(input.published)
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
            UPDATE stories
            SET deleted_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}
