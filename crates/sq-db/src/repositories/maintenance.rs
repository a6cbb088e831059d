use sqlx::{Executor, Postgres};

/// Tables that carry a `deleted_at` column, children first so cascades stay cheap.
pub const SOFT_DELETE_TABLES: &[&str] = &[
    "notifications",
    "mystery_box_items",
    "access_codes",
    "mystery_box_games",
    "word_search_games",
    "stories",
    "categories",
];

/// Extra filter keeping rows that quiz submissions still reference.
fn retained_rows(table: &str) -> &'static str {
    match table {
        "access_codes" => {
            " AND NOT EXISTS (SELECT 1 FROM submissions s WHERE s.code_id = access_codes.id)"
        }
        "stories" => " AND NOT EXISTS (SELECT 1 FROM submissions s WHERE s.story_id = stories.id)",
        _ => "",
    }
}

fn purge_sql(table: &str) -> Option<String> {
    SOFT_DELETE_TABLES.contains(&table).then(|| {
        format!(
            "DELETE FROM {table} WHERE deleted_at IS NOT NULL AND deleted_at < NOW() - make_interval(days => $1){}",
            retained_rows(table)
        )
    })
}

/// Permanently remove rows of `table` soft-deleted more than `retention_days` ago.
///
/// `table` must come from [`SOFT_DELETE_TABLES`]. Codes and stories with quiz
/// submissions are never purged, so results survive a revoked code or a
/// deleted story.
pub async fn purge_soft_deleted<'e, E>(
    executor: E,
    table: &str,
    retention_days: i32,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let Some(sql) = purge_sql(table) else {
        return Err(sqlx::Error::Protocol(format!(
            "table {table} is not purgeable"
        )));
    };

    let result = sqlx::query(&sql).bind(retention_days).execute(executor).await?;
    Ok(result.rows_affected())
}

/// Remove retired quiz questions that no submission answered.
pub async fn purge_retired_questions<'e, E>(
    executor: E,
    retention_days: i32,
) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            DELETE FROM quiz_questions q
            WHERE q.deleted_at IS NOT NULL
                AND q.deleted_at < NOW() - make_interval(days => $1)
                AND NOT EXISTS (
                    SELECT 1 FROM submission_answers a WHERE a.question_id = q.id
                )
        "#,
    )
    .bind(retention_days)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_purge_sql_keeps_rows_with_submissions() {
        let codes = purge_sql("access_codes").expect("access_codes is purgeable");
        assert!(codes.contains("s.code_id = access_codes.id"));

        let stories = purge_sql("stories").expect("stories is purgeable");
        assert!(stories.contains("s.story_id = stories.id"));

        let notifications = purge_sql("notifications").expect("notifications is purgeable");
        assert!(!notifications.contains("submissions"));
    }

    #[test]
    fn test_purge_sql_rejects_unknown_tables() {
        assert_eq!(purge_sql("users"), None);
        assert_eq!(purge_sql("submissions; DROP TABLE users"), None);
    }
}
