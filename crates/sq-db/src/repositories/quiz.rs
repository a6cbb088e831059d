use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::models::{QuizQuestion, QuizQuestionInsert, Submission, SubmissionAnswerInsert};

pub async fn list_questions<'e, E>(
    executor: E,
    story_id: Uuid,
) -> Result<Vec<QuizQuestion>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, story_id, position, prompt, kind, options, correct_option, correct_answer
            FROM quiz_questions
            WHERE story_id = $1 AND deleted_at IS NULL
            ORDER BY position, created_at
        "#,
    )
    .bind(story_id)
    .fetch_all(executor)
    .await
}

/// Soft-delete the active question set so old submissions keep their answer rows.
pub async fn retire_questions<'e, E>(executor: E, story_id: Uuid) -> Result<u64, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let result = sqlx::query(
        // language=PostgreSQL
        r#"
            UPDATE quiz_questions
            SET deleted_at = NOW()
            WHERE story_id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(story_id)
    .execute(executor)
    .await?;
    Ok(result.rows_affected())
}

pub async fn insert_question<'e, E>(
    executor: E,
    story_id: Uuid,
    question: &QuizQuestionInsert,
) -> Result<QuizQuestion, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO quiz_questions (story_id, position, prompt, kind, options, correct_option, correct_answer)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, story_id, position, prompt, kind, options, correct_option, correct_answer
        "#,
    )
    .bind(story_id)
    .bind(question.position)
    .bind(&question.prompt)
    .bind(&question.kind)
    .bind(&question.options)
    .bind(question.correct_option)
    .bind(&question.correct_answer)
    .fetch_one(executor)
    .await
}

pub async fn insert_submission<'e, E>(
    executor: E,
    code_id: Uuid,
    story_id: Uuid,
    student_name: &str,
    score: i32,
    total: i32,
) -> Result<Submission, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            INSERT INTO submissions (code_id, story_id, student_name, score, total)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, code_id, story_id, student_name, score, total, submitted_at
        "#,
    )
    .bind(code_id)
    .bind(story_id)
    .bind(student_name)
    .bind(score)
    .bind(total)
    .fetch_one(executor)
    .await
}

/// Insert every graded answer of a submission in one statement.
pub async fn insert_answers<'e, E>(
    executor: E,
    submission_id: Uuid,
    answers: &[SubmissionAnswerInsert],
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    let question_ids: Vec<Uuid> = answers.iter().map(|a| a.question_id).collect();
    let texts: Vec<Option<String>> = answers.iter().map(|a| a.answer.clone()).collect();
    let correct: Vec<bool> = answers.iter().map(|a| a.correct).collect();

    sqlx::query(
        // language=PostgreSQL
        r#"
            INSERT INTO submission_answers (submission_id, question_id, answer, correct)
            SELECT $1, q.question_id, q.answer, q.correct
            FROM UNNEST($2::uuid[], $3::text[], $4::bool[]) AS q(question_id, answer, correct)
        "#,
    )
    .bind(submission_id)
    .bind(&question_ids)
    .bind(&texts)
    .bind(&correct)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list_submissions<'e, E>(
    executor: E,
    story_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Submission>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as(
        // language=PostgreSQL
        r#"
            SELECT id, code_id, story_id, student_name, score, total, submitted_at
            FROM submissions
            WHERE story_id = $1
            ORDER BY submitted_at DESC
            LIMIT $2 OFFSET $3
        "#,
    )
    .bind(story_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}
