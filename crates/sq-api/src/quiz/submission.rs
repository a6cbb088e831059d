//! The quiz submission transaction.

use chrono::Utc;
use serde::Serialize;
use sq_db::repositories::{access_code, notification, quiz, story};
use sqlx::PgPool;
use uuid::Uuid;

use super::{QuestionResult, SubmittedAnswer, score_quiz};
use crate::{
    code::{ContentKind, invalid_code, is_redeemable},
    error::ApiError,
};

/// What the student sees after submitting.
#[derive(Debug, Clone, Serialize)]
pub struct SubmittedQuiz {
    pub submission_id: Uuid,
    pub score: i32,
    pub total: i32,
    pub results: Vec<QuestionResult>,
}

/// Grade and record a quiz for the story behind `code_id`, consuming the code.
///
/// The code row stays locked for the whole transaction, so two submissions
/// racing on one code cannot both succeed. Any error rolls everything back.
pub async fn submit_quiz(
    pool: &PgPool,
    code_id: Uuid,
    student_name: &str,
    answers: &[SubmittedAnswer],
) -> Result<SubmittedQuiz, ApiError> {
    let mut tx = pool.begin().await?;

    let code = access_code::find_by_id_for_update(&mut *tx, code_id)
        .await?
        .filter(|c| is_redeemable(c, Utc::now()))
        .ok_or_else(invalid_code)?;

    if code.content_kind.parse::<ContentKind>()? != ContentKind::Story {
        return Err(invalid_code());
    }

    let story = story::find_by_id(&mut *tx, code.content_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Story not found".to_string()))?;

    let questions = quiz::list_questions(&mut *tx, story.id).await?;
    if questions.is_empty() {
        return Err(ApiError::Validation(
            "This story has no quiz yet".to_string(),
        ));
    }

    let outcome = score_quiz(&questions, answers)?;

    let submission = quiz::insert_submission(
        &mut *tx,
        code.id,
        story.id,
        student_name,
        outcome.score,
        outcome.total,
    )
    .await?;
    quiz::insert_answers(&mut *tx, submission.id, &outcome.answers).await?;

    if !access_code::mark_used(&mut *tx, code.id, student_name).await? {
        return Err(invalid_code());
    }

    if let Some(author_id) = story.author_id {
        let link = format!("/stories/{}/submissions", story.id);
        notification::insert(
            &mut *tx,
            author_id,
            "quiz_submitted",
            &format!(
                "{student_name} scored {}/{} on \"{}\"",
                outcome.score, outcome.total, story.title
            ),
            Some(&link),
        )
        .await?;
    }

    tx.commit().await?;

    crate::metrics::record_quiz_submission(outcome.score, outcome.total);
    tracing::info!(
        submission_id = %submission.id,
        story_id = %story.id,
        score = outcome.score,
        total = outcome.total,
        "quiz submitted"
    );

    Ok(SubmittedQuiz {
        submission_id: submission.id,
        score: outcome.score,
        total: outcome.total,
        results: outcome.results(),
    })
}
