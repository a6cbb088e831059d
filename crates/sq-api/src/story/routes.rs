use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use sq_db::{
    models::{QuizQuestion, Story, StoryInput, StoryListItem, Submission},
    repositories::{quiz, story as story_repo},
};
use uuid::Uuid;

use crate::{
    ApiState,
    auth::AuthUser,
    category,
    error::ApiError,
    middleware::rate_limit,
    quiz::{QuestionInput, model::validate_questions},
    validation::{Pagination, optional_text, optional_url, required_text},
};

const MAX_TITLE_CHARS: usize = 200;
const MAX_SUMMARY_CHARS: usize = 500;
const MAX_BODY_CHARS: usize = 50_000;

/// Create the story routes
pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    Router::new()
        .route("/stories", get(list_stories))
        .route("/stories", post(create_story))
        .route("/stories/{id}", get(get_story))
        .route("/stories/{id}", put(update_story))
        .route("/stories/{id}", delete(delete_story))
        .route("/stories/{id}/questions", get(get_questions))
        .route("/stories/{id}/questions", put(replace_questions))
        .route("/stories/{id}/submissions", get(list_submissions))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_REPLENISH_MS,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

#[derive(Debug, Deserialize)]
struct StoryRequest {
    title: String,
    summary: Option<String>,
    body: String,
    category_id: Option<Uuid>,
    cover_image_url: Option<String>,
    video_url: Option<String>,
    #[serde(default)]
    published: bool,
}

impl StoryRequest {
    async fn validate(self, state: &ApiState) -> Result<StoryInput, ApiError> {
        let input = StoryInput {
            title: required_text("Title", &self.title, MAX_TITLE_CHARS)?,
            summary: optional_text("Summary", self.summary.as_deref(), MAX_SUMMARY_CHARS)?,
            body: required_text("Body", &self.body, MAX_BODY_CHARS)?,
            category_id: self.category_id,
            cover_image_url: optional_url("Cover image URL", self.cover_image_url.as_deref())?,
            video_url: optional_url("Video URL", self.video_url.as_deref())?,
            published: self.published,
        };
        category::ensure_exists(&state.pool, input.category_id).await?;
        Ok(input)
    }
}

#[derive(Debug, Deserialize)]
struct ListStoriesQuery {
    category_id: Option<Uuid>,
    /// Admins only; teachers always see their own stories
    author_id: Option<Uuid>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// Get stories, newest first
async fn list_stories(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Query(query): Query<ListStoriesQuery>,
) -> Result<Json<Vec<StoryListItem>>, ApiError> {
    let (limit, offset) = Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .resolve();

    let author_id = if auth_user.is_admin() {
        query.author_id
    } else {
        Some(auth_user.user_id)
    };

    let stories =
        story_repo::list(&state.pool, query.category_id, author_id, limit, offset).await?;
    Ok(Json(stories))
}

/// Load a story the caller may manage
async fn managed_story(
    state: &ApiState,
    auth_user: &AuthUser,
    id: Uuid,
) -> Result<Story, ApiError> {
    let story = story_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Story not found".to_string()))?;
    auth_user.ensure_can_manage(story.author_id)?;
    Ok(story)
}

/// Get story by ID
async fn get_story(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Story>, ApiError> {
    Ok(Json(managed_story(&state, &auth_user, id).await?))
}

/// Create a new story
async fn create_story(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(body): Json<StoryRequest>,
) -> Result<(StatusCode, Json<Story>), ApiError> {
    let input = body.validate(&state).await?;
    let story = story_repo::create(&state.pool, auth_user.user_id, &input).await?;

    tracing::info!(story_id = %story.id, author_id = %auth_user.user_id, "story created");

    Ok((StatusCode::CREATED, Json(story)))
}

/// Update an existing story
async fn update_story(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(body): Json<StoryRequest>,
) -> Result<Json<Story>, ApiError> {
    managed_story(&state, &auth_user, id).await?;
    let input = body.validate(&state).await?;

    story_repo::update(&state.pool, id, &input)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Story not found".to_string()))
}

/// Delete a story
async fn delete_story(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    managed_story(&state, &auth_user, id).await?;
    story_repo::soft_delete(&state.pool, id).await?;

    tracing::info!(story_id = %id, deleted_by = %auth_user.user_id, "story deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Get the active quiz, answers included
async fn get_questions(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<QuizQuestion>>, ApiError> {
    managed_story(&state, &auth_user, id).await?;
    Ok(Json(quiz::list_questions(&state.pool, id).await?))
}

#[derive(Debug, Deserialize)]
struct ReplaceQuestionsRequest {
    questions: Vec<QuestionInput>,
}

/// Replace the whole quiz
///
/// Previous questions are retired, not deleted, so earlier submissions keep
/// their answers.
async fn replace_questions(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(body): Json<ReplaceQuestionsRequest>,
) -> Result<Json<Vec<QuizQuestion>>, ApiError> {
    managed_story(&state, &auth_user, id).await?;
    let rows = validate_questions(&body.questions)?;

    let mut tx = state.pool.begin().await?;
    let retired = quiz::retire_questions(&mut *tx, id).await?;
    let mut questions = Vec::with_capacity(rows.len());
    for row in &rows {
        questions.push(quiz::insert_question(&mut *tx, id, row).await?);
    }
    tx.commit().await?;

    tracing::info!(story_id = %id, retired, added = questions.len(), "quiz replaced");

    Ok(Json(questions))
}

/// Get quiz results for a story, newest first
async fn list_submissions(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Submission>>, ApiError> {
    managed_story(&state, &auth_user, id).await?;
    let (limit, offset) = page.resolve();
    Ok(Json(
        quiz::list_submissions(&state.pool, id, limit, offset).await?,
    ))
}
