use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use rand::Rng;
use serde::Deserialize;
use sq_db::{models::WordSearchGame, repositories::word_search as game_repo};
use uuid::Uuid;

use super::{PuzzlePreview, validate_words};
use crate::{
    ApiState,
    auth::AuthUser,
    category,
    error::ApiError,
    middleware::rate_limit,
    validation::{Pagination, required_text},
};

const MAX_TITLE_CHARS: usize = 200;

/// Create the word-search game routes
pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    Router::new()
        .route("/word-search-games", get(list_games))
        .route("/word-search-games", post(create_game))
        .route("/word-search-games/preview", post(preview_words))
        .route("/word-search-games/{id}", get(get_game))
        .route("/word-search-games/{id}", put(update_game))
        .route("/word-search-games/{id}", delete(delete_game))
        .route("/word-search-games/{id}/preview", get(preview_game))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_REPLENISH_MS,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

#[derive(Debug, Deserialize)]
struct GameRequest {
    title: String,
    category_id: Option<Uuid>,
    words: Vec<String>,
}

impl GameRequest {
    async fn validate(&self, state: &ApiState) -> Result<(String, Vec<String>), ApiError> {
        let title = required_text("Title", &self.title, MAX_TITLE_CHARS)?;
        let words = validate_words(&self.words, &state.puzzle)?;
        category::ensure_exists(&state.pool, self.category_id).await?;
        Ok((title, words))
    }
}

/// Get word-search games; teachers see their own
async fn list_games(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<WordSearchGame>>, ApiError> {
    let (limit, offset) = page.resolve();
    let created_by = (!auth_user.is_admin()).then_some(auth_user.user_id);
    Ok(Json(
        game_repo::list(&state.pool, created_by, limit, offset).await?,
    ))
}

async fn managed_game(
    state: &ApiState,
    auth_user: &AuthUser,
    id: Uuid,
) -> Result<WordSearchGame, ApiError> {
    let game = game_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Word search not found".to_string()))?;
    auth_user.ensure_can_manage(game.created_by)?;
    Ok(game)
}

/// Get word-search game by ID
async fn get_game(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<WordSearchGame>, ApiError> {
    Ok(Json(managed_game(&state, &auth_user, id).await?))
}

/// Create a new word-search game
async fn create_game(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(body): Json<GameRequest>,
) -> Result<(StatusCode, Json<WordSearchGame>), ApiError> {
    let (title, words) = body.validate(&state).await?;

    let game = game_repo::create(
        &state.pool,
        &title,
        body.category_id,
        &words,
        auth_user.user_id,
    )
    .await?;

    tracing::info!(game_id = %game.id, words = words.len(), "word search created");

    Ok((StatusCode::CREATED, Json(game)))
}

/// Update an existing word-search game
async fn update_game(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(body): Json<GameRequest>,
) -> Result<Json<WordSearchGame>, ApiError> {
    managed_game(&state, &auth_user, id).await?;
    let (title, words) = body.validate(&state).await?;

    game_repo::update(&state.pool, id, &title, body.category_id, &words)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Word search not found".to_string()))
}

/// Delete a word-search game
async fn delete_game(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    managed_game(&state, &auth_user, id).await?;
    game_repo::soft_delete(&state.pool, id).await?;

    tracing::info!(game_id = %id, deleted_by = %auth_user.user_id, "word search deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct SeedQuery {
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct PreviewRequest {
    words: Vec<String>,
    seed: Option<u64>,
}

/// Kept below 2^32 so the seed survives a round-trip through JavaScript.
fn pick_seed(seed: Option<u64>) -> u64 {
    seed.unwrap_or_else(|| u64::from(rand::thread_rng().r#gen::<u32>()))
}

fn preview(state: &ApiState, words: &[String], seed: u64) -> PuzzlePreview {
    let puzzle = sq_wordsearch::generate(words, seed, &state.puzzle);
    crate::metrics::record_puzzle_generated(puzzle.placements().len(), puzzle.skipped().len());
    PuzzlePreview::new(&puzzle, seed)
}

/// Preview an unsaved word list
async fn preview_words(
    _auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(body): Json<PreviewRequest>,
) -> Result<Json<PuzzlePreview>, ApiError> {
    let words = validate_words(&body.words, &state.puzzle)?;
    Ok(Json(preview(&state, &words, pick_seed(body.seed))))
}

/// Preview a saved game, optionally with a fixed seed
async fn preview_game(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SeedQuery>,
) -> Result<Json<PuzzlePreview>, ApiError> {
    let game = managed_game(&state, &auth_user, id).await?;
    Ok(Json(preview(&state, &game.words, pick_seed(query.seed))))
}
