use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use sq_db::{
    models::{MysteryBoxGame, MysteryBoxItem, MysteryBoxItemInsert},
    repositories::mystery_box as game_repo,
};
use uuid::Uuid;

use crate::{
    ApiState,
    auth::AuthUser,
    category,
    error::ApiError,
    middleware::rate_limit,
    validation::{Pagination, optional_text, optional_url, required_text},
};

const MAX_TITLE_CHARS: usize = 200;
const MAX_WORD_CHARS: usize = 60;
const MAX_HINT_CHARS: usize = 300;
pub const MAX_ITEMS: usize = 40;

/// Create the mystery-box game routes
pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    Router::new()
        .route("/mystery-box-games", get(list_games))
        .route("/mystery-box-games", post(create_game))
        .route("/mystery-box-games/{id}", get(get_game))
        .route("/mystery-box-games/{id}", put(update_game))
        .route("/mystery-box-games/{id}", delete(delete_game))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_REPLENISH_MS,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

#[derive(Debug, Deserialize)]
struct ItemInput {
    word: String,
    hint: Option<String>,
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GameRequest {
    title: String,
    category_id: Option<Uuid>,
    items: Vec<ItemInput>,
}

impl GameRequest {
    async fn validate(
        &self,
        state: &ApiState,
    ) -> Result<(String, Vec<MysteryBoxItemInsert>), ApiError> {
        let title = required_text("Title", &self.title, MAX_TITLE_CHARS)?;

        if self.items.is_empty() || self.items.len() > MAX_ITEMS {
            return Err(ApiError::Validation(format!(
                "A mystery box needs between 1 and {MAX_ITEMS} items"
            )));
        }

        let items = self
            .items
            .iter()
            .enumerate()
            .map(|(position, item)| {
                let label = format!("Box {}", position + 1);
                Ok(MysteryBoxItemInsert {
                    position: position as i32,
                    word: required_text(&format!("{label} word"), &item.word, MAX_WORD_CHARS)?,
                    hint: optional_text(
                        &format!("{label} hint"),
                        item.hint.as_deref(),
                        MAX_HINT_CHARS,
                    )?,
                    image_url: optional_url(
                        &format!("{label} image URL"),
                        item.image_url.as_deref(),
                    )?,
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        category::ensure_exists(&state.pool, self.category_id).await?;
        Ok((title, items))
    }
}

/// A game with its boxes in order.
#[derive(Debug, Serialize)]
pub struct GameWithItems {
    #[serde(flatten)]
    pub game: MysteryBoxGame,
    pub items: Vec<MysteryBoxItem>,
}

/// Get mystery-box games; teachers see their own
async fn list_games(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<MysteryBoxGame>>, ApiError> {
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
) -> Result<MysteryBoxGame, ApiError> {
    let game = game_repo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Mystery box not found".to_string()))?;
    auth_user.ensure_can_manage(game.created_by)?;
    Ok(game)
}

/// Get mystery-box game by ID, with its items
async fn get_game(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameWithItems>, ApiError> {
    let game = managed_game(&state, &auth_user, id).await?;
    let items = game_repo::list_items(&state.pool, id).await?;
    Ok(Json(GameWithItems { game, items }))
}

/// Create a new mystery-box game
async fn create_game(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(body): Json<GameRequest>,
) -> Result<(StatusCode, Json<GameWithItems>), ApiError> {
    let (title, inserts) = body.validate(&state).await?;

    let mut tx = state.pool.begin().await?;
    let game = game_repo::create(&mut *tx, &title, body.category_id, auth_user.user_id).await?;
    let mut items = Vec::with_capacity(inserts.len());
    for insert in &inserts {
        items.push(game_repo::insert_item(&mut *tx, game.id, insert).await?);
    }
    tx.commit().await?;

    tracing::info!(game_id = %game.id, items = items.len(), "mystery box created");

    Ok((StatusCode::CREATED, Json(GameWithItems { game, items })))
}

/// Update a game, replacing its whole item set
async fn update_game(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(body): Json<GameRequest>,
) -> Result<Json<GameWithItems>, ApiError> {
    managed_game(&state, &auth_user, id).await?;
    let (title, inserts) = body.validate(&state).await?;

    let mut tx = state.pool.begin().await?;
    let game = game_repo::update(&mut *tx, id, &title, body.category_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Mystery box not found".to_string()))?;
    game_repo::retire_items(&mut *tx, id).await?;
    let mut items = Vec::with_capacity(inserts.len());
    for insert in &inserts {
        items.push(game_repo::insert_item(&mut *tx, id, insert).await?);
    }
    tx.commit().await?;

    Ok(Json(GameWithItems { game, items }))
}

/// Delete a mystery-box game
async fn delete_game(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    managed_game(&state, &auth_user, id).await?;
    game_repo::soft_delete(&state.pool, id).await?;

    tracing::info!(game_id = %id, deleted_by = %auth_user.user_id, "mystery box deleted");

    Ok(StatusCode::NO_CONTENT)
}
