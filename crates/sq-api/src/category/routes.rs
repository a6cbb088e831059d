use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use sq_db::{models::Category, repositories::category as category_repo};
use uuid::Uuid;

use crate::{
    ApiState,
    auth::{AdminUser, AuthUser},
    error::ApiError,
    middleware::rate_limit,
    validation::{optional_text, required_text},
};

const MAX_NAME_CHARS: usize = 80;
const MAX_DESCRIPTION_CHARS: usize = 500;

/// Create the category routes
pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    Router::new()
        .route("/categories", get(list_categories))
        .route("/categories", post(create_category))
        .route("/categories/{id}", get(get_category))
        .route("/categories/{id}", put(update_category))
        .route("/categories/{id}", delete(delete_category))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_REPLENISH_MS,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

#[derive(Debug, Deserialize)]
struct CategoryInput {
    name: String,
    description: Option<String>,
}

impl CategoryInput {
    fn validate(&self) -> Result<(String, Option<String>), ApiError> {
        Ok((
            required_text("Name", &self.name, MAX_NAME_CHARS)?,
            optional_text(
                "Description",
                self.description.as_deref(),
                MAX_DESCRIPTION_CHARS,
            )?,
        ))
    }
}

/// Get all categories
async fn list_categories(
    _auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(category_repo::list(&state.pool).await?))
}

/// Get category by ID
async fn get_category(
    _auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, ApiError> {
    category_repo::find_by_id(&state.pool, id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))
}

/// Create a new category
async fn create_category(
    AdminUser(admin): AdminUser,
    State(state): State<ApiState>,
    Json(body): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let (name, description) = body.validate()?;

    let category =
        category_repo::create(&state.pool, &name, description.as_deref(), admin.user_id)
            .await
            .map_err(duplicate_name)?;

    tracing::info!(category_id = %category.id, "category created");

    Ok((StatusCode::CREATED, Json(category)))
}

/// Update an existing category
async fn update_category(
    _admin: AdminUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CategoryInput>,
) -> Result<Json<Category>, ApiError> {
    let (name, description) = body.validate()?;

    category_repo::update(&state.pool, id, &name, description.as_deref())
        .await
        .map_err(duplicate_name)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Category not found".to_string()))
}

/// Delete a category
///
/// Content in the category keeps existing; its category is hidden from lists.
async fn delete_category(
    _admin: AdminUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !category_repo::soft_delete(&state.pool, id).await? {
        return Err(ApiError::NotFound("Category not found".to_string()));
    }

    tracing::info!(category_id = %id, "category deleted");

    Ok(StatusCode::NO_CONTENT)
}

fn duplicate_name(e: sqlx::Error) -> ApiError {
    match ApiError::from(e) {
        err if err.status() == StatusCode::CONFLICT => {
            ApiError::Conflict("A category with this name already exists".to_string())
        }
        err => err,
    }
}
