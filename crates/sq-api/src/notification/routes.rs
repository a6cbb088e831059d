use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use sq_db::{models::Notification, repositories::notification as notification_repo};
use uuid::Uuid;

use crate::{
    ApiState, auth::AuthUser, error::ApiError, middleware::rate_limit, validation::Pagination,
};

pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    Router::new()
        .route("/notifications", get(list_notifications))
        .route("/notifications/unread-count", get(unread_count))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{id}/read", post(mark_read))
        .route("/notifications/{id}", delete(delete_notification))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_REPLENISH_MS,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    #[serde(default)]
    unread_only: bool,
    limit: Option<i64>,
    offset: Option<i64>,
}

async fn list_notifications(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Notification>>, ApiError> {
    let (limit, offset) = Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .resolve();

    let notifications = notification_repo::list(
        &state.pool,
        auth_user.user_id,
        query.unread_only,
        limit,
        offset,
    )
    .await?;
    Ok(Json(notifications))
}

#[derive(Debug, Serialize)]
struct UnreadCount {
    unread: i64,
}

async fn unread_count(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<UnreadCount>, ApiError> {
    let unread = notification_repo::unread_count(&state.pool, auth_user.user_id).await?;
    Ok(Json(UnreadCount { unread }))
}

async fn mark_read(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !notification_repo::mark_read(&state.pool, auth_user.user_id, id).await? {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
struct MarkedRead {
    updated: u64,
}

async fn mark_all_read(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<MarkedRead>, ApiError> {
    let updated = notification_repo::mark_all_read(&state.pool, auth_user.user_id).await?;
    Ok(Json(MarkedRead { updated }))
}

async fn delete_notification(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !notification_repo::soft_delete(&state.pool, auth_user.user_id, id).await? {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}
