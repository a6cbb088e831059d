use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde_json::json;

use crate::{
    auth, category, code, error::ApiError, media, mystery_box, notification, play,
    state::ApiState, story, user, word_search,
};

pub fn router() -> Router<ApiState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(auth::routes())
        .merge(user::routes())
        .merge(category::routes())
        .merge(story::routes())
        .merge(word_search::routes())
        .merge(mystery_box::routes())
        .merge(code::routes())
        .merge(play::routes())
        .merge(notification::routes())
        .merge(media::routes())
        .fallback(handler_404)
}

/// Liveness: the process is up
async fn health() -> StatusCode {
    StatusCode::OK
}

/// Readiness: the database answers
async fn readiness(State(state): State<ApiState>) -> Result<StatusCode, ApiError> {
    sq_db::ping(&state.pool).await.map_err(|e| {
        tracing::warn!("Readiness check failed: {e}");
        ApiError::ServiceUnavailable("Database unavailable".to_string())
    })?;
    Ok(StatusCode::OK)
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "The requested resource was not found" })),
    )
}
