use axum::{Json, Router, extract::State, routing::post};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{MediaService, ResourceType, SignedUpload};
use crate::{ApiState, auth::AuthUser, error::ApiError, middleware::rate_limit};

pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    Router::new()
        .route("/media/signature", post(sign_upload))
        .route("/media/destroy", post(destroy))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_REPLENISH_MS,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

fn media(state: &ApiState) -> Result<&MediaService, ApiError> {
    state.media.as_ref().ok_or_else(|| {
        ApiError::ServiceUnavailable("Media uploads are not configured".to_string())
    })
}

#[derive(Debug, Deserialize)]
struct SignatureRequest {
    resource_type: ResourceType,
    folder: Option<String>,
}

async fn sign_upload(
    _auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(body): Json<SignatureRequest>,
) -> Result<Json<SignedUpload>, ApiError> {
    let upload = media(&state)?.sign_upload(
        body.resource_type,
        body.folder.as_deref(),
        Utc::now().timestamp(),
    )?;
    Ok(Json(upload))
}

#[derive(Debug, Deserialize)]
struct DestroyRequest {
    public_id: String,
    resource_type: ResourceType,
}

#[derive(Debug, Serialize)]
struct DestroyResult {
    result: String,
}

async fn destroy(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(body): Json<DestroyRequest>,
) -> Result<Json<DestroyResult>, ApiError> {
    let media = media(&state)?;
    let public_id = body.public_id.trim();

    if !media.owns_public_id(public_id) {
        return Err(ApiError::Forbidden(
            "Asset is outside the application's media folder".to_string(),
        ));
    }

    let result = media
        .destroy(body.resource_type, public_id, Utc::now().timestamp())
        .await?;

    tracing::info!(user_id = %auth_user.user_id, public_id, result = %result, "media asset destroyed");

    Ok(Json(DestroyResult { result }))
}
