use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sq_db::{
    models::{AccessCode, AccessCodeFilter},
    repositories::access_code,
};
use uuid::Uuid;

use super::{ContentKind, find_content, generator};
use crate::{
    ApiState,
    auth::AuthUser,
    error::ApiError,
    middleware::rate_limit,
    validation::{Pagination, optional_text},
};

pub const MAX_BATCH_SIZE: u32 = 200;
const MAX_LABEL_CHARS: usize = 100;
/// Attempts per code before giving up on finding an unused one
const MAX_COLLISION_RETRIES: usize = 5;

pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    Router::new()
        .route("/codes", get(list_codes))
        .route("/codes", post(generate_codes))
        .route("/codes/{id}", get(get_code))
        .route("/codes/{id}", delete(revoke_code))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_REPLENISH_MS,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

#[derive(Debug, Deserialize)]
struct GenerateCodesRequest {
    content_kind: ContentKind,
    content_id: Uuid,
    #[serde(default = "default_count")]
    count: u32,
    label: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

const fn default_count() -> u32 {
    1
}

/// Generate a batch of codes for one piece of content
async fn generate_codes(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(body): Json<GenerateCodesRequest>,
) -> Result<(StatusCode, Json<Vec<AccessCode>>), ApiError> {
    if !(1..=MAX_BATCH_SIZE).contains(&body.count) {
        return Err(ApiError::Validation(format!(
            "Count must be between 1 and {MAX_BATCH_SIZE}"
        )));
    }
    if body.expires_at.is_some_and(|at| at <= Utc::now()) {
        return Err(ApiError::Validation(
            "Expiry must be in the future".to_string(),
        ));
    }
    let label = optional_text("Label", body.label.as_deref(), MAX_LABEL_CHARS)?;

    let content = find_content(&state.pool, body.content_kind, body.content_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Content not found".to_string()))?;
    auth_user.ensure_can_manage(content.owner)?;
    if !content.published {
        return Err(ApiError::Validation(
            "Publish the story before generating codes for it".to_string(),
        ));
    }

    let mut tx = state.pool.begin().await?;
    let mut codes = Vec::with_capacity(body.count as usize);

    for _ in 0..body.count {
        let mut inserted = None;
        for _ in 0..MAX_COLLISION_RETRIES {
            let candidate = generator::generate_code(&mut rand::thread_rng());
            inserted = access_code::try_insert(
                &mut *tx,
                &candidate,
                body.content_kind.as_str(),
                body.content_id,
                label.as_deref(),
                auth_user.user_id,
                body.expires_at,
            )
            .await?;
            if inserted.is_some() {
                break;
            }
            tracing::debug!("access code collision, retrying");
        }

        codes.push(inserted.ok_or_else(|| {
            ApiError::Internal("Could not find an unused access code".to_string())
        })?);
    }

    tx.commit().await?;

    crate::metrics::record_codes_generated(body.content_kind.as_str(), codes.len());
    tracing::info!(
        content_kind = %body.content_kind,
        content_id = %body.content_id,
        count = codes.len(),
        "access codes generated"
    );

    Ok((StatusCode::CREATED, Json(codes)))
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum CodeStatus {
    Unused,
    Used,
    Expired,
}

impl CodeStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Unused => "unused",
            Self::Used => "used",
            Self::Expired => "expired",
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListCodesQuery {
    content_kind: Option<ContentKind>,
    content_id: Option<Uuid>,
    status: Option<CodeStatus>,
    limit: Option<i64>,
    offset: Option<i64>,
}

/// List codes; teachers only see codes they generated
async fn list_codes(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Query(query): Query<ListCodesQuery>,
) -> Result<Json<Vec<AccessCode>>, ApiError> {
    let (limit, offset) = Pagination {
        limit: query.limit,
        offset: query.offset,
    }
    .resolve();

    let filter = AccessCodeFilter {
        created_by: (!auth_user.is_admin()).then_some(auth_user.user_id),
        content_kind: query.content_kind.map(|k| k.as_str().to_string()),
        content_id: query.content_id,
        status: query.status.map(|s| s.as_str().to_string()),
        limit,
        offset,
    };

    Ok(Json(access_code::list(&state.pool, &filter).await?))
}

async fn get_code(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AccessCode>, ApiError> {
    let code = access_code::find_by_id(&state.pool, id)
        .await?
        .filter(|c| auth_user.can_manage(c.created_by))
        .ok_or_else(|| ApiError::NotFound("Access code not found".to_string()))?;

    Ok(Json(code))
}

/// Revoke a code so it can no longer be redeemed
async fn revoke_code(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let code = access_code::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Access code not found".to_string()))?;
    auth_user.ensure_can_manage(code.created_by)?;

    access_code::soft_delete(&state.pool, id).await?;

    tracing::info!(code_id = %id, revoked_by = %auth_user.user_id, "access code revoked");

    Ok(StatusCode::NO_CONTENT)
}
