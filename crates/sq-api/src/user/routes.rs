use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sq_db::{
    models::User,
    repositories::{invitation, user as user_repo},
};
use uuid::Uuid;

use super::token;
use crate::{
    ApiState,
    auth::{AdminUser, AuthUser, Role, validation},
    error::ApiError,
    middleware::rate_limit,
    validation::{Pagination, optional_url},
};

pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    Router::new()
        .route("/users", get(list_users))
        .route("/users/invite", post(invite_user))
        .route("/users/me", patch(update_me))
        .route("/users/{id}/invite", post(resend_invitation))
        .route("/users/{id}/role", patch(change_role))
        .route("/users/{id}", delete(delete_user))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_REPLENISH_MS,
            rate_limit::GENERAL_BURST_SIZE
        ))
}

async fn list_users(
    _admin: AdminUser,
    State(state): State<ApiState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<User>>, ApiError> {
    let (limit, offset) = page.resolve();
    let users = user_repo::list_users(&state.pool, limit, offset).await?;
    Ok(Json(users))
}

#[derive(Debug, Deserialize)]
struct InviteRequest {
    email: String,
    display_name: String,
    role: Role,
}

#[derive(Debug, Serialize)]
struct InvitationResponse {
    user: User,
    /// Shareable by hand when email is not configured or failed
    invitation_url: String,
    email_sent: bool,
}

async fn invite_user(
    AdminUser(admin): AdminUser,
    State(state): State<ApiState>,
    Json(body): Json<InviteRequest>,
) -> Result<(StatusCode, Json<InvitationResponse>), ApiError> {
    let email = validation::normalize_email(&body.email)?;
    let display_name = validation::validate_display_name(&body.display_name)?;

    if user_repo::email_exists(&state.pool, &email).await? {
        return Err(ApiError::Conflict(
            "A user with this email already exists".to_string(),
        ));
    }

    let invite_token = token::generate_token();

    let mut tx = state.pool.begin().await?;
    let user_id =
        user_repo::create_user(&mut *tx, &email, &display_name, body.role.as_str(), None).await?;
    invitation::insert_invitation(
        &mut *tx,
        user_id,
        admin.user_id,
        &token::hash_token(&invite_token),
        invitation_expiry(&state),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(%user_id, invited_by = %admin.user_id, role = %body.role, "user invited");

    let user = user_repo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| ApiError::Internal("Invited user vanished".to_string()))?;

    let response = deliver_invitation(&state, &admin, user, invite_token).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Replace a pending user's invitation with a fresh one.
async fn resend_invitation(
    AdminUser(admin): AdminUser,
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<InvitationResponse>, ApiError> {
    let user = user_repo::find_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    if user.active {
        return Err(ApiError::Conflict(
            "This user has already accepted their invitation".to_string(),
        ));
    }

    let invite_token = token::generate_token();

    let mut tx = state.pool.begin().await?;
    invitation::revoke_open_invitations(&mut *tx, user_id).await?;
    invitation::insert_invitation(
        &mut *tx,
        user_id,
        admin.user_id,
        &token::hash_token(&invite_token),
        invitation_expiry(&state),
    )
    .await?;
    tx.commit().await?;

    tracing::info!(%user_id, invited_by = %admin.user_id, "invitation re-issued");

    let response = deliver_invitation(&state, &admin, user, invite_token).await?;
    Ok(Json(response))
}

fn invitation_expiry(state: &ApiState) -> chrono::DateTime<Utc> {
    Utc::now() + chrono::Duration::hours(state.invitation_expiry_hours)
}

/// Email the invitation when SMTP is configured. A failed send is logged,
/// not returned: the admin still gets the link to share.
async fn deliver_invitation(
    state: &ApiState,
    admin: &AuthUser,
    user: User,
    invite_token: String,
) -> Result<InvitationResponse, ApiError> {
    let invitation_url = token::invitation_url(&state.frontend_url, &invite_token);

    let email_sent = match state.email_service.clone() {
        Some(email_service) => {
            let inviter_name = user_repo::find_by_id(&state.pool, admin.user_id)
                .await?
                .map_or_else(|| "An administrator".to_string(), |a| a.display_name);
            let to_email = user.email.clone();
            let display_name = user.display_name.clone();
            let expiry_hours = state.invitation_expiry_hours;

            let result = tokio::task::spawn_blocking(move || {
                email_service.send_invitation_email(
                    &to_email,
                    &display_name,
                    &inviter_name,
                    &invite_token,
                    expiry_hours,
                )
            })
            .await
            .map_err(|e| ApiError::Internal(format!("Email task failed: {e}")))?;

            match result {
                Ok(()) => {
                    crate::metrics::record_email_event("invitation", true);
                    true
                }
                Err(e) => {
                    crate::metrics::record_email_event("invitation", false);
                    tracing::error!(user_id = %user.id, "Failed to send invitation email: {e}");
                    false
                }
            }
        }
        None => false,
    };

    Ok(InvitationResponse {
        user,
        invitation_url,
        email_sent,
    })
}

#[derive(Debug, Deserialize)]
struct ChangeRoleRequest {
    role: Role,
}

async fn change_role(
    AdminUser(admin): AdminUser,
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
    Json(body): Json<ChangeRoleRequest>,
) -> Result<Json<User>, ApiError> {
    if user_id == admin.user_id {
        return Err(ApiError::Validation(
            "You cannot change your own role".to_string(),
        ));
    }

    let user = user_repo::update_role(&state.pool, user_id, body.role.as_str())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    tracing::info!(%user_id, changed_by = %admin.user_id, role = %body.role, "user role changed");

    Ok(Json(user))
}

async fn delete_user(
    AdminUser(admin): AdminUser,
    State(state): State<ApiState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if user_id == admin.user_id {
        return Err(ApiError::Validation(
            "You cannot delete your own account".to_string(),
        ));
    }

    if !user_repo::soft_delete(&state.pool, user_id).await? {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    tracing::info!(%user_id, deleted_by = %admin.user_id, "user deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct UpdateProfileRequest {
    display_name: String,
    avatar_url: Option<String>,
}

async fn update_me(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<User>, ApiError> {
    let display_name = validation::validate_display_name(&body.display_name)?;
    let avatar_url = optional_url("Avatar URL", body.avatar_url.as_deref())?;

    let user = user_repo::update_profile(
        &state.pool,
        auth_user.user_id,
        &display_name,
        avatar_url.as_deref(),
    )
    .await?
    .ok_or_else(|| ApiError::Auth("User not found".to_string()))?;

    Ok(Json(user))
}
