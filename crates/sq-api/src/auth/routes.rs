use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch, post},
};
use axum_extra::extract::PrivateCookieJar;
use serde::Deserialize;
use sq_db::{
    models::User,
    repositories::{invitation, notification, user as user_repo},
};
use uuid::Uuid;

use super::{
    Role,
    cookies::{self, AUTH_COOKIE},
    jwt,
    middleware::AuthUser,
    password, validation,
};
use crate::{ApiState, error::ApiError, middleware::rate_limit, user::token};

pub fn routes() -> Router<ApiState> {
    use crate::make_rate_limit_layer;

    // Credential endpoints get the strict limit
    let credential_routes = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/invitations/accept", post(accept_invitation))
        .layer(make_rate_limit_layer!(
            rate_limit::AUTH_REPLENISH_MS,
            rate_limit::AUTH_BURST_SIZE
        ));

    let session_routes = Router::new()
        .route("/auth/me", get(auth_me))
        .route("/auth/logout", post(logout))
        .route("/auth/password", patch(change_password))
        .layer(make_rate_limit_layer!(
            rate_limit::GENERAL_REPLENISH_MS,
            rate_limit::GENERAL_BURST_SIZE
        ));

    Router::new().merge(credential_routes).merge(session_routes)
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn login(
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
    Json(body): Json<LoginRequest>,
) -> Result<(PrivateCookieJar, Json<User>), ApiError> {
    let email = validation::normalize_email(&body.email)?;
    if body.password.is_empty() {
        return Err(ApiError::Validation("Password is required".to_string()));
    }

    let credentials = user_repo::find_credentials_by_email(&state.pool, &email).await?;

    // Unknown accounts and pending invitations fail like a wrong password
    let Some((credentials, hash)) = credentials.and_then(|c| {
        let hash = c.password_hash.clone()?;
        Some((c, hash))
    }) else {
        password::verify_dummy(body.password).await;
        crate::metrics::record_auth_event("login", false);
        return Err(ApiError::Auth("Invalid email or password".to_string()));
    };

    if !password::verify_password(body.password, hash).await? {
        crate::metrics::record_auth_event("login", false);
        tracing::info!(user_id = %credentials.id, "login rejected: wrong password");
        return Err(ApiError::Auth("Invalid email or password".to_string()));
    }

    let role: Role = credentials.role.parse()?;
    let jar = issue_session(&state, jar, credentials.id, credentials.email, role)?;

    let user = user_repo::find_by_id(&state.pool, credentials.id)
        .await?
        .ok_or_else(|| ApiError::Auth("User not found".to_string()))?;

    crate::metrics::record_auth_event("login", true);
    tracing::info!(user_id = %user.id, "user logged in");

    Ok((jar, Json(user)))
}

fn issue_session(
    state: &ApiState,
    jar: PrivateCookieJar,
    user_id: Uuid,
    email: String,
    role: Role,
) -> Result<PrivateCookieJar, ApiError> {
    let token = jwt::generate_jwt_token(
        user_id,
        email,
        role,
        &state.auth.jwt_secret,
        state.auth.jwt_expiry_hours,
    )?;
    Ok(jar.add(cookies::create_auth_cookie(token, &state.cookies)))
}

async fn logout(
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, StatusCode) {
    let jar = jar.remove(cookies::removal_cookie(AUTH_COOKIE, &state.cookies));
    (jar, StatusCode::NO_CONTENT)
}

async fn auth_me(
    auth_user: AuthUser,
    State(state): State<ApiState>,
) -> Result<Json<User>, ApiError> {
    let user = user_repo::find_by_id(&state.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| ApiError::Auth("User not found".to_string()))?;

    Ok(Json(user))
}

#[derive(Debug, Deserialize)]
struct ChangePasswordRequest {
    current_password: String,
    new_password: String,
}

async fn change_password(
    auth_user: AuthUser,
    State(state): State<ApiState>,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, ApiError> {
    validation::validate_password(&body.new_password)?;

    let hash = user_repo::find_password_hash(&state.pool, auth_user.user_id)
        .await?
        .ok_or_else(|| ApiError::Auth("User not found".to_string()))?;

    if !password::verify_password(body.current_password, hash).await? {
        crate::metrics::record_auth_event("password_change", false);
        return Err(ApiError::Auth("Current password is incorrect".to_string()));
    }

    let new_hash = password::hash_password(body.new_password, state.bcrypt_cost).await?;
    if !user_repo::set_password(&state.pool, auth_user.user_id, &new_hash).await? {
        return Err(ApiError::Auth("User not found".to_string()));
    }

    crate::metrics::record_auth_event("password_change", true);
    tracing::info!(user_id = %auth_user.user_id, "password changed");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct AcceptInvitationRequest {
    token: String,
    password: String,
    display_name: Option<String>,
}

/// Set the invited user's password, notify admins and sign the user in.
async fn accept_invitation(
    State(state): State<ApiState>,
    jar: PrivateCookieJar,
    Json(body): Json<AcceptInvitationRequest>,
) -> Result<(PrivateCookieJar, Json<User>), ApiError> {
    if body.token.trim().is_empty() {
        return Err(ApiError::Validation("Invitation token is required".to_string()));
    }
    validation::validate_password(&body.password)?;
    let display_name = body
        .display_name
        .as_deref()
        .map(validation::validate_display_name)
        .transpose()?;

    let password_hash = password::hash_password(body.password, state.bcrypt_cost).await?;
    let token_hash = token::hash_token(body.token.trim());

    let mut tx = state.pool.begin().await?;

    let Some(pending) = invitation::find_pending_for_update(&mut *tx, &token_hash).await? else {
        crate::metrics::record_auth_event("invitation_accept", false);
        return Err(ApiError::Auth("Invalid or expired invitation".to_string()));
    };

    user_repo::set_password(&mut *tx, pending.user_id, &password_hash).await?;
    let display_name = display_name.unwrap_or_else(|| pending.display_name.clone());
    if display_name != pending.display_name {
        user_repo::update_profile(&mut *tx, pending.user_id, &display_name, None).await?;
    }
    invitation::mark_accepted(&mut *tx, pending.invitation_id).await?;

    let admins: Vec<_> = user_repo::active_admin_ids(&mut *tx)
        .await?
        .into_iter()
        .filter(|id| *id != pending.user_id)
        .collect();
    notification::insert_many(
        &mut *tx,
        &admins,
        "invitation_accepted",
        &format!("{display_name} ({}) accepted their invitation", pending.email),
        Some("/users"),
    )
    .await?;

    tx.commit().await?;

    crate::metrics::record_auth_event("invitation_accept", true);
    tracing::info!(user_id = %pending.user_id, "invitation accepted");

    let role: Role = pending.role.parse()?;
    let jar = issue_session(&state, jar, pending.user_id, pending.email, role)?;

    let user = user_repo::find_by_id(&state.pool, pending.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok((jar, Json(user)))
}
