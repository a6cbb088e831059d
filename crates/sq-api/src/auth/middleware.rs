use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use sq_db::{models::User, repositories::user as user_repo};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Role, cookies::AUTH_COOKIE, jwt::verify_jwt_token};
use crate::{error::ApiError, state::AuthConfig};

/// Authenticated user extractor
///
/// Use this in route handlers to ensure the user is signed in.
/// It validates the JWT token from the encrypted `auth_token` cookie, then
/// loads the account so that deleted users lose access at once and role
/// changes apply to the next request. Email and role come from the database,
/// not the token.
///
/// # Example
/// ```
/// use axum::extract::State;
/// use sq_api::{error::ApiError, auth::AuthUser, ApiState};
///
/// async fn protected_route(
///     auth_user: AuthUser,
///     State(state): State<ApiState>,
/// ) -> Result<(), ApiError> {
///     // auth_user.user_id, auth_user.email and auth_user.role are available
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// Admins manage everything; teachers manage what they created.
    pub fn can_manage(&self, owner: Option<Uuid>) -> bool {
        self.is_admin() || owner == Some(self.user_id)
    }

    /// [`can_manage`](Self::can_manage) as a 403.
    pub fn ensure_can_manage(&self, owner: Option<Uuid>) -> Result<(), ApiError> {
        if self.can_manage(owner) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "You do not have permission to modify this content".to_string(),
            ))
        }
    }

    /// Build the session user from the account row the token points at.
    ///
    /// Missing, deleted and not-yet-activated accounts are rejected with 401.
    pub fn from_account(account: Option<User>) -> Result<Self, ApiError> {
        let account = account
            .filter(|user| user.active)
            .ok_or_else(|| ApiError::Auth("Session is no longer valid".to_string()))?;

        let role = account
            .role
            .parse::<Role>()
            .map_err(|_| ApiError::Internal(format!("unknown role {:?}", account.role)))?;

        Ok(Self {
            user_id: account.id,
            email: account.email,
            role,
        })
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    AuthConfig: FromRef<S>,
    Key: FromRef<S>,
    PgPool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_config = AuthConfig::from_ref(state);

        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Auth("Failed to read cookies".to_string()))?;

        let token = jar
            .get(AUTH_COOKIE)
            .ok_or(ApiError::Auth("Not authenticated".to_string()))?
            .value()
            .to_owned();

        let claims = verify_jwt_token(&token, &auth_config.jwt_secret)?;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::Auth("Invalid user ID in token".to_string()))?;

        let pool = PgPool::from_ref(state);
        let account = user_repo::find_by_id(&pool, user_id).await?;
        if account.is_none() {
            tracing::debug!(%user_id, "session rejected: account missing or deleted");
        }

        Self::from_account(account)
    }
}

/// An [`AuthUser`] whose role is `admin`; anyone else gets 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

impl<S> FromRequestParts<S> for AdminUser
where
    AuthConfig: FromRef<S>,
    Key: FromRef<S>,
    PgPool: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            return Err(ApiError::Forbidden("Admin access required".to_string()));
        }
        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn account(role: &str, active: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "stored@example.com".to_string(),
            display_name: "Stored".to_string(),
            role: role.to_string(),
            avatar_url: None,
            active,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_from_account_uses_stored_role() {
        let stored = account("teacher", true);
        let id = stored.id;
        let user = AuthUser::from_account(Some(stored)).unwrap();
        assert_eq!(user.user_id, id);
        assert_eq!(user.role, Role::Teacher);
        assert_eq!(user.email, "stored@example.com");
    }

    #[test]
    fn test_from_account_rejects_missing_and_pending() {
        assert!(matches!(
            AuthUser::from_account(None),
            Err(ApiError::Auth(_))
        ));
        assert!(matches!(
            AuthUser::from_account(Some(account("admin", false))),
            Err(ApiError::Auth(_))
        ));
        assert!(matches!(
            AuthUser::from_account(Some(account("owner", true))),
            Err(ApiError::Internal(_))
        ));
    }

    fn user(role: Role) -> AuthUser {
        AuthUser {
            user_id: Uuid::new_v4(),
            email: "someone@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_teacher_manages_only_own_content() {
        let teacher = user(Role::Teacher);
        assert!(teacher.can_manage(Some(teacher.user_id)));
        assert!(!teacher.can_manage(Some(Uuid::new_v4())));
        assert!(!teacher.can_manage(None));
        assert!(matches!(
            teacher.ensure_can_manage(None),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn test_admin_manages_everything() {
        let admin = user(Role::Admin);
        assert!(admin.can_manage(Some(Uuid::new_v4())));
        assert!(admin.can_manage(None));
    }
}
