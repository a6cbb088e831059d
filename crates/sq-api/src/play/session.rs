use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, Key},
};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    auth::cookies::{PLAY_SESSION_COOKIE, build_cookie},
    code::ContentKind,
    error::ApiError,
    state::CookieConfig,
};

/// A redeemed code, carried in the encrypted `play_session` cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaySession {
    pub code_id: Uuid,
    pub content_kind: ContentKind,
    pub content_id: Uuid,
    pub student_name: String,
    /// Unix seconds. Checked server-side since the cookie could be replayed.
    pub expires_at: i64,
}

impl PlaySession {
    pub fn new(
        code_id: Uuid,
        content_kind: ContentKind,
        content_id: Uuid,
        student_name: String,
        hours: i64,
    ) -> Self {
        Self {
            code_id,
            content_kind,
            content_id,
            student_name,
            expires_at: (Utc::now() + Duration::hours(hours)).timestamp(),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().timestamp()
    }

    /// The session, or 400 when the student is playing something else.
    pub fn expect_kind(&self, kind: ContentKind) -> Result<&Self, ApiError> {
        if self.content_kind == kind {
            Ok(self)
        } else {
            Err(ApiError::Validation(format!(
                "The current code opens a {}, not a {}",
                self.content_kind, kind
            )))
        }
    }

    pub fn to_cookie(&self, config: &CookieConfig) -> Result<Cookie<'static>, ApiError> {
        let value = serde_json::to_string(self)
            .map_err(|e| ApiError::Cookie(format!("Failed to serialize play session: {e}")))?;
        Ok(build_cookie(
            PLAY_SESSION_COOKIE,
            value,
            time::Duration::hours(config.play_session_hours),
            config,
        ))
    }

    fn from_cookie_value(value: &str) -> Option<Self> {
        serde_json::from_str::<Self>(value)
            .ok()
            .filter(|session| !session.is_expired())
    }
}

impl<S> FromRequestParts<S> for PlaySession
where
    Key: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Auth("Failed to read cookies".to_string()))?;

        jar.get(PLAY_SESSION_COOKIE)
            .and_then(|cookie| Self::from_cookie_value(cookie.value()))
            .ok_or_else(|| ApiError::Auth("Enter your access code to start".to_string()))
    }
}
