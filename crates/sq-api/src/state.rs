use anyhow::Context;
use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use sq_wordsearch::PuzzleConfig;
use sqlx::PgPool;

use crate::{ApiConfig, config::Environment, media::MediaService, user::email::EmailService};

/// Settings needed to issue and verify access tokens.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
}

/// Settings shared by every cookie the API sets.
#[derive(Clone, Debug)]
pub struct CookieConfig {
    pub environment: Environment,
    pub domain: Option<String>,
    pub auth_expiry_hours: i64,
    pub play_session_hours: i64,
}

#[derive(Clone)]
pub struct ApiState {
    pub pool: PgPool,
    pub auth: AuthConfig,
    pub cookies: CookieConfig,
    pub cookie_key: Key,
    pub environment: Environment,
    pub frontend_url: String,
    pub bcrypt_cost: u32,
    pub invitation_expiry_hours: i64,
    pub email_service: Option<EmailService>,
    pub media: Option<MediaService>,
    pub puzzle: PuzzleConfig,
}

impl ApiState {
    pub fn new(config: &ApiConfig, pool: PgPool) -> anyhow::Result<Self> {
        let cookie_key = Key::try_from(config.cookie_secret.as_bytes())
            .context("COOKIE_SECRET is not valid key material")?;

        // Initialize email service if SMTP is configured
        let email_service = if let (
            Some(host),
            Some(username),
            Some(password),
            Some(from_email),
            Some(from_name),
        ) = (
            config.smtp_host.as_ref(),
            config.smtp_username.as_ref(),
            config.smtp_password.as_ref(),
            config.smtp_from_email.as_ref(),
            config.smtp_from_name.as_ref(),
        ) {
            match EmailService::new(
                host,
                username,
                password,
                from_email,
                from_name,
                &config.frontend_url,
            ) {
                Ok(service) => Some(service),
                Err(e) => {
                    tracing::error!("Failed to initialize email service: {e}");
                    None
                }
            }
        } else {
            tracing::warn!("Email service not configured (missing SMTP environment variables)");
            None
        };

        let media = match (
            config.media_cloud_name.as_ref(),
            config.media_api_key.as_ref(),
            config.media_api_secret.as_ref(),
        ) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(MediaService::new(
                cloud_name,
                api_key,
                api_secret,
                &config.media_folder,
            )?),
            _ => {
                tracing::warn!("Media provider not configured (missing MEDIA_* environment variables)");
                None
            }
        };

        Ok(Self {
            pool,
            auth: AuthConfig {
                jwt_secret: config.jwt_secret.clone(),
                jwt_expiry_hours: config.jwt_expiry_hours,
            },
            cookies: CookieConfig {
                environment: config.env.clone(),
                domain: config.cookie_domain.clone(),
                auth_expiry_hours: config.jwt_expiry_hours,
                play_session_hours: config.play_session_hours,
            },
            cookie_key,
            environment: config.env.clone(),
            frontend_url: config.frontend_url.clone(),
            bcrypt_cost: config.bcrypt_cost,
            invitation_expiry_hours: config.invitation_expiry_hours,
            email_service,
            media,
            puzzle: PuzzleConfig::default(),
        })
    }
}

impl FromRef<ApiState> for Key {
    fn from_ref(state: &ApiState) -> Self {
        state.cookie_key.clone()
    }
}

impl FromRef<ApiState> for PgPool {
    fn from_ref(state: &ApiState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<ApiState> for AuthConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.auth.clone()
    }
}

impl FromRef<ApiState> for CookieConfig {
    fn from_ref(state: &ApiState) -> Self {
        state.cookies.clone()
    }
}
