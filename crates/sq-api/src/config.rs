//! Runtime configuration read from the process environment.
//!
//! Every field maps to an upper-case environment variable of the same name
//! (`database_url` <- `DATABASE_URL`). Tunables have defaults; secrets do not.

use serde::Deserialize;
use thiserror::Error;

/// Minimum length of `JWT_SECRET` in bytes.
pub const MIN_JWT_SECRET_LEN: usize = 32;
/// Minimum length of `COOKIE_SECRET` in bytes (private cookie key material).
pub const MIN_COOKIE_SECRET_LEN: usize = 64;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub const fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    pub const fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Error)]
pub enum ApiConfigError {
    #[error("failed to read configuration: {0}")]
    Env(#[from] envy::Error),
    #[error("{name} must be at least {min} bytes long")]
    SecretTooShort { name: &'static str, min: usize },
}

#[derive(Clone, Debug, Deserialize)]
pub struct ApiConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub cookie_secret: String,
    /// Base URL of the front end, used in invitation links.
    pub frontend_url: String,

    #[serde(default)]
    pub env: Environment,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Comma separated list of origins allowed by CORS.
    #[serde(default)]
    pub allowed_origins: Option<String>,
    #[serde(default)]
    pub cookie_domain: Option<String>,
    #[serde(default)]
    pub log_dir: Option<String>,

    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,
    #[serde(default = "default_jwt_expiry_hours")]
    pub jwt_expiry_hours: i64,
    #[serde(default = "default_invitation_expiry_hours")]
    pub invitation_expiry_hours: i64,
    #[serde(default = "default_play_session_hours")]
    pub play_session_hours: i64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
    #[serde(default = "default_retention_days")]
    pub retention_days: i32,

    // SMTP (invitation emails)
    pub smtp_host: Option<String>,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_from_email: Option<String>,
    pub smtp_from_name: Option<String>,

    // First admin, created at startup when none exists
    pub bootstrap_admin_email: Option<String>,
    pub bootstrap_admin_password: Option<String>,
    pub bootstrap_admin_name: Option<String>,

    // Media provider
    pub media_cloud_name: Option<String>,
    pub media_api_key: Option<String>,
    pub media_api_secret: Option<String>,
    #[serde(default = "default_media_folder")]
    pub media_folder: String,
}

const fn default_port() -> u16 {
    3000
}

const fn default_database_max_connections() -> u32 {
    10
}

const fn default_jwt_expiry_hours() -> i64 {
    12
}

const fn default_invitation_expiry_hours() -> i64 {
    72
}

const fn default_play_session_hours() -> i64 {
    4
}

const fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

const fn default_retention_days() -> i32 {
    30
}

fn default_media_folder() -> String {
    "storyquest".to_string()
}

impl ApiConfig {
    /// Load and validate the configuration from environment variables.
    pub fn from_env() -> Result<Self, ApiConfigError> {
        let config: Self = envy::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit list of `(KEY, value)` pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ApiConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ApiConfigError> {
        if self.jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ApiConfigError::SecretTooShort {
                name: "JWT_SECRET",
                min: MIN_JWT_SECRET_LEN,
            });
        }
        if self.cookie_secret.len() < MIN_COOKIE_SECRET_LEN {
            return Err(ApiConfigError::SecretTooShort {
                name: "COOKIE_SECRET",
                min: MIN_COOKIE_SECRET_LEN,
            });
        }
        Ok(())
    }

    pub fn parsed_allowed_origins(&self) -> Vec<String> {
        match &self.allowed_origins {
            Some(origins) => origins
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => vec![self.frontend_url.clone()],
        }
    }
}
