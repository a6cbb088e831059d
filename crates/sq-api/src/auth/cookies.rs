use axum_extra::extract::cookie::{Cookie, SameSite};

use crate::state::CookieConfig;

pub const AUTH_COOKIE: &str = "auth_token";
pub const PLAY_SESSION_COOKIE: &str = "play_session";
pub const MYSTERY_BOX_PROGRESS_COOKIE: &str = "mystery_box_progress";

/// How long mystery-box progress is remembered on the student's device.
pub const MYSTERY_BOX_PROGRESS_DAYS: i64 = 30;

/// Build an HttpOnly, `SameSite=Lax` cookie scoped to the whole site.
///
/// Cookies are secure (HTTPS-only) except in development, and carry the
/// configured domain when one is set.
pub fn build_cookie(
    name: &'static str,
    value: String,
    max_age: time::Duration,
    config: &CookieConfig,
) -> Cookie<'static> {
    let builder = Cookie::build((name, value))
        .path("/")
        .max_age(max_age)
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(!config.environment.is_development());

    match &config.domain {
        Some(domain) => builder.domain(domain.clone()).build(),
        None => builder.build(),
    }
}

/// A cookie matching `name`'s path and domain, for `PrivateCookieJar::remove`.
pub fn removal_cookie(name: &'static str, config: &CookieConfig) -> Cookie<'static> {
    let builder = Cookie::build(name).path("/");
    match &config.domain {
        Some(domain) => builder.domain(domain.clone()).build(),
        None => builder.build(),
    }
}

/// Create an auth cookie with the JWT token
pub fn create_auth_cookie(token: String, config: &CookieConfig) -> Cookie<'static> {
    build_cookie(
        AUTH_COOKIE,
        token,
        time::Duration::hours(config.auth_expiry_hours),
        config,
    )
}
