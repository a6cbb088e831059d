//! First-run admin account.

use anyhow::Context;
use sq_db::repositories::user as user_repo;
use sqlx::PgPool;

use super::{Role, password, validation};
use crate::ApiConfig;

/// Create an admin from `BOOTSTRAP_ADMIN_*` when no active admin exists.
///
/// An existing account with the same email is promoted and given the
/// configured password. Does nothing when the variables are unset or an
/// admin already exists.
pub async fn ensure_bootstrap_admin(pool: &PgPool, config: &ApiConfig) -> anyhow::Result<()> {
    let (Some(email), Some(admin_password)) = (
        config.bootstrap_admin_email.as_deref(),
        config.bootstrap_admin_password.as_deref(),
    ) else {
        return Ok(());
    };

    if !user_repo::active_admin_ids(pool).await?.is_empty() {
        tracing::debug!("Admin account already present, skipping bootstrap");
        return Ok(());
    }

    let email = validation::normalize_email(email).context("BOOTSTRAP_ADMIN_EMAIL")?;
    validation::validate_password(admin_password).context("BOOTSTRAP_ADMIN_PASSWORD")?;
    let display_name = validation::validate_display_name(
        config.bootstrap_admin_name.as_deref().unwrap_or("Administrator"),
    )
    .context("BOOTSTRAP_ADMIN_NAME")?;

    let hash = password::hash_password(admin_password.to_string(), config.bcrypt_cost).await?;

    let mut tx = pool.begin().await?;
    match user_repo::find_credentials_by_email(&mut *tx, &email).await? {
        Some(existing) => {
            user_repo::update_role(&mut *tx, existing.id, Role::Admin.as_str()).await?;
            user_repo::set_password(&mut *tx, existing.id, &hash).await?;
            tracing::info!(user_id = %existing.id, "Promoted existing user to bootstrap admin");
        }
        None => {
            let id = user_repo::create_user(
                &mut *tx,
                &email,
                &display_name,
                Role::Admin.as_str(),
                Some(&hash),
            )
            .await?;
            tracing::info!(user_id = %id, "Created bootstrap admin");
        }
    }
    tx.commit().await?;

    Ok(())
}
