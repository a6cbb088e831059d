//! Background jobs for periodic maintenance tasks.
//!
//! Soft-deleted rows stay in the database for a retention window so they can
//! be inspected or restored by hand; these jobs remove them once the window
//! has passed, together with invitations that expired unaccepted.

use std::time::Duration;

use sq_db::repositories::{invitation, maintenance};
use sqlx::PgPool;
use tokio::time::interval;

/// Start all background jobs
///
/// Returns the join handles so the caller can abort them on shutdown.
pub fn start_background_jobs(
    pool: PgPool,
    retention_days: i32,
) -> Vec<tokio::task::JoinHandle<()>> {
    vec![
        tokio::spawn(periodic_invitation_cleanup_job(pool.clone())),
        tokio::spawn(periodic_purge_job(pool, retention_days)),
    ]
}

/// Delete expired, unaccepted invitations every 6 hours
async fn periodic_invitation_cleanup_job(pool: PgPool) {
    // Wait before first run to avoid startup contention
    tokio::time::sleep(Duration::from_secs(600)).await;

    let mut interval = interval(Duration::from_secs(21600)); // 6 hours

    loop {
        interval.tick().await;

        match invitation::delete_expired(&pool).await {
            Ok(deleted) => {
                crate::metrics::record_job_run("invitation_cleanup", deleted);
                if deleted > 0 {
                    tracing::info!("Deleted {deleted} expired invitations");
                } else {
                    tracing::debug!("No expired invitations to delete");
                }
            }
            Err(e) => {
                tracing::error!("Failed to delete expired invitations: {e}");
            }
        }
    }
}

/// Purge soft-deleted rows past the retention window, runs daily
async fn periodic_purge_job(pool: PgPool, retention_days: i32) {
    tokio::time::sleep(Duration::from_secs(3600)).await;

    let mut interval = interval(Duration::from_secs(86400)); // 24 hours

    loop {
        interval.tick().await;

        match purge_soft_deleted(&pool, retention_days).await {
            Ok(purged) => {
                crate::metrics::record_job_run("soft_delete_purge", purged);
                if purged > 0 {
                    tracing::info!(
                        "Purged {purged} rows soft-deleted more than {retention_days} days ago"
                    );
                } else {
                    tracing::debug!("No soft-deleted rows to purge");
                }
            }
            Err(e) => {
                tracing::error!("Failed to purge soft-deleted rows: {e}");
            }
        }
    }
}

/// Run one purge pass over every soft-deletable table.
pub async fn purge_soft_deleted(pool: &PgPool, retention_days: i32) -> Result<u64, sqlx::Error> {
    let mut total = maintenance::purge_retired_questions(pool, retention_days).await?;

    for table in maintenance::SOFT_DELETE_TABLES {
        let purged = maintenance::purge_soft_deleted(pool, table, retention_days).await?;
        if purged > 0 {
            tracing::debug!(table, purged, "purged soft-deleted rows");
        }
        total += purged;
    }

    Ok(total)
}
