pub mod routes;

use sq_db::repositories::category as category_repo;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::ApiError;

pub use routes::routes;

/// Content may only be filed under an active category.
pub async fn ensure_exists(pool: &PgPool, category_id: Option<Uuid>) -> Result<(), ApiError> {
    let Some(id) = category_id else {
        return Ok(());
    };
    match category_repo::find_by_id(pool, id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::Validation("Category does not exist".to_string())),
    }
}
