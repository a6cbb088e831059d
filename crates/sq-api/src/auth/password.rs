//! bcrypt hashing off the async runtime.

use std::sync::LazyLock;

use crate::error::ApiError;

/// Verified against when the account does not exist, so unknown emails
/// cost as much as wrong passwords.
static DUMMY_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| bcrypt::hash("storyquest-placeholder-password", bcrypt::DEFAULT_COST).ok());

pub async fn hash_password(password: String, cost: u32) -> Result<String, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| ApiError::Internal(format!("Password hashing task failed: {e}")))?
        .map_err(ApiError::from)
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, ApiError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| ApiError::Internal(format!("Password verification task failed: {e}")))?
        .map_err(ApiError::from)
}

/// Burn a verification for a login that is going to fail anyway.
pub async fn verify_dummy(password: String) {
    if let Some(hash) = DUMMY_HASH.as_ref() {
        let _ = verify_password(password, hash.clone()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hash_and_verify() {
        let hash = hash_password("correct horse 1".to_string(), 4).await.unwrap();
        assert!(hash.starts_with("$2"));
        assert!(verify_password("correct horse 1".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong horse 1".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_verify_rejects_malformed_hash() {
        assert!(verify_password("anything".to_string(), "not-a-hash".to_string()).await.is_err());
    }
}
