use serde::Deserialize;

use crate::error::ApiError;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

/// `?limit=&offset=` query parameters.
#[derive(Debug, Default, Clone, Copy, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    /// Clamp to `1..=MAX_PAGE_SIZE` and a non-negative offset.
    pub fn resolve(self) -> (i64, i64) {
        let limit = self
            .limit
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

/// Trim a required text field and check its length in characters.
///
/// # Examples
/// ```
/// use sq_api::validation::required_text;
///
/// assert_eq!(required_text("Title", "  Owl  ", 100).unwrap(), "Owl");
/// assert!(required_text("Title", "   ", 100).is_err());
/// ```
pub fn required_text(field: &str, value: &str, max_chars: usize) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max_chars {
        return Err(ApiError::Validation(format!(
            "{field} must be at most {max_chars} characters long"
        )));
    }
    Ok(trimmed.to_string())
}

/// Like [`required_text`] but blank input becomes `None`.
pub fn optional_text(
    field: &str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<Option<String>, ApiError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => required_text(field, v, max_chars).map(Some),
    }
}

/// Validate an optional media URL (cover image, video, avatar).
///
/// Only HTTPS links are accepted; blank input becomes `None`.
pub fn optional_url(field: &str, value: Option<&str>) -> Result<Option<String>, ApiError> {
    let Some(url) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if url.len() > 2048 {
        return Err(ApiError::Validation(format!("{field} is too long")));
    }

    if !url.starts_with("https://") {
        return Err(ApiError::Validation(format!("{field} must use HTTPS")));
    }

    let url_lower = url.to_lowercase();
    if url_lower.contains("javascript:")
        || url_lower.contains("<script")
        || url_lower.contains("onerror=")
        || url_lower.contains("onload=")
        || url.chars().any(char::is_whitespace)
    {
        return Err(ApiError::Validation(format!(
            "{field} contains invalid characters"
        )));
    }

    Ok(Some(url.to_string()))
}
