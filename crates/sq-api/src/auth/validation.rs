use validator::ValidateEmail;

use crate::error::ApiError;

pub const MAX_DISPLAY_NAME_CHARS: usize = 80;

/// Validate email format using the validator crate
pub fn validate_email(email: &str) -> Result<(), ApiError> {
    if email.is_empty() {
        return Err(ApiError::Validation("Email cannot be empty".to_string()));
    }

    if email.len() > 254 || !email.validate_email() {
        return Err(ApiError::Validation("Invalid email format".to_string()));
    }

    Ok(())
}

/// Trim and lowercase an email, then validate it.
pub fn normalize_email(email: &str) -> Result<String, ApiError> {
    let email = email.trim().to_lowercase();
    validate_email(&email)?;
    Ok(email)
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 8 {
        return Err(ApiError::Validation(
            "Password must be at least 8 characters long".to_string(),
        ));
    }

    // bcrypt ignores everything past 72 bytes
    if password.len() > 72 {
        return Err(ApiError::Validation(
            "Password must be at most 72 bytes long".to_string(),
        ));
    }

    let has_letter = password.chars().any(|c| c.is_alphabetic());
    let has_number = password.chars().any(|c| c.is_numeric());

    if !has_letter || !has_number {
        return Err(ApiError::Validation(
            "Password must contain at least one letter and one number".to_string(),
        ));
    }

    Ok(())
}

/// Validate a display name and return it trimmed
pub fn validate_display_name(name: &str) -> Result<String, ApiError> {
    let name = crate::validation::required_text("Display name", name, MAX_DISPLAY_NAME_CHARS)?;

    if name.chars().any(|c| c.is_control() || c == '<' || c == '>') {
        return Err(ApiError::Validation(
            "Display name contains invalid characters".to_string(),
        ));
    }

    Ok(name)
}
