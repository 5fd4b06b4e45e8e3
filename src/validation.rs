//! Input validation for registration and profile updates.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::AppError;
use crate::Result;

pub fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(AppError::Validation("username is required".into()));
    }

    if username.len() < 3 || username.len() > 50 {
        return Err(AppError::Validation(
            "username must be between 3 and 50 characters".into(),
        ));
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX
        .get_or_init(|| Regex::new(r"^[a-zA-Z0-9_]+$").expect("Failed to compile username regex"));

    if !regex.is_match(username) {
        return Err(AppError::Validation(
            "username can only contain letters, numbers, and underscores".into(),
        ));
    }

    Ok(())
}

pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(AppError::Validation("email is required".into()));
    }

    if email.len() > 100 {
        return Err(AppError::Validation(
            "email must be at most 100 characters".into(),
        ));
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err(AppError::Validation("invalid email format".into()));
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<()> {
    if password.is_empty() {
        return Err(AppError::Validation("password is required".into()));
    }

    if password.len() < 6 {
        return Err(AppError::Validation(
            "password must be at least 6 characters".into(),
        ));
    }

    if password.len() > 128 {
        return Err(AppError::Validation(
            "password must be at most 128 characters".into(),
        ));
    }

    Ok(())
}

/// Requested months on an upgrade request or a direct admin upgrade.
pub fn validate_months(months: i32) -> Result<()> {
    if months < 1 {
        return Err(AppError::Validation("minimum 1 month required".into()));
    }

    Ok(())
}
