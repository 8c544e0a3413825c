use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    error::AppError,
    users::repo_types::{STATUS_ACTIVE, STATUS_INACTIVE},
};

pub const MIN_PASSWORD_LEN: usize = 6;
/// Column widths of the `users` table.
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_EMAIL_LEN: usize = 100;
pub const MAX_PHONE_LEN: usize = 20;

pub fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub fn email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim();
    if !is_valid_email(email) {
        return Err(AppError::validation("invalid email"));
    }
    max_len("email", email, MAX_EMAIL_LEN)?;
    Ok(email.to_string())
}

/// Counts chars, matching the `VARCHAR(n)` limits in the schema.
pub fn max_len(field: &str, value: &str, max: usize) -> Result<(), AppError> {
    if value.chars().count() > max {
        return Err(AppError::validation(format!(
            "{field} must be at most {max} characters"
        )));
    }
    Ok(())
}

pub fn name(raw: &str) -> Result<String, AppError> {
    let name = required("name", raw)?;
    max_len("name", name, MAX_NAME_LEN)?;
    Ok(name.to_string())
}

pub fn phone(raw: &str) -> Result<String, AppError> {
    let phone = raw.trim();
    max_len("phone", phone, MAX_PHONE_LEN)?;
    Ok(phone.to_string())
}

pub fn required<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(trimmed)
}

pub fn password(field: &str, value: &str) -> Result<(), AppError> {
    if value.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "{field} must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn status(value: i16) -> Result<i16, AppError> {
    match value {
        STATUS_ACTIVE | STATUS_INACTIVE => Ok(value),
        _ => Err(AppError::validation("status must be 0 or 1")),
    }
}

pub fn age(value: i32) -> Result<i32, AppError> {
    if value < 0 {
        return Err(AppError::validation("age must not be negative"));
    }
    Ok(value)
}
