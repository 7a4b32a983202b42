// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Input validation module.

use std::collections::HashMap;
use std::sync::LazyLock;

use authdemo_common::{ProfileFields, ProfileFilter};
use regex::Regex;
use thiserror::Error;

use crate::error::AppError;

// Common validation constants
const MAX_USERNAME_LENGTH: usize = 64;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_PROFILE_TEXT_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 200;
const MAX_AGE: i64 = 150;

// Printable characters only, no whitespace at either end
static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S(?:[^\p{Cc}]*\S)?$").expect("username pattern is valid"));

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid field `{field}`: {reason}")]
    InvalidField { field: &'static str, reason: String },

    #[error("Unknown filter field: {0}")]
    UnknownFilter(String),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a username
pub fn validate_username(username: &str) -> ValidationResult<&str> {
    if username.is_empty() {
        return Err(ValidationError::InvalidUsername(
            "Username must not be empty".to_string(),
        ));
    }

    if username.chars().count() > MAX_USERNAME_LENGTH {
        return Err(ValidationError::InvalidUsername(format!(
            "Username cannot exceed {MAX_USERNAME_LENGTH} characters"
        )));
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(ValidationError::InvalidUsername(
            "Username contains invalid characters".to_string(),
        ));
    }

    Ok(username)
}

/// Validate a password. Only presence and length are checked.
pub fn validate_password(password: &str) -> ValidationResult<&str> {
    if password.is_empty() {
        return Err(ValidationError::InvalidPassword(
            "Password must not be empty".to_string(),
        ));
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(password)
}

/// Validate a timer description
pub fn validate_description(description: &str) -> ValidationResult<&str> {
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::InvalidField {
            field: "description",
            reason: format!("must be at most {MAX_DESCRIPTION_LENGTH} characters"),
        });
    }
    Ok(description)
}

fn validate_text(field: &'static str, value: Option<&str>) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > MAX_PROFILE_TEXT_LENGTH => Err(ValidationError::InvalidField {
            field,
            reason: format!("must be at most {MAX_PROFILE_TEXT_LENGTH} characters"),
        }),
        _ => Ok(()),
    }
}

fn validate_age(age: Option<i64>) -> ValidationResult<()> {
    match age {
        Some(age) if !(0..=MAX_AGE).contains(&age) => Err(ValidationError::InvalidField {
            field: "age",
            reason: format!("must be between 0 and {MAX_AGE}"),
        }),
        _ => Ok(()),
    }
}

/// Validate the writable fields of a profile
pub fn validate_profile_fields(fields: &ProfileFields) -> ValidationResult<()> {
    validate_text("name", fields.name.as_deref())?;
    validate_text("country", fields.country.as_deref())?;
    validate_age(fields.age)
}

/// Turn raw query parameters into a profile filter. Only `name`, `age`
/// and `country` are accepted.
pub fn parse_profile_filter(params: &HashMap<String, String>) -> ValidationResult<ProfileFilter> {
    let mut filter = ProfileFilter::default();
    for (key, value) in params {
        match key.as_str() {
            "name" => filter.name = Some(value.clone()),
            "country" => filter.country = Some(value.clone()),
            "age" => {
                let age = value.parse::<i64>().map_err(|_| ValidationError::InvalidField {
                    field: "age",
                    reason: "must be an integer".to_string(),
                })?;
                filter.age = Some(age);
            },
            other => return Err(ValidationError::UnknownFilter(other.to_string())),
        }
    }
    Ok(filter)
}
