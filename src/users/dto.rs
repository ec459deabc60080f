use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

use crate::error::ApiError;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 80;
const EMAIL_MAX: usize = 120;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn check_username(username: &str) -> Result<(), ApiError> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(ApiError::MalformedInput(
            "username must be 3-80 characters".into(),
        ));
    }
    Ok(())
}

/// Request body for user creation. Both fields are required; a missing
/// field fails JSON extraction and surfaces as the same malformed-input kind.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        check_username(&self.username)?;
        if !is_valid_email(&self.email) {
            return Err(ApiError::MalformedInput("invalid email".into()));
        }
        if self.email.chars().count() > EMAIL_MAX {
            return Err(ApiError::MalformedInput(
                "email must be at most 120 characters".into(),
            ));
        }
        Ok(())
    }
}

/// Request body for user update. Only the username can change; email is
/// immutable after creation.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
}

impl UpdateUserRequest {
    /// The submitted username, if any. An empty string means the field was
    /// left out; there is no way to unset a username.
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref().filter(|u| !u.is_empty())
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(username) = self.username() {
            check_username(username)?;
        }
        Ok(())
    }
}
