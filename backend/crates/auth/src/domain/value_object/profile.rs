//! Profile fields
//!
//! Display name and biography shown in the teacher catalog.

use kernel::error::app_error::{AppError, AppResult};

pub const FULL_NAME_MAX_CHARS: usize = 100;
pub const BIO_MAX_CHARS: usize = 2000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FullName(String);

impl FullName {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let name = raw.as_ref().trim();
        if name.is_empty() {
            return Err(AppError::bad_request("Full name cannot be empty"));
        }
        if name.chars().count() > FULL_NAME_MAX_CHARS {
            return Err(AppError::bad_request(format!(
                "Full name must be at most {FULL_NAME_MAX_CHARS} characters"
            )));
        }
        if name.chars().any(char::is_control) {
            return Err(AppError::bad_request("Full name contains invalid characters"));
        }
        Ok(Self(name.to_string()))
    }

    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Biography; an empty string clears it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bio(Option<String>);

impl Bio {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let bio = raw.as_ref().trim();
        if bio.chars().count() > BIO_MAX_CHARS {
            return Err(AppError::bad_request(format!(
                "Bio must be at most {BIO_MAX_CHARS} characters"
            )));
        }
        Ok(Self((!bio.is_empty()).then(|| bio.to_string())))
    }

    pub fn into_inner(self) -> Option<String> {
        self.0
    }
}
