//! Material and subject metadata fields

use kernel::error::app_error::{AppError, AppResult};

pub const TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 5000;
pub const SUBJECT_NAME_MAX_CHARS: usize = 100;

fn single_line(field: &str, raw: &str, max: usize) -> AppResult<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(AppError::bad_request(format!("{field} cannot be empty")));
    }
    if value.chars().count() > max {
        return Err(AppError::bad_request(format!(
            "{field} must be at most {max} characters"
        )));
    }
    if value.chars().any(char::is_control) {
        return Err(AppError::bad_request(format!("{field} contains invalid characters")));
    }
    Ok(value.to_string())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        single_line("Title", raw.as_ref(), TITLE_MAX_CHARS).map(Self)
    }

    pub fn from_db(title: impl Into<String>) -> Self {
        Self(title.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Optional free text; blank means none
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Description(Option<String>);

impl Description {
    pub fn new(raw: Option<impl AsRef<str>>) -> AppResult<Self> {
        let Some(raw) = raw else {
            return Ok(Self(None));
        };
        let text = raw.as_ref().trim();
        if text.chars().count() > DESCRIPTION_MAX_CHARS {
            return Err(AppError::bad_request(format!(
                "Description must be at most {DESCRIPTION_MAX_CHARS} characters"
            )));
        }
        Ok(Self((!text.is_empty()).then(|| text.to_string())))
    }

    pub fn from_db(description: Option<String>) -> Self {
        Self(description)
    }

    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectName(String);

impl SubjectName {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        single_line("Subject name", raw.as_ref(), SUBJECT_NAME_MAX_CHARS).map(Self)
    }

    pub fn from_db(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
