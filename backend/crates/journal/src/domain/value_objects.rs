//! Post value objects

use kernel::error::app_error::{AppError, AppResult};
use serde::Serialize;

pub const MAX_TITLE_CHARS: usize = 200;
pub const MAX_BODY_CHARS: usize = 50_000;

/// Trimmed, 1 to 200 characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PostTitle(String);

impl PostTitle {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let title = raw.as_ref().trim();
        if title.is_empty() {
            return Err(AppError::bad_request("Title is required"));
        }
        let chars = title.chars().count();
        if chars > MAX_TITLE_CHARS {
            return Err(AppError::bad_request(format!(
                "Title must be at most {MAX_TITLE_CHARS} characters (got {chars})"
            )));
        }
        Ok(Self(title.to_string()))
    }

    pub fn from_db(title: String) -> Self {
        Self(title)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Free text up to 50 000 characters. May be empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PostBody(String);

impl PostBody {
    pub fn new(raw: String) -> AppResult<Self> {
        let chars = raw.chars().count();
        if chars > MAX_BODY_CHARS {
            return Err(AppError::bad_request(format!(
                "Body must be at most {MAX_BODY_CHARS} characters (got {chars})"
            )));
        }
        Ok(Self(raw))
    }

    pub fn from_db(body: String) -> Self {
        Self(body)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_is_trimmed() {
        assert_eq!(PostTitle::new("  Day one \n").unwrap().as_str(), "Day one");
    }

    #[test]
    fn test_blank_title_is_rejected() {
        assert!(PostTitle::new("").is_err());
        assert!(PostTitle::new("   \t").is_err());
    }

    #[test]
    fn test_title_length_counts_characters() {
        assert!(PostTitle::new("é".repeat(200)).is_ok());
        assert!(PostTitle::new("é".repeat(201)).is_err());
    }

    #[test]
    fn test_body_limit() {
        assert!(PostBody::new(String::new()).is_ok());
        assert!(PostBody::new("a".repeat(MAX_BODY_CHARS)).is_ok());
        let err = PostBody::new("a".repeat(MAX_BODY_CHARS + 1)).unwrap_err();
        assert_eq!(err.status_code(), 400);
    }
}
