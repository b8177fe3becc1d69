//! Username Value Object
//!
//! ユーザー名はログインと画面表示に使う公開ハンドル。
//!
//! - NFKC 正規化 → 検証 → 小文字化 の順で処理
//! - ASCII 英数字と `_ . -` のみ
//! - 3〜30 文字、先頭と末尾は英数字か `_`
//! - 一意性は小文字の canonical 形で判定

use kernel::error::app_error::{AppError, AppResult};
use serde::Serialize;
use std::fmt;
use unicode_normalization::UnicodeNormalization;

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 30;

const ALLOWED_SPECIAL_CHARS: &[char] = &['_', '.', '-'];

/// Names that collide with routes or would impersonate staff.
const RESERVED_WORDS: &[&str] = &[
    "admin",
    "administrator",
    "root",
    "system",
    "support",
    "moderator",
    "api",
    "login",
    "logout",
    "register",
    "verify",
    "account",
    "user",
    "posts",
    "null",
    "undefined",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Username {
    /// As typed (after NFKC and trim)
    original: String,
    /// Lowercased, used for uniqueness and lookup
    #[serde(skip)]
    canonical: String,
}

impl Username {
    pub fn new(raw: impl AsRef<str>) -> AppResult<Self> {
        let original: String = raw.as_ref().nfkc().collect::<String>().trim().to_string();
        let length = original.chars().count();

        if length < USERNAME_MIN_LENGTH {
            return Err(invalid(format!(
                "Username must be at least {USERNAME_MIN_LENGTH} characters"
            )));
        }
        if length > USERNAME_MAX_LENGTH {
            return Err(invalid(format!(
                "Username must be at most {USERNAME_MAX_LENGTH} characters"
            )));
        }

        if let Some(ch) = original
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && !ALLOWED_SPECIAL_CHARS.contains(c))
        {
            return Err(invalid(format!(
                "Username cannot contain '{ch}'. Only letters, digits, _, . and - are allowed"
            )));
        }

        let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
        if !edge_ok(original.chars().next()) || !edge_ok(original.chars().last()) {
            return Err(invalid(
                "Username must start and end with a letter, digit or _",
            ));
        }

        if original.contains("..") {
            return Err(invalid("Username cannot contain consecutive dots"));
        }

        let canonical = original.to_ascii_lowercase();
        if RESERVED_WORDS.contains(&canonical.as_str()) {
            return Err(invalid("This username is reserved"));
        }

        Ok(Self {
            original,
            canonical,
        })
    }

    /// Stored value, already validated on the way in.
    pub fn from_db(original: impl Into<String>) -> Self {
        let original = original.into();
        let canonical = original.to_ascii_lowercase();
        Self {
            original,
            canonical,
        }
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

fn invalid(message: impl Into<std::borrow::Cow<'static, str>>) -> AppError {
    AppError::bad_request(message).with_action("Please choose a different username")
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.original)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_display_form_and_lowercases_canonical() {
        let name = Username::new("  Alice_W ").unwrap();
        assert_eq!(name.original(), "Alice_W");
        assert_eq!(name.canonical(), "alice_w");
    }

    #[test]
    fn nfkc_folds_fullwidth_ascii() {
        let name = Username::new("ａｌｉｃｅ").unwrap();
        assert_eq!(name.canonical(), "alice");
    }

    #[test]
    fn rejects_bad_shapes() {
        for bad in [
            "ab",
            "abcdefghijklmnopqrstuvwxyz01234",
            "alice!",
            "al ice",
            ".alice",
            "alice-",
            "al..ice",
            "Admin",
            "ユーザー",
        ] {
            assert!(Username::new(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn accepts_typical_names() {
        for ok in ["alice", "bob", "_bob_", "jane.doe", "a-1"] {
            assert!(Username::new(ok).is_ok(), "{ok:?} should be accepted");
        }
    }
}
