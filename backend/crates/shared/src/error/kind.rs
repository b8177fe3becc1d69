//! Error classification.
//!
//! [`ErrorKind`] is the only place that knows which HTTP status a failure
//! class maps to. Crate-level error enums pick a kind; they never pick a
//! status code directly.

use serde::Serialize;

/// エラー種別
///
/// 各バリアントは 1 つの HTTP ステータスに対応します。
///
/// ```rust
/// use kernel::error::kind::ErrorKind;
///
/// assert_eq!(ErrorKind::TooManyRequests.status_code(), 429);
/// assert_eq!(ErrorKind::Conflict.as_str(), "Conflict");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ErrorKind {
    /// 400: input failed validation or the request is not acceptable in the
    /// resource's current state
    BadRequest,
    /// 401: missing or invalid credential
    Unauthorized,
    /// 403: authenticated but not the owner
    Forbidden,
    /// 404
    NotFound,
    /// 409: uniqueness conflict
    Conflict,
    /// 429: quota exhausted
    TooManyRequests,
    /// 500
    InternalServerError,
    /// 503: database or other dependency unavailable
    ServiceUnavailable,
}

impl ErrorKind {
    #[inline]
    pub const fn status_code(&self) -> u16 {
        match self {
            ErrorKind::BadRequest => 400,
            ErrorKind::Unauthorized => 401,
            ErrorKind::Forbidden => 403,
            ErrorKind::NotFound => 404,
            ErrorKind::Conflict => 409,
            ErrorKind::TooManyRequests => 429,
            ErrorKind::InternalServerError => 500,
            ErrorKind::ServiceUnavailable => 503,
        }
    }

    /// Standard reason phrase, used as the problem `title`.
    #[inline]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "Bad Request",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::Forbidden => "Forbidden",
            ErrorKind::NotFound => "Not Found",
            ErrorKind::Conflict => "Conflict",
            ErrorKind::TooManyRequests => "Too Many Requests",
            ErrorKind::InternalServerError => "Internal Server Error",
            ErrorKind::ServiceUnavailable => "Service Unavailable",
        }
    }

    /// 5xx. These are logged at error level and their detail is hidden from
    /// clients.
    #[inline]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }

    #[inline]
    pub const fn is_client_error(&self) -> bool {
        let code = self.status_code();
        code >= 400 && code < 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
