//! Check result entity and the per-link failure taxonomy.

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Why a link was classified as invalid.
///
/// Stored as a short machine-readable string (`timeout`, `http_404`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidUrl,
    Timeout,
    SslError,
    ConnectionError,
    TooManyRedirects,
    RequestError,
    UnknownError,
    /// A response arrived with a status code that is not accepted as alive.
    Http(u16),
}

impl ErrorKind {
    /// Classifies an HTTP status code.
    ///
    /// Returns `None` when the link counts as alive: any status in `200..400`,
    /// plus `401` and `403` (the server answers, access is merely restricted).
    pub fn from_status(status: u16) -> Option<Self> {
        if is_accepted_status(status) {
            None
        } else {
            Some(Self::Http(status))
        }
    }

    /// Human-readable description stored alongside the kind.
    pub fn default_message(&self) -> String {
        match self {
            Self::InvalidUrl => "URL format is invalid".to_string(),
            Self::Timeout => "Request timed out".to_string(),
            Self::SslError => "SSL certificate verification failed".to_string(),
            Self::ConnectionError => "Connection error".to_string(),
            Self::TooManyRedirects => "Too many redirects".to_string(),
            Self::RequestError => "Request failed".to_string(),
            Self::UnknownError => "Unknown error".to_string(),
            Self::Http(code) => format!("HTTP status code: {code}"),
        }
    }
}

/// Returns true for status codes that mean the link is alive.
pub fn is_accepted_status(status: u16) -> bool {
    (200..400).contains(&status) || status == 401 || status == 403
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl => f.write_str("invalid_url"),
            Self::Timeout => f.write_str("timeout"),
            Self::SslError => f.write_str("ssl_error"),
            Self::ConnectionError => f.write_str("connection_error"),
            Self::TooManyRedirects => f.write_str("too_many_redirects"),
            Self::RequestError => f.write_str("request_error"),
            Self::UnknownError => f.write_str("unknown_error"),
            Self::Http(code) => write!(f, "http_{code}"),
        }
    }
}

/// Error returned when a stored error kind string is not recognized.
#[derive(Debug, thiserror::Error)]
#[error("Unknown error kind: {0}")]
pub struct ParseErrorKindError(String);

impl FromStr for ErrorKind {
    type Err = ParseErrorKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "invalid_url" => Self::InvalidUrl,
            "timeout" => Self::Timeout,
            "ssl_error" => Self::SslError,
            "connection_error" => Self::ConnectionError,
            "too_many_redirects" => Self::TooManyRedirects,
            "request_error" => Self::RequestError,
            "unknown_error" => Self::UnknownError,
            other => other
                .strip_prefix("http_")
                .and_then(|code| code.parse::<u16>().ok())
                .map(Self::Http)
                .ok_or_else(|| ParseErrorKindError(other.to_string()))?,
        };
        Ok(kind)
    }
}

impl Serialize for ErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Final classification of a single link.
///
/// An error kind exists exactly when the link is invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Invalid { kind: ErrorKind, message: String },
}

impl Verdict {
    /// Builds an invalid verdict with the kind's default message.
    pub fn invalid(kind: ErrorKind) -> Self {
        Self::Invalid {
            message: kind.default_message(),
            kind,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Valid => None,
            Self::Invalid { kind, .. } => Some(*kind),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Valid => None,
            Self::Invalid { message, .. } => Some(message),
        }
    }
}

/// A persisted outcome of checking one link within one run.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub id: i64,
    pub run_id: Uuid,
    pub link_id: i64,
    pub url: String,
    pub is_valid: bool,
    pub status_code: Option<u16>,
    pub error_kind: Option<ErrorKind>,
    pub error_message: Option<String>,
    pub latency_ms: i64,
    pub checked_at: DateTime<Utc>,
}

/// Input data for appending a new check result.
#[derive(Debug, Clone)]
pub struct NewCheckResult {
    pub run_id: Uuid,
    pub link_id: i64,
    pub url: String,
    pub verdict: Verdict,
    pub status_code: Option<u16>,
    pub latency_ms: i64,
    pub checked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_statuses_are_valid() {
        for status in [200, 204, 301, 302, 304, 399, 401, 403] {
            assert_eq!(ErrorKind::from_status(status), None, "status {status}");
        }
    }

    #[test]
    fn test_rejected_statuses_map_to_http_kind() {
        for status in [400, 404, 405, 410, 429, 500, 502, 503] {
            assert_eq!(
                ErrorKind::from_status(status),
                Some(ErrorKind::Http(status)),
                "status {status}"
            );
        }
        assert_eq!(ErrorKind::from_status(199), Some(ErrorKind::Http(199)));
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::InvalidUrl.to_string(), "invalid_url");
        assert_eq!(ErrorKind::TooManyRedirects.to_string(), "too_many_redirects");
        assert_eq!(ErrorKind::Http(404).to_string(), "http_404");
        assert_eq!(ErrorKind::Http(503).to_string(), "http_503");
    }

    #[test]
    fn test_error_kind_parse() {
        assert_eq!("timeout".parse::<ErrorKind>().unwrap(), ErrorKind::Timeout);
        assert_eq!("ssl_error".parse::<ErrorKind>().unwrap(), ErrorKind::SslError);
        assert_eq!(
            "http_500".parse::<ErrorKind>().unwrap(),
            ErrorKind::Http(500)
        );
        assert!("http_abc".parse::<ErrorKind>().is_err());
        assert!("boom".parse::<ErrorKind>().is_err());
    }

    #[test]
    fn test_error_kind_serializes_as_string() {
        let json = serde_json::to_value(ErrorKind::Http(404)).unwrap();
        assert_eq!(json, serde_json::json!("http_404"));
    }

    #[test]
    fn test_verdict_invalid_carries_kind_and_message() {
        let verdict = Verdict::invalid(ErrorKind::Http(404));

        assert!(!verdict.is_valid());
        assert_eq!(verdict.error_kind(), Some(ErrorKind::Http(404)));
        assert_eq!(verdict.error_message(), Some("HTTP status code: 404"));
    }

    #[test]
    fn test_verdict_valid_has_no_error() {
        assert!(Verdict::Valid.is_valid());
        assert!(Verdict::Valid.error_kind().is_none());
        assert!(Verdict::Valid.error_message().is_none());
    }
}
