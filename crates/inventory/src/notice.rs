use std::time::{Duration, Instant};

use dcinv_api_client::ClientError;

/// How long a notice stays visible unless configured otherwise.
pub const DEFAULT_NOTICE_DURATION: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
    Warning,
}

/// A transient, self-clearing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub expires_at: Instant,
}

impl Notice {
    pub fn new(level: NoticeLevel, text: impl Into<String>, now: Instant, ttl: Duration) -> Self {
        Self {
            level,
            text: text.into(),
            expires_at: now + ttl,
        }
    }

    pub fn success(text: impl Into<String>, now: Instant, ttl: Duration) -> Self {
        Self::new(NoticeLevel::Success, text, now, ttl)
    }

    pub fn error(text: impl Into<String>, now: Instant, ttl: Duration) -> Self {
        Self::new(NoticeLevel::Error, text, now, ttl)
    }

    /// Error notice for a failed call. Session failures keep their own
    /// wording; everything else uses `fallback`.
    pub fn for_failure(err: &ClientError, fallback: &str, now: Instant, ttl: Duration) -> Self {
        let text = match err {
            ClientError::Validation { .. }
            | ClientError::InvalidFileType(_)
            | ClientError::FileTooLarge => err.user_message(),
            e if e.is_session_fatal() => e.user_message(),
            _ => fallback.to_string(),
        };
        Self::error(text, now, ttl)
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}
