use reqwest::StatusCode;
use thiserror::Error;

use crate::normalize::error_messages;

/// Every way a call through the client can fail.
///
/// Variants map one-to-one onto the notifications shown to the user; see
/// [`ClientError::user_message`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// No credentials are stored. No request was sent.
    #[error("not logged in")]
    Unauthenticated,

    /// The refresh token was rejected (or missing) and the session was cleared.
    #[error("session expired")]
    SessionExpired,

    /// The request was rejected because of its content, either locally or by
    /// the server (400/422).
    #[error("validation failed: {}", .messages.join("; "))]
    Validation { messages: Vec<String> },

    #[error("file too large")]
    FileTooLarge,

    #[error("server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// The request never produced a response.
    #[error("network unavailable: {0}")]
    NetworkUnavailable(String),

    /// Every attempt allowed by the retry policy timed out.
    #[error("request timed out")]
    Timeout,

    #[error("invalid file type: {0}")]
    InvalidFileType(String),

    /// Any other non-success status (403, 404, ...).
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("could not build request: {0}")]
    Build(String),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            messages: vec![message.into()],
        }
    }

    /// Classify a transport-level failure.
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_builder() {
            Self::Build(err.to_string())
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::NetworkUnavailable(err.to_string())
        }
    }

    /// Classify a non-success response from its status and raw body.
    pub fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let messages = serde_json::from_slice::<serde_json::Value>(body)
            .map(|value| error_messages(&value))
            .unwrap_or_else(|_| {
                let text = String::from_utf8_lossy(body).trim().to_string();
                if text.is_empty() { Vec::new() } else { vec![text] }
            });
        let reason = || {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        };

        match status.as_u16() {
            401 => Self::Unauthenticated,
            413 => Self::FileTooLarge,
            code if code >= 500 => Self::ServerError {
                status: code,
                message: messages.into_iter().next().unwrap_or_else(reason),
            },
            400 | 422 => Self::Validation {
                messages: if messages.is_empty() {
                    vec![reason()]
                } else {
                    messages
                },
            },
            code => Self::Http {
                status: code,
                message: if messages.is_empty() {
                    reason()
                } else {
                    messages.join("; ")
                },
            },
        }
    }

    /// Consume a non-success response and classify it.
    pub async fn from_response(resp: reqwest::Response) -> Self {
        let status = resp.status();
        let body = resp.bytes().await.unwrap_or_default();
        Self::from_status(status, &body)
    }

    /// True when the caller must send the user back to the login screen.
    pub fn is_session_fatal(&self) -> bool {
        matches!(self, Self::SessionExpired | Self::Unauthenticated)
    }

    /// Text for the transient notification shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Unauthenticated => "Authentication required. Please log in again.".into(),
            Self::SessionExpired => "Session expired. Please log in again.".into(),
            Self::Validation { messages } if messages.is_empty() => {
                "The request was rejected. Please check the form and try again.".into()
            }
            Self::Validation { messages } => messages.join("\n"),
            Self::FileTooLarge => "File too large. Please try a smaller file (max 10MB).".into(),
            Self::ServerError { .. } => "Server error. Please try again later.".into(),
            Self::NetworkUnavailable(_) => {
                "No response from server. Please check your connection and try again.".into()
            }
            Self::Timeout => "The server took too long to respond. Please try again.".into(),
            Self::InvalidFileType(_) => {
                "Invalid file type. Please upload an Excel file (.xlsx or .xls)".into()
            }
            Self::Http { message, .. } => message.clone(),
            Self::Decode(_) | Self::Build(_) => "An unknown error occurred. Please try again.".into(),
        }
    }
}
