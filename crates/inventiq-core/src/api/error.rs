use std::borrow::Cow;

use serde::Deserialize;
use thiserror::Error;

/// Errors from the backend keep the full response body; only the `Display`
/// form is shortened.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Unauthorized: {}", truncate_body(.0))]
    Unauthorized(String),

    #[error("Access denied: {}", truncate_body(.0))]
    AccessDenied(String),

    #[error("Resource not found: {}", truncate_body(.0))]
    NotFound(String),

    #[error("Conflict: {}", truncate_body(.0))]
    Conflict(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited(String),

    #[error("Server error: {}", truncate_body(.0))]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid response: {}", truncate_body(.0))]
    InvalidResponse(String),

    #[error("Stored credential cannot be sent as a header")]
    InvalidCredential,
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> Cow<'_, str> {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        Cow::Borrowed(body)
    } else {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        Cow::Owned(format!("{}... (truncated, {} total bytes)", &body[..end], body.len()))
    }
}

impl ApiError {
    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let body = body.to_string();
        match status.as_u16() {
            401 => ApiError::Unauthorized(body),
            403 => ApiError::AccessDenied(body),
            404 => ApiError::NotFound(body),
            409 => ApiError::Conflict(body),
            429 => ApiError::RateLimited(body),
            500..=599 => ApiError::ServerError(body),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, body)),
        }
    }

    /// HTTP status behind this error, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::AccessDenied(_) => Some(403),
            ApiError::NotFound(_) => Some(404),
            ApiError::Conflict(_) => Some(409),
            ApiError::RateLimited(_) => Some(429),
            ApiError::NetworkError(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// The backend's own `message` field, when the error body carried one.
    pub fn message(&self) -> Option<String> {
        let body = match self {
            ApiError::Unauthorized(body)
            | ApiError::AccessDenied(body)
            | ApiError::NotFound(body)
            | ApiError::Conflict(body)
            | ApiError::RateLimited(body)
            | ApiError::ServerError(body) => body.as_str(),
            ApiError::InvalidResponse(text) => match text.split_once(": ") {
                Some((prefix, body)) if prefix.starts_with("Status ") => body,
                _ => return None,
            },
            _ => return None,
        };

        serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.message)
            .filter(|m| !m.trim().is_empty())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}
