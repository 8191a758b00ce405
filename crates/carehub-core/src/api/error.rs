use std::fmt;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const MSG_NETWORK: &str =
    "Unable to connect to the server. Please check your internet connection.";
pub const MSG_TIMEOUT: &str = "The request timed out. Please try again.";
pub const MSG_UNAUTHORIZED: &str = "Your session has expired. Please log in again.";
pub const MSG_FORBIDDEN: &str = "You do not have permission to perform this action.";
pub const MSG_NOT_FOUND: &str = "The requested resource was not found.";
pub const MSG_SERVER: &str = "A server error occurred. Please try again later.";
pub const MSG_UNKNOWN: &str = "An unexpected error occurred.";

/// Body fields consulted for a server-supplied message, in precedence order.
const API_MESSAGE_FIELDS: &[&str] = &["message", "error", "errorMessage"];

/// Maximum length for error response bodies kept for diagnostics
const MAX_ERROR_BODY_LENGTH: usize = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub enum ErrorKind {
    NetworkError,
    Timeout,
    Unauthorized,
    Forbidden,
    NotFound,
    ServerError,
    Unknown,
}

impl ErrorKind {
    /// Status-based kind. 401/403/404 and 5xx are distinguished; everything
    /// else is `Unknown`.
    pub fn from_status(status: StatusCode) -> Self {
        match status.as_u16() {
            401 => ErrorKind::Unauthorized,
            403 => ErrorKind::Forbidden,
            404 => ErrorKind::NotFound,
            s if s >= 500 => ErrorKind::ServerError,
            _ => ErrorKind::Unknown,
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            ErrorKind::NetworkError => MSG_NETWORK,
            ErrorKind::Timeout => MSG_TIMEOUT,
            ErrorKind::Unauthorized => MSG_UNAUTHORIZED,
            ErrorKind::Forbidden => MSG_FORBIDDEN,
            ErrorKind::NotFound => MSG_NOT_FOUND,
            ErrorKind::ServerError => MSG_SERVER,
            ErrorKind::Unknown => MSG_UNKNOWN,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A failed exchange, classified once and never retried.
///
/// `friendly_message` always holds something displayable: the API's own
/// message when the body carried one, otherwise the kind's default.
#[derive(Error, Debug)]
#[error("{friendly_message}")]
pub struct ApiError {
    kind: ErrorKind,
    status: Option<StatusCode>,
    api_message: Option<String>,
    friendly_message: String,
    #[source]
    cause: Option<BoxError>,
}

impl ApiError {
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            status: None,
            api_message: None,
            friendly_message: kind.default_message().to_string(),
            cause: None,
        }
    }

    /// Classify a non-success response from its status and raw body.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let mut err = Self::new(ErrorKind::from_status(status));
        err.status = Some(status);
        if let Some(message) = extract_api_message(body) {
            err = err.with_api_message(message);
        }
        if err.api_message.is_none() && !body.trim().is_empty() {
            err.cause = Some(format!("Status {}: {}", status, truncate_body(body)).into());
        }
        err
    }

    pub(crate) fn with_api_message(mut self, message: String) -> Self {
        self.friendly_message = message.clone();
        self.api_message = Some(message);
        self
    }

    pub(crate) fn with_cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status(&self) -> Option<StatusCode> {
        self.status
    }

    pub fn api_message(&self) -> Option<&str> {
        self.api_message.as_deref()
    }

    pub fn friendly_message(&self) -> &str {
        &self.friendly_message
    }

    pub fn is_session_expired(&self) -> bool {
        self.kind == ErrorKind::Unauthorized
    }

    /// Serializable view handed to the UI.
    pub fn payload(&self) -> ErrorPayload {
        ErrorPayload {
            kind: self.kind,
            http_status: self.status.map(|s| s.as_u16()),
            api_message: self.api_message.clone(),
            friendly_message: self.friendly_message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_message: Option<String>,
    pub friendly_message: String,
}

/// First non-empty string among `message`, `error`, `errorMessage`.
pub fn extract_api_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let object = value.as_object()?;
    API_MESSAGE_FIELDS.iter().find_map(|field| {
        object
            .get(*field)
            .and_then(|v| v.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    })
}

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}
