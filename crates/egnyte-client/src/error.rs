//! Client error types

use crate::headers::ResponseHeaders;
use std::time::Duration;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// A required argument was missing or blank
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// A numeric argument was outside its allowed range
    #[error("Parameter `{name}` is out of range: {reason}")]
    OutOfRange { name: &'static str, reason: String },

    /// Success status, but the body or headers could not be used
    #[error("Malformed response: {message}")]
    MalformedResponse {
        message: String,
        body: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Access token exceeded its queries-per-second allowance
    #[error("QPS limit exceeded (allotted: {allotted}, current: {current}, retry after: {retry_after})")]
    QpsLimitExceeded {
        status: u16,
        retry_after: String,
        allotted: String,
        current: String,
    },

    /// Access token exceeded its request quota
    #[error("Rate limit exceeded (allotted: {allotted}, current: {current}, retry after: {retry_after})")]
    RateLimitExceeded {
        status: u16,
        retry_after: String,
        allotted: String,
        current: String,
    },

    /// The audit stream endpoint answered with 429
    #[error(
        "Audit stream rate limit exceeded (minute: {minute_remaining}/{minute_limit}, \
         hour: {hour_remaining}/{hour_limit}, retry after: {retry_after})"
    )]
    AuditRateLimitExceeded {
        status: u16,
        minute_limit: String,
        minute_remaining: String,
        hour_limit: String,
        hour_remaining: String,
        retry_after: String,
    },

    /// Any other non-success response
    #[error("API error ({status}): {message}")]
    Api {
        status: u16,
        headers: ResponseHeaders,
        message: String,
    },

    /// Server checksum of an uploaded chunk differs from the local one
    #[error("Checksum mismatch for chunk {chunk_number}: expected {expected}, server reported {actual}")]
    ChecksumMismatch {
        chunk_number: u32,
        expected: String,
        actual: String,
    },

    /// HTTP transport error, including timeouts
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL could not be built
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request was cancelled before it completed
    #[error("Request cancelled")]
    Cancelled,
}

impl ClientError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    pub(crate) fn out_of_range(name: &'static str, reason: impl Into<String>) -> Self {
        Self::OutOfRange {
            name,
            reason: reason.into(),
        }
    }

    /// Build the error raised when a response lacks headers its contract requires
    pub(crate) fn missing_headers(names: &[&str], headers: &ResponseHeaders, body: &str) -> Self {
        let names = names.join(", ");
        Self::MalformedResponse {
            message: format!(
                "response is missing required header(s) [{}]. Headers: {}. Content: {}",
                names, headers, body
            ),
            body: body.to_string(),
            source: None,
        }
    }

    pub(crate) fn unparsable(body: &str, source: serde_json::Error) -> Self {
        Self::MalformedResponse {
            message: format!("could not parse response body: {}", source),
            body: body.to_string(),
            source: Some(source),
        }
    }

    /// HTTP status of the failed response, if the error came from one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. }
            | Self::QpsLimitExceeded { status, .. }
            | Self::RateLimitExceeded { status, .. }
            | Self::AuditRateLimitExceeded { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Check if this is a throttling error of any scheme
    pub fn is_rate_limited(&self) -> bool {
        matches!(
            self,
            Self::QpsLimitExceeded { .. }
                | Self::RateLimitExceeded { .. }
                | Self::AuditRateLimitExceeded { .. }
        )
    }

    /// Server-suggested wait before retrying, when one was sent
    pub fn retry_after(&self) -> Option<Duration> {
        let raw = match self {
            Self::QpsLimitExceeded { retry_after, .. }
            | Self::RateLimitExceeded { retry_after, .. }
            | Self::AuditRateLimitExceeded { retry_after, .. } => retry_after.as_str(),
            Self::Api { headers, .. } => headers.get("retry-after")?,
            _ => return None,
        };
        raw.trim().parse::<u64>().ok().map(Duration::from_secs)
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { status: 404, .. })
    }

    /// Check if this is a parameter validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. } | Self::OutOfRange { .. })
    }
}

/// Reject a missing or whitespace-only string argument
pub(crate) fn require_non_blank(name: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ClientError::invalid(name, format!("{} must not be empty", name)));
    }
    Ok(())
}
