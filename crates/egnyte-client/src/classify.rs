//! Translation of non-success responses into [`ClientError`] kinds
//!
//! The gateway signals throttling in two ways. Most endpoints answer with a
//! vendor error-code header naming the exhausted allowance (QPS or quota);
//! the audit stream endpoint answers with a bare 429 and its own per-minute
//! and per-hour counters.

use crate::headers::ResponseHeaders;
use crate::ClientError;
use tracing::warn;

/// Vendor error-code header
pub const ERROR_CODE_HEADER: &str = "x-mashery-error-code";
/// Error code sent when the access token exceeds its QPS allowance
pub const OVER_QPS: &str = "ERR_403_DEVELOPER_OVER_QPS";
/// Error code sent when the access token exceeds its quota
pub const OVER_RATE: &str = "ERR_403_DEVELOPER_OVER_RATE";

pub const RETRY_AFTER: &str = "retry-after";
pub const QPS_ALLOTTED: &str = "x-accesstoken-qps-allotted";
pub const QPS_CURRENT: &str = "x-accesstoken-qps-current";
pub const QUOTA_ALLOTTED: &str = "x-accesstoken-quota-allotted";
pub const QUOTA_CURRENT: &str = "x-accesstoken-quota-current";

pub const MINUTE_LIMIT: &str = "x-ratelimit-limit-minute";
pub const MINUTE_REMAINING: &str = "x-ratelimit-remaining-minute";
pub const HOUR_LIMIT: &str = "x-ratelimit-limit-hour";
pub const HOUR_REMAINING: &str = "x-ratelimit-remaining-hour";

/// Classify a non-success response.
///
/// The first matching rule wins: QPS sentinel, quota sentinel, then a
/// generic [`ClientError::Api`] carrying the status, headers and body.
pub fn classify(status: u16, headers: ResponseHeaders, body: &str) -> ClientError {
    let code = headers.get(ERROR_CODE_HEADER).map(str::to_string);
    match code.as_deref() {
        Some(OVER_QPS) => {
            let error = ClientError::QpsLimitExceeded {
                status,
                retry_after: headers.get_or_default(RETRY_AFTER),
                allotted: headers.get_or_default(QPS_ALLOTTED),
                current: headers.get_or_default(QPS_CURRENT),
            };
            warn!(status, "{}", error);
            error
        }
        Some(OVER_RATE) => {
            let error = ClientError::RateLimitExceeded {
                status,
                retry_after: headers.get_or_default(RETRY_AFTER),
                allotted: headers.get_or_default(QUOTA_ALLOTTED),
                current: headers.get_or_default(QUOTA_CURRENT),
            };
            warn!(status, "{}", error);
            error
        }
        _ => ClientError::Api {
            status,
            headers,
            message: body.to_string(),
        },
    }
}

/// Classify a non-success response of the audit stream endpoint.
pub fn classify_audit_stream(status: u16, headers: ResponseHeaders, body: &str) -> ClientError {
    if status != 429 {
        return classify(status, headers, body);
    }

    let error = ClientError::AuditRateLimitExceeded {
        status,
        minute_limit: headers.get_or_default(MINUTE_LIMIT),
        minute_remaining: headers.get_or_default(MINUTE_REMAINING),
        hour_limit: headers.get_or_default(HOUR_LIMIT),
        hour_remaining: headers.get_or_default(HOUR_REMAINING),
        retry_after: headers.get_or_default(RETRY_AFTER),
    };
    warn!(status, "{}", error);
    error
}

/// Which classifier a request's failures go through
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum Classifier {
    #[default]
    Standard,
    AuditStream,
}

impl Classifier {
    pub(crate) fn apply(self, status: u16, headers: ResponseHeaders, body: &str) -> ClientError {
        match self {
            Self::Standard => classify(status, headers, body),
            Self::AuditStream => classify_audit_stream(status, headers, body),
        }
    }
}
